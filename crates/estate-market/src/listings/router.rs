use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{
    AlertRequest, AmenityDraft, FavoriteToggleRequest, ImageUpload, ListingType, PropertyDraft,
    SearchFilter,
};
use super::service::{ListingError, ListingService};
use crate::auth::{AuthenticatedUser, MaybeAuthenticated};
use crate::error::{field_error_response, json_error};
use crate::shared::{AlertSubscriptionId, FavoriteId, ImageId, PageQuery, PropertyId};

/// Router for listings, search, images, amenities, favorites and alerts.
pub fn listing_router(service: Arc<ListingService>) -> Router {
    Router::new()
        .route("/api/v1/home", get(home_handler))
        .route(
            "/api/v1/properties",
            get(search_handler).post(create_handler),
        )
        .route("/api/v1/properties/rent", get(rent_handler))
        .route("/api/v1/properties/buy", get(buy_handler))
        .route("/api/v1/properties/mine", get(mine_handler))
        .route("/api/v1/properties/type/:kind", get(by_type_handler))
        .route("/api/v1/properties/slug/:slug", get(detail_handler))
        .route(
            "/api/v1/properties/:id",
            put(update_handler).delete(delete_handler),
        )
        .route("/api/v1/properties/:id/images", post(add_image_handler))
        .route(
            "/api/v1/properties/:id/images/:image_id",
            delete(delete_image_handler),
        )
        .route("/api/v1/properties/:id/gallery", get(gallery_handler))
        .route(
            "/api/v1/amenities",
            get(amenities_handler).post(create_amenity_handler),
        )
        .route("/api/v1/favorites", get(favorites_handler))
        .route("/api/v1/favorites/toggle", post(toggle_favorite_handler))
        .route("/api/v1/favorites/count", get(favorite_count_handler))
        .route("/api/v1/favorites/:id", delete(delete_favorite_handler))
        .route(
            "/api/v1/alerts",
            get(alerts_handler).post(subscribe_handler),
        )
        .route(
            "/api/v1/alerts/:id",
            put(update_alert_handler).delete(delete_alert_handler),
        )
        .with_state(service)
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let status = match self {
            ListingError::Validation(field) => return field_error_response(&field),
            ListingError::Repository(err) => return err.response(),
            ListingError::Account(err) => return err.into_response(),
            ListingError::Billing(err) => return err.into_response(),
            ListingError::Forbidden => StatusCode::FORBIDDEN,
            ListingError::NotFound => StatusCode::NOT_FOUND,
        };
        json_error(status, self)
    }
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, ListingError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn home_handler(State(service): State<Arc<ListingService>>) -> Response {
    respond(StatusCode::OK, service.home_feed(Utc::now()))
}

pub(crate) async fn search_handler(
    State(service): State<Arc<ListingService>>,
    Query(filter): Query<SearchFilter>,
) -> Response {
    respond(StatusCode::OK, service.search(&filter, Utc::now()))
}

pub(crate) async fn rent_handler(
    State(service): State<Arc<ListingService>>,
    Query(filter): Query<SearchFilter>,
) -> Response {
    respond(
        StatusCode::OK,
        service.search_listing_type(filter, ListingType::Rent, Utc::now()),
    )
}

pub(crate) async fn buy_handler(
    State(service): State<Arc<ListingService>>,
    Query(filter): Query<SearchFilter>,
) -> Response {
    respond(
        StatusCode::OK,
        service.search_listing_type(filter, ListingType::ForSale, Utc::now()),
    )
}

pub(crate) async fn by_type_handler(
    State(service): State<Arc<ListingService>>,
    Path(kind): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    respond(
        StatusCode::OK,
        service.properties_by_type(&kind, query.page.as_deref(), Utc::now()),
    )
}

pub(crate) async fn detail_handler(
    State(service): State<Arc<ListingService>>,
    MaybeAuthenticated(viewer): MaybeAuthenticated,
    Path(slug): Path<String>,
) -> Response {
    respond(
        StatusCode::OK,
        service.property_detail(&slug, viewer.as_ref(), Utc::now()),
    )
}

pub(crate) async fn create_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(draft): Json<PropertyDraft>,
) -> Response {
    respond(
        StatusCode::CREATED,
        service.create_property(&actor, draft, Utc::now()),
    )
}

pub(crate) async fn mine_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Response {
    respond(
        StatusCode::OK,
        service.agent_properties(&actor, query.page.as_deref(), Utc::now()),
    )
}

pub(crate) async fn update_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<PropertyId>,
    Json(draft): Json<PropertyDraft>,
) -> Response {
    respond(
        StatusCode::OK,
        service.update_property(&actor, id, draft, Utc::now()),
    )
}

pub(crate) async fn delete_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<PropertyId>,
) -> Response {
    match service.delete_property(&actor, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn add_image_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<PropertyId>,
    Json(upload): Json<ImageUpload>,
) -> Response {
    respond(
        StatusCode::CREATED,
        service.add_image(&actor, id, upload, Utc::now()),
    )
}

pub(crate) async fn delete_image_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((id, image_id)): Path<(PropertyId, ImageId)>,
) -> Response {
    match service.delete_image(&actor, id, image_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn gallery_handler(
    State(service): State<Arc<ListingService>>,
    Path(id): Path<PropertyId>,
    Query(query): Query<PageQuery>,
) -> Response {
    respond(StatusCode::OK, service.gallery(id, query.page.as_deref()))
}

pub(crate) async fn amenities_handler(State(service): State<Arc<ListingService>>) -> Response {
    respond(StatusCode::OK, service.list_amenities())
}

pub(crate) async fn create_amenity_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(draft): Json<AmenityDraft>,
) -> Response {
    respond(StatusCode::CREATED, service.create_amenity(&actor, draft))
}

pub(crate) async fn toggle_favorite_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<FavoriteToggleRequest>,
) -> Response {
    match service.toggle_favorite(&actor, request.property_id, Utc::now()) {
        Ok(toggle) => (StatusCode::OK, Json(json!({ "status": toggle }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn favorite_count_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.favorite_count(&actor) {
        Ok(count) => (StatusCode::OK, Json(json!({ "count": count }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn favorites_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    respond(StatusCode::OK, service.favorites(&actor, Utc::now()))
}

pub(crate) async fn delete_favorite_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<FavoriteId>,
) -> Response {
    match service.delete_favorite(&actor, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn alerts_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    respond(StatusCode::OK, service.alerts(&actor))
}

pub(crate) async fn subscribe_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<AlertRequest>,
) -> Response {
    match service.subscribe(&actor, request, Utc::now()) {
        Ok(receipt) => {
            let status = if receipt.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(receipt)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_alert_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<AlertSubscriptionId>,
    Json(request): Json<AlertRequest>,
) -> Response {
    respond(StatusCode::OK, service.update_alert(&actor, id, request))
}

pub(crate) async fn delete_alert_handler(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<AlertSubscriptionId>,
) -> Response {
    match service.delete_alert(&actor, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
