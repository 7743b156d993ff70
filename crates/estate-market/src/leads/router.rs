use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use super::domain::{
    FavoriteLeadRequest, LeadReceipt, LeadRequest, LeadStatusUpdate, LeadUpdate, ViewingRequest,
    ViewingStatusUpdate,
};
use super::service::{LeadError, LeadService};
use crate::auth::AuthenticatedUser;
use crate::error::{field_error_response, json_error};
use crate::shared::{FavoriteId, LeadId, PageQuery, ViewingId};

/// Router for lead capture, the agent pipeline and viewings.
pub fn lead_router(service: Arc<LeadService>) -> Router {
    Router::new()
        .route("/api/v1/leads", get(list_handler).post(create_handler))
        .route(
            "/api/v1/favorites/:id/lead",
            post(create_from_favorite_handler),
        )
        .route(
            "/api/v1/leads/:id",
            get(detail_handler).patch(update_handler),
        )
        .route("/api/v1/leads/:id/status", post(status_handler))
        .route("/api/v1/leads/:id/viewings", post(schedule_handler))
        .route("/api/v1/viewings", get(viewings_handler))
        .route("/api/v1/viewings/:id/status", post(viewing_status_handler))
        .with_state(service)
}

impl IntoResponse for LeadError {
    fn into_response(self) -> Response {
        let status = match self {
            LeadError::Validation(field) => return field_error_response(&field),
            LeadError::Repository(err) => return err.response(),
            LeadError::Account(err) => return err.into_response(),
            LeadError::Forbidden => StatusCode::FORBIDDEN,
            LeadError::NotFound => StatusCode::NOT_FOUND,
            LeadError::InvalidTransition { .. } | LeadError::InvalidViewingTransition { .. } => {
                StatusCode::CONFLICT
            }
        };
        json_error(status, self)
    }
}

fn receipt_response(result: Result<LeadReceipt, LeadError>) -> Response {
    match result {
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

pub(crate) async fn create_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<LeadRequest>,
) -> Response {
    receipt_response(service.create_lead(&actor, request, Utc::now()))
}

pub(crate) async fn create_from_favorite_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(favorite): Path<FavoriteId>,
    Json(request): Json<FavoriteLeadRequest>,
) -> Response {
    receipt_response(service.create_lead_from_favorite(&actor, favorite, request, Utc::now()))
}

pub(crate) async fn list_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Response {
    match service.list_leads(&actor, query.page.as_deref()) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<LeadId>,
) -> Response {
    match service.lead_detail(&actor, id, Utc::now()) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<LeadId>,
    Json(update): Json<LeadUpdate>,
) -> Response {
    match service.update_lead(&actor, id, update, Utc::now()) {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn status_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<LeadId>,
    Json(update): Json<LeadStatusUpdate>,
) -> Response {
    match service.update_lead_status(&actor, id, update, Utc::now()) {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn schedule_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<LeadId>,
    Json(request): Json<ViewingRequest>,
) -> Response {
    match service.schedule_viewing(&actor, id, request, Utc::now()) {
        Ok(viewing) => (StatusCode::CREATED, Json(viewing)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn viewing_status_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<ViewingId>,
    Json(update): Json<ViewingStatusUpdate>,
) -> Response {
    match service.update_viewing_status(&actor, id, update, Utc::now()) {
        Ok(viewing) => (StatusCode::OK, Json(viewing)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn viewings_handler(
    State(service): State<Arc<LeadService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.viewings_for_user(&actor) {
        Ok(viewings) => (StatusCode::OK, Json(viewings)).into_response(),
        Err(err) => err.into_response(),
    }
}
