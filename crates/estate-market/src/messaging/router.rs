use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{ContactRequest, MessageDraft, PreferencesUpdate, ReplyRequest};
use super::service::{MessagingError, MessagingService};
use crate::auth::AuthenticatedUser;
use crate::error::{field_error_response, json_error};
use crate::shared::{MessageId, NotificationId, PageQuery};

/// Router for direct messages, the notification inbox and the contact form.
pub fn messaging_router(service: Arc<MessagingService>) -> Router {
    Router::new()
        .route("/api/v1/messages", get(inbox_handler).post(send_handler))
        .route(
            "/api/v1/messages/:id",
            get(message_handler).delete(delete_message_handler),
        )
        .route("/api/v1/messages/:id/reply", post(reply_handler))
        .route("/api/v1/notifications", get(notifications_handler))
        .route(
            "/api/v1/notifications/read-all",
            post(mark_all_read_handler),
        )
        .route(
            "/api/v1/notifications/unread-count",
            get(unread_count_handler),
        )
        .route(
            "/api/v1/notifications/preferences",
            get(preferences_handler).put(update_preferences_handler),
        )
        .route(
            "/api/v1/notifications/:id",
            get(notification_handler).delete(delete_notification_handler),
        )
        .route("/api/v1/notifications/:id/read", post(mark_read_handler))
        .route("/api/v1/contact", post(contact_handler))
        .with_state(service)
}

impl IntoResponse for MessagingError {
    fn into_response(self) -> Response {
        let status = match self {
            MessagingError::Validation(field) => return field_error_response(&field),
            MessagingError::Repository(err) => return err.response(),
            MessagingError::NotFound => StatusCode::NOT_FOUND,
            MessagingError::Forbidden => StatusCode::FORBIDDEN,
        };
        json_error(status, self)
    }
}

pub(crate) async fn inbox_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.inbox(actor.user_id) {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn send_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(draft): Json<MessageDraft>,
) -> Response {
    match service.send_message(actor.user_id, draft, Utc::now()) {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn message_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<MessageId>,
) -> Response {
    match service.message_detail(actor.user_id, id) {
        Ok(thread) => (StatusCode::OK, Json(thread)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn reply_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<MessageId>,
    Json(request): Json<ReplyRequest>,
) -> Response {
    match service.reply(actor.user_id, id, &request.body, Utc::now()) {
        Ok(reply) => (StatusCode::CREATED, Json(reply)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_message_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<MessageId>,
) -> Response {
    match service.delete_message(actor.user_id, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn notifications_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Response {
    match service.notifications(actor.user_id, query.page.as_deref()) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn notification_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<NotificationId>,
) -> Response {
    match service.notification_detail(actor.user_id, id) {
        Ok(notification) => (StatusCode::OK, Json(notification)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn mark_read_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<NotificationId>,
) -> Response {
    match service.mark_read(actor.user_id, id) {
        Ok(notification) => (StatusCode::OK, Json(notification)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn mark_all_read_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.mark_all_read(actor.user_id) {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_notification_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<NotificationId>,
) -> Response {
    match service.delete_notification(actor.user_id, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn unread_count_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.unread_count(actor.user_id) {
        Ok(count) => (StatusCode::OK, Json(json!({ "count": count }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn preferences_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.preferences(actor.user_id) {
        Ok(preferences) => (StatusCode::OK, Json(preferences)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_preferences_handler(
    State(service): State<Arc<MessagingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(update): Json<PreferencesUpdate>,
) -> Response {
    match service.update_preferences(actor.user_id, &update) {
        Ok(preferences) => (StatusCode::OK, Json(preferences)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn contact_handler(
    State(service): State<Arc<MessagingService>>,
    Json(request): Json<ContactRequest>,
) -> Response {
    match service.contact(&request) {
        Ok(sent) => (StatusCode::OK, Json(json!({ "sent": sent }))).into_response(),
        Err(err) => err.into_response(),
    }
}
