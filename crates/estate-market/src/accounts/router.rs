use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{
    AgentContactRequest, AgentProfileUpdate, NameUpdate, SignupRequest, UserProfileUpdate,
    VerificationRequest,
};
use super::service::{AccountError, AccountService};
use crate::auth::AuthenticatedUser;
use crate::error::{field_error_response, json_error};
use crate::shared::{PageQuery, UserId};

/// Router for signup, profiles, the agent directory and dashboards.
pub fn account_router(service: Arc<AccountService>) -> Router {
    Router::new()
        .route("/api/v1/auth/signup", post(signup_handler))
        .route("/api/v1/users/me", get(me_handler).patch(rename_handler))
        .route("/api/v1/users/me/profile", put(user_profile_handler))
        .route("/api/v1/users/me/agent-profile", put(agent_profile_handler))
        .route("/api/v1/agents", get(agents_handler))
        .route("/api/v1/agents/:id", get(agent_detail_handler))
        .route("/api/v1/agents/:id/verification", post(verification_handler))
        .route("/api/v1/agents/:id/contact", post(contact_agent_handler))
        .route("/api/v1/dashboard/agent", get(agent_dashboard_handler))
        .route("/api/v1/dashboard/customer", get(customer_dashboard_handler))
        .with_state(service)
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = match self {
            AccountError::Validation(field) => return field_error_response(&field),
            AccountError::Repository(err) => return err.response(),
            AccountError::Auth(err) => return err.into_response(),
            AccountError::Billing(err) => return err.into_response(),
            AccountError::Forbidden | AccountError::AgentNotApproved => StatusCode::FORBIDDEN,
            AccountError::NotFound => StatusCode::NOT_FOUND,
        };
        json_error(status, self)
    }
}

pub(crate) async fn signup_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<SignupRequest>,
) -> Response {
    match service.signup(request, Utc::now()) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn me_handler(
    State(service): State<Arc<AccountService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.get_user(&actor) {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn rename_handler(
    State(service): State<Arc<AccountService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(update): Json<NameUpdate>,
) -> Response {
    match service.update_name(&actor, &update.name) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn user_profile_handler(
    State(service): State<Arc<AccountService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(update): Json<UserProfileUpdate>,
) -> Response {
    match service.update_user_profile(&actor, update) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn agent_profile_handler(
    State(service): State<Arc<AccountService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(update): Json<AgentProfileUpdate>,
) -> Response {
    match service.update_agent_profile(&actor, update) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn agents_handler(
    State(service): State<Arc<AccountService>>,
    Query(query): Query<PageQuery>,
) -> Response {
    match service.list_verified_agents(query.page.as_deref()) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn agent_detail_handler(
    State(service): State<Arc<AccountService>>,
    Path(agent): Path<UserId>,
    Query(query): Query<PageQuery>,
) -> Response {
    match service.agent_detail(agent, query.page.as_deref(), Utc::now()) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn verification_handler(
    State(service): State<Arc<AccountService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(agent): Path<UserId>,
    Json(request): Json<VerificationRequest>,
) -> Response {
    match service.verify_agent(&actor, agent, request.verified) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn contact_agent_handler(
    State(service): State<Arc<AccountService>>,
    Path(agent): Path<UserId>,
    Json(request): Json<AgentContactRequest>,
) -> Response {
    match service.contact_agent(agent, &request) {
        Ok(sent) => (StatusCode::OK, Json(json!({ "sent": sent }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn agent_dashboard_handler(
    State(service): State<Arc<AccountService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.agent_dashboard(&actor, Utc::now()) {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn customer_dashboard_handler(
    State(service): State<Arc<AccountService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.customer_dashboard(&actor) {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => err.into_response(),
    }
}
