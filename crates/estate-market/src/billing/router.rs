use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{SubscriptionPlan, VerifyQuery};
use super::gateway::SIGNATURE_HEADER;
use super::service::{BillingError, BillingService, WebhookError, WebhookOutcome};
use crate::auth::AuthenticatedUser;
use crate::error::{field_error_response, json_error};
use crate::shared::{PropertyId, SubscriptionId};

/// Router exposing plans, checkout, the payment webhook and featured boosts.
pub fn billing_router(service: Arc<BillingService>) -> Router {
    Router::new()
        .route("/api/v1/subscriptions/plans", get(plans_handler))
        .route("/api/v1/subscriptions/start", get(start_handler))
        .route("/api/v1/subscriptions/initiate/:plan", post(initiate_handler))
        .route("/api/v1/subscriptions/verify", get(verify_handler))
        .route("/api/v1/subscriptions/webhook/paystack", post(webhook_handler))
        .route("/api/v1/subscriptions/:id", get(subscription_handler))
        .route("/api/v1/properties/:id/feature", post(feature_handler))
        .route("/api/v1/properties/:id/unfeature", post(unfeature_handler))
        .with_state(service)
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BillingError::Validation(field) => return field_error_response(field),
            BillingError::Repository(err) => return err.response(),
            BillingError::Forbidden => StatusCode::FORBIDDEN,
            BillingError::NotFound | BillingError::UnknownReference => StatusCode::NOT_FOUND,
            BillingError::UnknownPlan(_) | BillingError::AmountMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            BillingError::LimitReached { .. } | BillingError::PaymentNotSuccessful(_) => {
                StatusCode::PAYMENT_REQUIRED
            }
            BillingError::Gateway(_) => StatusCode::BAD_GATEWAY,
        };
        json_error(status, self)
    }
}

pub(crate) async fn plans_handler(State(service): State<Arc<BillingService>>) -> Response {
    match service.plans() {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn start_handler(
    State(service): State<Arc<BillingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Response {
    match service.start(&actor, Utc::now()) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn initiate_handler(
    State(service): State<Arc<BillingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(plan): Path<String>,
) -> Response {
    let Some(plan) = SubscriptionPlan::parse(&plan) else {
        return BillingError::UnknownPlan(plan).into_response();
    };
    match service.initiate_payment(&actor, plan, Utc::now()).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn verify_handler(
    State(service): State<Arc<BillingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<VerifyQuery>,
) -> Response {
    match service
        .verify_payment(&actor, query.reference.as_deref(), Utc::now())
        .await
    {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn webhook_handler(
    State(service): State<Arc<BillingService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    match service.process_webhook(&body, signature, Utc::now()) {
        Ok(WebhookOutcome::Processed { reference }) => (
            StatusCode::OK,
            Json(json!({ "status": "processed", "reference": reference })),
        )
            .into_response(),
        Ok(WebhookOutcome::Ignored) => {
            (StatusCode::OK, Json(json!({ "status": "ignored" }))).into_response()
        }
        Err(
            err @ (WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::InvalidPayload(_)),
        ) => json_error(StatusCode::FORBIDDEN, err),
        Err(err @ WebhookError::Processing(_)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, err)
        }
    }
}

pub(crate) async fn subscription_handler(
    State(service): State<Arc<BillingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<SubscriptionId>,
) -> Response {
    match service.subscription_detail(&actor, id) {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn feature_handler(
    State(service): State<Arc<BillingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(property): Path<PropertyId>,
) -> Response {
    match service.feature_property(&actor, property, Utc::now()) {
        Ok(boost) => (StatusCode::CREATED, Json(boost)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn unfeature_handler(
    State(service): State<Arc<BillingService>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(property): Path<PropertyId>,
) -> Response {
    match service.unfeature_property(&actor, property) {
        Ok(updated) => (
            StatusCode::OK,
            Json(json!({ "unfeatured": updated > 0, "updated": updated })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
