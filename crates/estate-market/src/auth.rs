//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued at signup. Handlers take an
//! [`AuthenticatedUser`] (or [`MaybeAuthenticated`] on public pages); the
//! extractor reads the [`TokenAuthority`] installed as a request extension.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::accounts::{Actor, User, UserRole};
use crate::config::AuthConfig;
use crate::error::json_error;
use crate::shared::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: Option<UserRole>,
    pub staff: bool,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_hours)
    }

    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.id,
            role: user.role,
            staff: user.is_staff,
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AuthError::Encoding(err.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Actor, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;
        Ok(Actor {
            user_id: data.claims.sub,
            role: data.claims.role,
            is_staff: data.claims.staff,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication required")]
    MissingToken,
    #[error("authorization header must use the Bearer scheme")]
    MalformedHeader,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token authority not configured")]
    MissingAuthority,
    #[error("unable to issue token: {0}")]
    Encoding(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingAuthority | AuthError::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthError::MissingToken | AuthError::MalformedHeader | AuthError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
        };
        json_error(status, self)
    }
}

fn bearer_actor(parts: &Parts) -> Result<Option<Actor>, AuthError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)?;
    let authority = parts
        .extensions
        .get::<TokenAuthority>()
        .ok_or(AuthError::MissingAuthority)?;
    authority.validate(token).map(Some)
}

/// Caller identity; rejects the request with 401 when absent or invalid.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_actor(parts)?
            .map(AuthenticatedUser)
            .ok_or(AuthError::MissingToken)
    }
}

/// Optional caller identity for public endpoints. A present but invalid token
/// is still rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthenticated(pub Option<Actor>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_actor(parts).map(MaybeAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn user(role: Option<UserRole>) -> User {
        User {
            id: UserId::new(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            role,
            is_staff: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_tokens_round_trip_to_actor() {
        let authority = TokenAuthority::new("secret", 1);
        let agent = user(Some(UserRole::Agent));
        let token = authority.issue(&agent, Utc::now()).expect("token");

        let actor = authority.validate(&token).expect("valid token");
        assert_eq!(actor.user_id, agent.id);
        assert!(actor.is_agent());
        assert!(!actor.is_staff);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let authority = TokenAuthority::new("secret", 1);
        let issued = Utc::now() - Duration::hours(5);
        let token = authority
            .issue(&user(None), issued)
            .expect("token");
        assert!(matches!(
            authority.validate(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = TokenAuthority::new("one", 1)
            .issue(&user(None), Utc::now())
            .expect("token");
        assert!(TokenAuthority::new("two", 1).validate(&token).is_err());
    }

    #[tokio::test]
    async fn extractor_requires_bearer_scheme() {
        let authority = TokenAuthority::new("secret", 1);
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Basic abc")
            .extension(authority)
            .body(())
            .expect("request");
        let (mut parts, _) = request.into_parts();

        let rejection = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .expect_err("basic auth is rejected");
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn optional_extractor_allows_anonymous_callers() {
        let request = Request::builder().body(()).expect("request");
        let (mut parts, _) = request.into_parts();

        let MaybeAuthenticated(actor) = MaybeAuthenticated::from_request_parts(&mut parts, &())
            .await
            .expect("anonymous is fine");
        assert!(actor.is_none());
    }
}
