//! Persistence seams shared by every marketplace area.
//!
//! Each area declares its own repository trait next to its domain types; the
//! in-memory store implements all of them over one set of tables so that
//! uniqueness checks and cascading deletes stay atomic.

mod memory;

pub use memory::{MemoryMailer, MemoryStore};

use axum::http::StatusCode;
use axum::response::Response;

use crate::error::json_error;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub(crate) fn response(&self) -> Response {
        let status = match self {
            RepositoryError::Conflict(_) => StatusCode::CONFLICT,
            RepositoryError::NotFound => StatusCode::NOT_FOUND,
            RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        json_error(status, self)
    }
}
