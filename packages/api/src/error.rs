//! # Error taxonomy shared by every core operation
//!
//! | Variant | Status | Raised when |
//! |---------|--------|-------------|
//! | [`ApiError::Unauthenticated`] | 401 | No session identity, or bad login credentials. |
//! | [`ApiError::NotFound`] | 404 | The row is missing *or* belongs to someone else. Both cases look the same to the caller. |
//! | [`ApiError::Validation`] | 400 | Input breaks a field constraint. Only the first violation is reported. |
//! | [`ApiError::Conflict`] | 400 | A uniqueness rule: tag name, tag association, account email. |
//! | [`ApiError::Internal`] | 500 | Anything else. The detail is logged; the caller gets a generic message. |
//!
//! Storage errors convert into `Internal` through `?`. Operations that expect a
//! unique violation map it to `Conflict` explicitly before that happens.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Turns a unique violation into a [`Conflict`](ApiError::Conflict) with the given message.
    pub(crate) fn conflict_on_unique(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |err| match err {
            StoreError::UniqueViolation(_) => ApiError::Conflict(message.to_string()),
            other => ApiError::from(other),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ApiError::Internal(format!("session: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ApiError::Internal("connection reset by peer".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_conflict_maps_unique_violation_only() {
        let mapped = ApiError::conflict_on_unique("Tag already added")(StoreError::UniqueViolation(
            "document_tags_pkey".into(),
        ));
        assert!(matches!(mapped, ApiError::Conflict(ref m) if m == "Tag already added"));
        assert_eq!(mapped.status(), StatusCode::BAD_REQUEST);
    }
}
