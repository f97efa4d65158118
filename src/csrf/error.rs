// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CSRF errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;

/// Message returned for every rejected submission, whatever the cause.
pub const CSRF_REJECTED_MESSAGE: &str = "Invalid or missing CSRF token";

#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    /// No session id cookie or header, or one that is not a UUID.
    #[error("missing or malformed session id")]
    MissingSession,
    /// No token in the `x-csrf-token` header or `csrf_token` field.
    #[error("missing CSRF token")]
    MissingToken,
    /// Token did not match a live token of the session.
    #[error("CSRF token rejected")]
    InvalidToken,
    /// The system RNG failed while issuing.
    #[error("secure random source unavailable")]
    RandomUnavailable,
    /// HMAC could not be keyed with the configured secret.
    #[error("CSRF signing unavailable")]
    SigningUnavailable,
    /// Token store lock was poisoned.
    #[error("CSRF token store unavailable")]
    StoreUnavailable,
}

#[derive(Serialize)]
struct CsrfErrorBody {
    error: &'static str,
}

impl CsrfError {
    /// Stable machine-readable reason, for logs only.
    pub fn reason(&self) -> &'static str {
        match self {
            CsrfError::MissingSession => "missing_session",
            CsrfError::MissingToken => "missing_token",
            CsrfError::InvalidToken => "invalid_token",
            CsrfError::RandomUnavailable => "rng_unavailable",
            CsrfError::SigningUnavailable => "signing_unavailable",
            CsrfError::StoreUnavailable => "store_unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CsrfError::MissingSession | CsrfError::MissingToken | CsrfError::InvalidToken => {
                StatusCode::FORBIDDEN
            }
            CsrfError::RandomUnavailable
            | CsrfError::SigningUnavailable
            | CsrfError::StoreUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; never reveals which check failed.
    pub fn public_message(&self) -> &'static str {
        if self.status_code() == StatusCode::FORBIDDEN {
            CSRF_REJECTED_MESSAGE
        } else {
            "Internal server error"
        }
    }
}

impl IntoResponse for CsrfError {
    fn into_response(self) -> Response {
        let body = Json(CsrfErrorBody {
            error: self.public_message(),
        });
        (self.status_code(), body).into_response()
    }
}

impl From<CsrfError> for ApiError {
    fn from(err: CsrfError) -> Self {
        ApiError::new(err.status_code(), err.public_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn rejections_share_one_generic_body() {
        for error in [
            CsrfError::MissingSession,
            CsrfError::MissingToken,
            CsrfError::InvalidToken,
        ] {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);

            let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = String::from_utf8(body_bytes.to_vec()).unwrap();
            assert_eq!(body, r#"{"error":"Invalid or missing CSRF token"}"#);
        }
    }

    #[test]
    fn converts_to_api_error() {
        let api: ApiError = CsrfError::InvalidToken.into();
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert_eq!(api.message, CSRF_REJECTED_MESSAGE);
    }

    #[tokio::test]
    async fn rng_failure_is_500() {
        let response = CsrfError::RandomUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
