// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pulling session ids and submitted tokens out of requests.
//!
//! ```rust,ignore
//! async fn submit(CsrfSession(session): CsrfSession, headers: HeaderMap) -> impl IntoResponse {
//!     // session is the caller's session UUID
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap, HeaderValue},
};
use uuid::Uuid;

use super::CsrfError;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session_id";

/// Session header, for clients that cannot carry cookies.
pub const SESSION_HEADER: &str = "x-session-id";

/// Header carrying the submitted token.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Form field carrying the submitted token.
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Session id from the `session_id` cookie, else the `x-session-id` header.
/// Values that do not parse as a UUID are ignored.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    cookie_value(headers, SESSION_COOKIE)
        .and_then(|v| Uuid::parse_str(v).ok())
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| Uuid::parse_str(v.trim()).ok())
        })
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// Token from the `x-csrf-token` header, if present and non-empty.
pub fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The token to validate: header first, then the form field.
pub fn submitted_token<'a>(header: Option<&'a str>, field: Option<&'a str>) -> Option<&'a str> {
    header
        .or(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value for a freshly minted session id.
pub fn session_cookie(session_id: Uuid) -> Result<HeaderValue, CsrfError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={session_id}; HttpOnly; SameSite=Strict; Path=/"
    ))
    .map_err(|_| CsrfError::MissingSession)
}

/// Extractor requiring a well-formed session id.
#[derive(Debug, Clone, Copy)]
pub struct CsrfSession(pub Uuid);

impl<S> FromRequestParts<S> for CsrfSession
where
    S: Send + Sync,
{
    type Rejection = CsrfError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_id_from_headers(&parts.headers) {
            Some(id) => Ok(CsrfSession(id)),
            None => {
                tracing::warn!(reason = "missing_session", "CSRF check failed");
                Err(CsrfError::MissingSession)
            }
        }
    }
}
