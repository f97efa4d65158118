// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::State,
    http::{
        header::{CACHE_CONTROL, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    csrf::{extract::session_cookie, session_id_from_headers},
    error::ApiError,
    models::CsrfTokenResponse,
    state::AppState,
};

/// Issue a single-use CSRF token for the caller's session.
///
/// A session id is minted and returned as an `HttpOnly` cookie when the
/// request carries none.
#[utoipa::path(
    get,
    path = "/v1/csrf-token",
    tag = "CSRF",
    responses(
        (status = 200, description = "Token issued", body = CsrfTokenResponse),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Secure randomness unavailable")
    )
)]
pub async fn issue_csrf_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let existing = session_id_from_headers(&headers);
    let session_id = existing.unwrap_or_else(Uuid::new_v4);

    let csrf_token = state.csrf.issue(session_id).inspect_err(|err| {
        tracing::error!(reason = err.reason(), error = %err, "Failed to issue CSRF token");
    })?;

    let mut response = Json(CsrfTokenResponse {
        csrf_token,
        expires_in_secs: state.config.csrf_token_ttl.as_secs(),
    })
    .into_response();

    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if existing.is_none() {
        headers.insert(SET_COOKIE, session_cookie(session_id)?);
        tracing::debug!(session = %session_id, "Minted new session");
    }

    Ok(response)
}
