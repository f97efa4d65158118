// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    csrf::{header_token, verify_submission, CsrfSession},
    error::{ApiError, JsonBody},
    models::{ProfileRequest, ProfileResponse, MAX_BIO_LEN},
    sanitize::{sanitize_email, sanitize_name, sanitize_text, sanitize_url, sanitize_username},
    state::AppState,
};

/// Sanitize a creator profile submission.
///
/// Returns the cleaned fields the storefront should persist, or 400 naming
/// the first invalid field.
#[utoipa::path(
    post,
    path = "/v1/profile/validate",
    tag = "Profile",
    request_body = ProfileRequest,
    params(
        ("x-csrf-token" = Option<String>, Header, description = "CSRF token")
    ),
    responses(
        (status = 200, description = "Sanitized profile", body = ProfileResponse),
        (status = 400, description = "Invalid field or malformed body"),
        (status = 403, description = "Invalid or missing CSRF token"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn validate_profile(
    State(state): State<AppState>,
    CsrfSession(session_id): CsrfSession,
    headers: HeaderMap,
    JsonBody(request): JsonBody<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    verify_submission(
        &state.csrf,
        session_id,
        header_token(&headers),
        request.csrf_token.as_deref(),
    )?;

    let website = request
        .website
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(sanitize_url)
        .transpose()?;
    let bio = request
        .bio
        .as_deref()
        .map(|b| sanitize_text(b, MAX_BIO_LEN))
        .filter(|b| !b.is_empty());

    Ok(Json(ProfileResponse {
        display_name: sanitize_name(&request.display_name)?,
        username: sanitize_username(&request.username)?,
        email: sanitize_email(&request.email)?,
        website,
        bio,
    }))
}
