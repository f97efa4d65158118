// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use utoipa::ToSchema;

use crate::{
    csrf::{extract::CSRF_FORM_FIELD, header_token, verify_submission, CsrfSession},
    error::ApiError,
    state::AppState,
    upload::{validate_image_file, FileValidationResult, UploadError, MAX_FILE_SIZE},
};

/// Multipart field holding the image.
pub const FILE_FIELD: &str = "file";

/// Request body limit for the upload route: the file plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE + 64 * 1024;

/// Multipart form accepted by [`upload_image`]. Documentation only.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadImageForm {
    /// JPEG, PNG, GIF or WebP, at most 10 MB.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// CSRF token, when not sent as the `x-csrf-token` header.
    csrf_token: Option<String>,
}

#[derive(Default)]
struct UploadForm {
    csrf_token: Option<String>,
    file: Option<(String, Bytes)>,
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), err.body_text())
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) if form.file.is_none() => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.file = Some((content_type, bytes));
            }
            Some(CSRF_FORM_FIELD) if form.csrf_token.is_none() => {
                form.csrf_token = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Validate an uploaded image without storing it.
///
/// The declared content type of the `file` part must match the file's
/// signature, and its header must decode to sane dimensions.
#[utoipa::path(
    post,
    path = "/v1/uploads/image",
    tag = "Uploads",
    request_body(content = inline(UploadImageForm), content_type = "multipart/form-data"),
    params(
        ("x-csrf-token" = Option<String>, Header, description = "CSRF token")
    ),
    responses(
        (status = 200, description = "Image accepted", body = FileValidationResult),
        (status = 400, description = "Image rejected", body = FileValidationResult),
        (status = 403, description = "Invalid or missing CSRF token"),
        (status = 408, description = "Upload not received in time"),
        (status = 413, description = "Request body too large"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    CsrfSession(session_id): CsrfSession,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileValidationResult>), ApiError> {
    let timeout = state.config.upload_read_timeout;
    let form = tokio::time::timeout(timeout, read_upload(multipart))
        .await
        .map_err(|_| {
            tracing::warn!(session = %session_id, timeout_secs = timeout.as_secs(), "Upload read timed out");
            ApiError::request_timeout("Upload timed out")
        })??;

    verify_submission(
        &state.csrf,
        session_id,
        header_token(&headers),
        form.csrf_token.as_deref(),
    )?;

    let outcome = match &form.file {
        Some((content_type, bytes)) => validate_image_file(bytes, content_type),
        None => Err(UploadError::MissingField(FILE_FIELD)),
    };

    match &outcome {
        Ok(image) => {
            tracing::info!(
                mime_type = image.mime_type(),
                width = image.dimensions.width,
                height = image.dimensions.height,
                "Image upload accepted"
            );
        }
        Err(err) if err.is_content_rejection() => {
            tracing::warn!(session = %session_id, reason = %err, "Suspicious image upload rejected");
        }
        Err(err) => {
            tracing::info!(reason = %err, "Image upload rejected");
        }
    }

    let status = if outcome.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(FileValidationResult::from(&outcome))))
}
