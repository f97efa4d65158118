// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use serde_json::Value;

use crate::{
    error::{ApiError, JsonBody},
    models::StructuredDataResponse,
    sanitize::{validate_and_escape_json_ld, wrap_json_ld_script},
};

/// Validate schema.org JSON-LD and return it escaped for inline embedding.
#[utoipa::path(
    post,
    path = "/v1/structured-data",
    tag = "Structured Data",
    request_body(content = Object, description = "schema.org JSON-LD object"),
    responses(
        (status = 200, description = "Escaped JSON-LD", body = StructuredDataResponse),
        (status = 400, description = "Structured data rejected or malformed body"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn render_structured_data(
    JsonBody(data): JsonBody<Value>,
) -> Result<Json<StructuredDataResponse>, ApiError> {
    let json_ld = validate_and_escape_json_ld(&data)
        .ok_or_else(|| ApiError::bad_request("Structured data rejected"))?;
    let script = wrap_json_ld_script(&json_ld);
    Ok(Json(StructuredDataResponse { json_ld, script }))
}
