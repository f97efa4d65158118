// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # HTTP Surface
//!
//! ```text
//! request
//!   └─ x-request-id (set if absent) ─ trace ─ security headers
//!        ├─ GET  /health                      (no limit)
//!        └─ /v1
//!             ├─ GET  /csrf-token             rate limit: form
//!             ├─ POST /profile/validate       rate limit: form   + CSRF
//!             ├─ POST /uploads/image          rate limit: upload + CSRF, 10 MB body
//!             └─ POST /structured-data        rate limit: api
//! ```
//!
//! Rate limits are route layers, so unmatched paths do not consume budget.

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS},
        HeaderName, HeaderValue,
    },
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{CsrfTokenResponse, ProfileRequest, ProfileResponse, StructuredDataResponse},
    rate_limit::{rate_limit_middleware, RateLimitClass, RateLimitLayerState},
    state::AppState,
    upload::{Dimensions, FileValidationResult},
};

pub mod csrf;
pub mod health;
pub mod profile;
pub mod structured_data;
pub mod uploads;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub fn router(state: AppState) -> Router {
    let limit = |class| {
        from_fn_with_state(
            RateLimitLayerState::new(state.rate_limiter.clone(), class, &state.config),
            rate_limit_middleware,
        )
    };

    let form_routes = Router::new()
        .route("/csrf-token", get(csrf::issue_csrf_token))
        .route("/profile/validate", post(profile::validate_profile))
        .route_layer(limit(RateLimitClass::Form));

    let upload_routes = Router::new()
        .route("/uploads/image", post(uploads::upload_image))
        .layer(DefaultBodyLimit::max(uploads::UPLOAD_BODY_LIMIT))
        .route_layer(limit(RateLimitClass::Upload));

    let api_routes = Router::new()
        .route("/structured-data", post(structured_data::render_structured_data))
        .route_layer(limit(RateLimitClass::Api));

    let v1_routes = Router::new()
        .merge(form_routes)
        .merge(upload_routes)
        .merge(api_routes)
        .with_state(state);

    Router::new()
        .route("/health", get(health::liveness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
                .layer(SetResponseHeaderLayer::overriding(
                    X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    REFERRER_POLICY,
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        csrf::issue_csrf_token,
        profile::validate_profile,
        uploads::upload_image,
        structured_data::render_structured_data
    ),
    components(
        schemas(
            health::HealthResponse,
            CsrfTokenResponse,
            ProfileRequest,
            ProfileResponse,
            StructuredDataResponse,
            FileValidationResult,
            Dimensions
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "CSRF", description = "CSRF token issuance"),
        (name = "Profile", description = "Creator profile sanitization"),
        (name = "Uploads", description = "Image upload validation"),
        (name = "Structured Data", description = "JSON-LD validation and escaping")
    )
)]
struct ApiDoc;
