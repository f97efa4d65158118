// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum middleware enforcing a [`RateLimitClass`] budget per client.
//!
//! ```rust,ignore
//! let upload_limit = RateLimitLayerState::new(limiter, RateLimitClass::Upload, &config);
//! Router::new()
//!     .route("/uploads/image", post(upload_image))
//!     .layer(axum::middleware::from_fn_with_state(upload_limit, rate_limit_middleware));
//! ```

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{client_identifier, RateLimitClass, RateLimitDecision, RateLimiter};
use crate::config::GuardConfig;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Per-route middleware state.
#[derive(Clone)]
pub struct RateLimitLayerState {
    pub limiter: RateLimiter,
    pub class: RateLimitClass,
    pub enabled: bool,
    pub trust_proxy_headers: bool,
}

impl RateLimitLayerState {
    pub fn new(limiter: RateLimiter, class: RateLimitClass, config: &GuardConfig) -> Self {
        Self {
            limiter,
            class,
            enabled: config.rate_limit_enabled,
            trust_proxy_headers: config.trust_proxy_headers,
        }
    }
}

/// 429 response carrying the window reset time.
#[derive(Debug)]
pub struct RateLimitExceeded {
    pub reset_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct RateLimitBody {
    error: &'static str,
    reset_at: DateTime<Utc>,
}

impl RateLimitExceeded {
    /// Whole seconds until the window closes, at least 1.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> i64 {
        let millis = self.reset_at.signed_duration_since(now).num_milliseconds();
        ((millis + 999) / 1000).max(1)
    }
}

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        let retry_after = self.retry_after_secs(Utc::now());
        let body = Json(RateLimitBody {
            error: "Too many requests. Please try again later.",
            reset_at: self.reset_at,
        });
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        response
            .headers_mut()
            .insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
        response
    }
}

/// Middleware function for per-class rate limiting.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitLayerState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.enabled {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let client = client_identifier(request.headers(), peer, state.trust_proxy_headers);
    let decision = state.limiter.check_class(state.class, &client);

    if !decision.allowed {
        tracing::warn!(
            client = %client,
            class = %state.class,
            reset_at = %decision.reset_at,
            "Rate limit exceeded"
        );
        return RateLimitExceeded {
            reset_at: decision.reset_at,
        }
        .into_response();
    }

    let mut response = next.run(request).await;
    apply_headers(&mut response, state.class, &decision);
    response
}

fn apply_headers(response: &mut Response, class: RateLimitClass, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(class.policy().max_requests));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at.timestamp()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, body::to_bytes, http::Request as HttpRequest, routing::get, Router};
    use chrono::TimeDelta;
    use tower::ServiceExt;

    fn app(enabled: bool) -> Router {
        let state = RateLimitLayerState {
            limiter: RateLimiter::in_memory(),
            class: RateLimitClass::Auth,
            enabled,
            trust_proxy_headers: true,
        };
        Router::new()
            .route("/login", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(state, rate_limit_middleware))
    }

    fn login_request(ip: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/login")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn allows_within_budget_and_sets_headers() {
        let app = app(true);
        let response = app.oneshot(login_request("203.0.113.1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "4");
    }

    #[tokio::test]
    async fn rejects_over_budget_with_retry_after() {
        let app = app(true);
        for _ in 0..5 {
            let response = app.clone().oneshot(login_request("203.0.113.2")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(login_request("203.0.113.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(body["reset_at"].is_string());

        // A different client still has its own budget.
        let response = app.oneshot(login_request("203.0.113.3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn disabled_limiter_passes_everything() {
        let app = app(false);
        for _ in 0..10 {
            let response = app.clone().oneshot(login_request("203.0.113.4")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(!response.headers().contains_key("x-ratelimit-remaining"));
        }
    }

    #[test]
    fn retry_after_rounds_up() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let exceeded = RateLimitExceeded {
            reset_at: now + TimeDelta::milliseconds(1500),
        };
        assert_eq!(exceeded.retry_after_secs(now), 2);

        let past = RateLimitExceeded {
            reset_at: now - TimeDelta::seconds(5),
        };
        assert_eq!(past.retry_after_secs(now), 1);
    }
}
