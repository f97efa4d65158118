// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Rate Limiting
//!
//! Fixed-window request counting per (client, route class).
//!
//! ## Flow
//!
//! ```text
//! request → client_identifier()  (peer IP, or forwarding headers when trusted)
//!         → RateLimitClass::key() ("upload:203.0.113.7")
//!         → RateLimiter::check()  → RateLimitStore::hit() (atomic create-or-increment)
//!         → RateLimitDecision { allowed, remaining, reset_at }
//! ```
//!
//! The limiter never fails: a key with no stored state is a first request.
//! Counters live behind the [`RateLimitStore`] trait; the default
//! [`InMemoryRateLimitStore`] is per-process, so every instance of a
//! horizontally scaled deployment enforces its own budget.

pub mod memory;
pub mod middleware;
pub mod store;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub use memory::InMemoryRateLimitStore;
pub use middleware::{rate_limit_middleware, RateLimitLayerState};
pub use store::{RateLimitEntry, RateLimitStore};

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the current window closes.
    pub reset_at: DateTime<Utc>,
}

/// Route classes with their own request budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitClass {
    /// Sign-in, magic-link and password flows.
    Auth,
    /// File uploads.
    Upload,
    /// Form submissions and token issuance.
    Form,
    /// General API calls.
    Api,
}

/// Request budget for one route class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitClass::Auth => "auth",
            RateLimitClass::Upload => "upload",
            RateLimitClass::Form => "form",
            RateLimitClass::Api => "api",
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        match self {
            RateLimitClass::Auth => RateLimitPolicy {
                max_requests: 5,
                window: Duration::from_secs(15 * 60),
            },
            RateLimitClass::Upload => RateLimitPolicy {
                max_requests: 10,
                window: Duration::from_secs(60),
            },
            RateLimitClass::Form => RateLimitPolicy {
                max_requests: 20,
                window: Duration::from_secs(60),
            },
            RateLimitClass::Api => RateLimitPolicy {
                max_requests: 100,
                window: Duration::from_secs(60),
            },
        }
    }

    /// Store key for `identifier` under this class.
    pub fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.as_str(), identifier)
    }
}

impl std::fmt::Display for RateLimitClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate limiter over an injected counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Limiter backed by a fresh [`InMemoryRateLimitStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()))
    }

    /// Count one request for `identifier` against `max_requests` per `window`.
    pub fn check(&self, identifier: &str, max_requests: u32, window: Duration) -> RateLimitDecision {
        self.check_at(identifier, max_requests, window, Utc::now())
    }

    /// [`RateLimiter::check`] evaluated at an explicit instant.
    ///
    /// `max_requests == 0` behaves as 1. A zero window closes immediately, so
    /// every call starts a new window.
    pub fn check_at(
        &self,
        identifier: &str,
        max_requests: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let max_requests = max_requests.max(1);
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        let entry = self.store.hit(identifier, window, now);

        if entry.count > max_requests {
            RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: entry.window_expires_at,
            }
        } else {
            RateLimitDecision {
                allowed: true,
                remaining: max_requests - entry.count,
                reset_at: entry.window_expires_at,
            }
        }
    }

    /// Check `identifier` against the policy of `class`.
    pub fn check_class(&self, class: RateLimitClass, identifier: &str) -> RateLimitDecision {
        self.check_class_at(class, identifier, Utc::now())
    }

    pub fn check_class_at(
        &self,
        class: RateLimitClass,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let policy = class.policy();
        self.check_at(&class.key(identifier), policy.max_requests, policy.window, now)
    }

    /// Clear the counter for `identifier` (e.g. after a successful sign-in).
    pub fn reset(&self, identifier: &str) {
        self.store.reset(identifier);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Identifier used when no client address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the rate-limit identifier for a request.
///
/// With `trust_proxy_headers`, the first `X-Forwarded-For` hop wins, then
/// `X-Real-IP`, then `CF-Connecting-IP`. Header values that do not parse as
/// an IP address are ignored. Otherwise the socket peer address is used.
pub fn client_identifier(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(parse_ip);
        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_ip)
        };
        let cf_ip = || {
            headers
                .get("cf-connecting-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_ip)
        };

        if let Some(ip) = forwarded.or_else(real_ip).or_else(cf_ip) {
            return ip.to_string();
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn five_per_minute_end_to_end() {
        let limiter = RateLimiter::new(Arc::new(InMemoryRateLimitStore::starting_at(t0())));
        let window = Duration::from_millis(60_000);

        let remaining: Vec<u32> = (0..5)
            .map(|i| {
                let decision = limiter.check_at("1.2.3.4", 5, window, t0() + TimeDelta::seconds(i));
                assert!(decision.allowed, "call {} should be allowed", i + 1);
                decision.remaining
            })
            .collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);

        let sixth = limiter.check_at("1.2.3.4", 5, window, t0() + TimeDelta::seconds(30));
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
        assert_eq!(sixth.reset_at, t0() + TimeDelta::seconds(60));
    }

    #[test]
    fn nth_allowed_and_next_rejected_for_various_limits() {
        for max in [1u32, 2, 7, 50] {
            let limiter = RateLimiter::new(Arc::new(InMemoryRateLimitStore::starting_at(t0())));
            let window = Duration::from_secs(10);
            for _ in 1..max {
                assert!(limiter.check_at("client", max, window, t0()).allowed);
            }
            assert!(limiter.check_at("client", max, window, t0()).allowed, "call {max} allowed");
            assert!(!limiter.check_at("client", max, window, t0()).allowed, "call {} rejected", max + 1);
        }
    }

    #[test]
    fn window_expiry_resets_count() {
        let limiter = RateLimiter::new(Arc::new(InMemoryRateLimitStore::starting_at(t0())));
        let window = Duration::from_secs(60);
        for _ in 0..3 {
            limiter.check_at("ip", 2, window, t0());
        }
        assert!(!limiter.check_at("ip", 2, window, t0()).allowed);

        let after = limiter.check_at("ip", 2, window, t0() + TimeDelta::seconds(60));
        assert!(after.allowed);
        assert_eq!(after.remaining, 1);
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = RateLimiter::new(Arc::new(InMemoryRateLimitStore::starting_at(t0())));
        let window = Duration::from_secs(60);
        assert!(limiter.check_at("a", 1, window, t0()).allowed);
        assert!(!limiter.check_at("a", 1, window, t0()).allowed);
        assert!(limiter.check_at("b", 1, window, t0()).allowed);
    }

    #[test]
    fn zero_max_behaves_as_one() {
        let limiter = RateLimiter::in_memory();
        let first = limiter.check_at("z", 0, Duration::from_secs(60), t0());
        assert!(first.allowed);
        assert_eq!(first.remaining, 0);
        assert!(!limiter.check_at("z", 0, Duration::from_secs(60), t0()).allowed);
    }

    #[test]
    fn route_classes_do_not_share_counters() {
        let limiter = RateLimiter::new(Arc::new(InMemoryRateLimitStore::starting_at(t0())));
        for _ in 0..5 {
            assert!(limiter.check_class_at(RateLimitClass::Auth, "ip", t0()).allowed);
        }
        assert!(!limiter.check_class_at(RateLimitClass::Auth, "ip", t0()).allowed);
        assert!(limiter.check_class_at(RateLimitClass::Form, "ip", t0()).allowed);
    }

    #[test]
    fn reset_clears_budget() {
        let limiter = RateLimiter::new(Arc::new(InMemoryRateLimitStore::starting_at(t0())));
        let window = Duration::from_secs(60);
        limiter.check_at("k", 1, window, t0());
        assert!(!limiter.check_at("k", 1, window, t0()).allowed);
        limiter.reset("k");
        assert!(limiter.check_at("k", 1, window, t0()).allowed);
    }

    #[test]
    fn class_keys_are_prefixed() {
        assert_eq!(RateLimitClass::Upload.key("10.0.0.1"), "upload:10.0.0.1");
        assert_eq!(RateLimitClass::Auth.policy().max_requests, 5);
        assert_eq!(RateLimitClass::Auth.policy().window, Duration::from_secs(900));
    }

    #[test]
    fn client_identifier_ignores_headers_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        let peer: IpAddr = "10.0.0.1".parse().unwrap();

        assert_eq!(client_identifier(&headers, Some(peer), false), "10.0.0.1");
        assert_eq!(client_identifier(&headers, Some(peer), true), "203.0.113.9");
    }

    #[test]
    fn client_identifier_falls_through_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.4"));

        assert_eq!(client_identifier(&headers, None, true), "198.51.100.4");
        assert_eq!(client_identifier(&HeaderMap::new(), None, true), UNKNOWN_CLIENT);
    }
}
