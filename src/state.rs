// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::GuardConfig;
use crate::csrf::CsrfTokenStore;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GuardConfig>,
    pub rate_limiter: RateLimiter,
    pub csrf: Arc<CsrfTokenStore>,
}

impl AppState {
    /// Build state with the in-memory rate-limit store.
    pub fn new(config: GuardConfig) -> Self {
        Self::with_rate_limiter(config, RateLimiter::in_memory())
    }

    /// Build state around a caller-supplied limiter (e.g. a shared store).
    pub fn with_rate_limiter(config: GuardConfig, rate_limiter: RateLimiter) -> Self {
        let csrf = CsrfTokenStore::new(config.csrf_secret.clone(), config.csrf_token_ttl);
        Self {
            config: Arc::new(config),
            rate_limiter,
            csrf: Arc::new(csrf),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}
