// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage seam for rate-limit counters.

use chrono::{DateTime, TimeDelta, Utc};

/// Counter state for one (identifier, route-class) key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub key: String,
    pub count: u32,
    pub window_expires_at: DateTime<Utc>,
}

impl RateLimitEntry {
    /// Start a fresh window at `now` with a count of one.
    pub fn fresh(key: impl Into<String>, window: TimeDelta, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            count: 1,
            window_expires_at: window_end(now, window),
        }
    }

    /// Whether the window has closed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.window_expires_at
    }
}

/// Backing store for rate-limit counters.
///
/// `hit` must be atomic per key: create-or-reset the entry when absent or
/// expired, otherwise increment it, and return the resulting state. A shared
/// store (for multi-instance deployments) implements this with its own atomic
/// increment primitive.
pub trait RateLimitStore: Send + Sync {
    /// Record one request for `key` and return the entry after the update.
    fn hit(&self, key: &str, window: TimeDelta, now: DateTime<Utc>) -> RateLimitEntry;

    /// Forget the counter for `key`.
    fn reset(&self, key: &str);

    /// Number of keys currently held (expired ones included until purged).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `now + window`, saturating at the latest representable instant.
pub(crate) fn window_end(now: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    now.checked_add_signed(window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
