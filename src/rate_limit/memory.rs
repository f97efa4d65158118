// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process rate-limit store.
//!
//! Counters live in a single `Mutex<HashMap>` and are lost on restart. Each
//! instance of the service counts independently, so limits are only exact for
//! single-instance deployments.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};

use super::store::{window_end, RateLimitEntry, RateLimitStore};

/// Minimum interval between sweeps of expired entries (5 minutes).
pub const PURGE_INTERVAL: TimeDelta = TimeDelta::minutes(5);

struct Inner {
    entries: HashMap<String, RateLimitEntry>,
    last_purge: DateTime<Utc>,
}

/// `HashMap`-backed store with lazy purging of expired windows.
pub struct InMemoryRateLimitStore {
    inner: Mutex<Inner>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Create a store whose purge clock starts at `now`.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                last_purge: now,
            }),
        }
    }

    // A counter map holds no cross-entry invariant, so a poisoned lock is
    // still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn purge_if_due(&mut self, now: DateTime<Utc>) {
        if now.signed_duration_since(self.last_purge) <= PURGE_INTERVAL {
            return;
        }
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        self.last_purge = now;

        let purged = before - self.entries.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = self.entries.len(), "Purged expired rate-limit entries");
        }
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(&self, key: &str, window: TimeDelta, now: DateTime<Utc>) -> RateLimitEntry {
        let mut inner = self.lock();
        inner.purge_if_due(now);

        match inner.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.count = entry.count.saturating_add(1);
                entry.clone()
            }
            Some(entry) => {
                entry.count = 1;
                entry.window_expires_at = window_end(now, window);
                entry.clone()
            }
            None => {
                let entry = RateLimitEntry::fresh(key, window, now);
                inner.entries.insert(key.to_string(), entry.clone());
                entry
            }
        }
    }

    fn reset(&self, key: &str) {
        self.lock().entries.remove(key);
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn first_hit_creates_fresh_entry() {
        let store = InMemoryRateLimitStore::starting_at(t0());
        let entry = store.hit("k", TimeDelta::seconds(60), t0());

        assert_eq!(entry.count, 1);
        assert_eq!(entry.window_expires_at, t0() + TimeDelta::seconds(60));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn hits_within_window_increment() {
        let store = InMemoryRateLimitStore::starting_at(t0());
        store.hit("k", TimeDelta::seconds(60), t0());
        let entry = store.hit("k", TimeDelta::seconds(60), t0() + TimeDelta::seconds(59));

        assert_eq!(entry.count, 2);
        // Window end is fixed by the first hit.
        assert_eq!(entry.window_expires_at, t0() + TimeDelta::seconds(60));
    }

    #[test]
    fn expired_entry_is_replaced() {
        let store = InMemoryRateLimitStore::starting_at(t0());
        store.hit("k", TimeDelta::seconds(60), t0());
        store.hit("k", TimeDelta::seconds(60), t0());

        let later = t0() + TimeDelta::seconds(60);
        let entry = store.hit("k", TimeDelta::seconds(60), later);
        assert_eq!(entry.count, 1);
        assert_eq!(entry.window_expires_at, later + TimeDelta::seconds(60));
    }

    #[test]
    fn purge_waits_for_interval() {
        let store = InMemoryRateLimitStore::starting_at(t0());
        store.hit("stale", TimeDelta::seconds(1), t0());

        // Expired, but the purge interval has not elapsed yet.
        store.hit("other", TimeDelta::seconds(1), t0() + TimeDelta::minutes(4));
        assert_eq!(store.len(), 2);

        // Past the interval: the next hit sweeps both expired keys away.
        store.hit("fresh", TimeDelta::seconds(60), t0() + TimeDelta::minutes(6));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reset_forgets_key() {
        let store = InMemoryRateLimitStore::starting_at(t0());
        store.hit("k", TimeDelta::seconds(60), t0());
        store.reset("k");
        assert!(store.is_empty());
    }
}
