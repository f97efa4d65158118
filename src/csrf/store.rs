// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-session CSRF token lifecycle: issue, then validate-and-consume once.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use super::token::{generate_csrf_token, validate_csrf_token};
use super::CsrfError;

/// Outstanding tokens kept per session; issuing past this evicts the oldest.
pub const MAX_TOKENS_PER_SESSION: usize = 8;

/// Token lifetime when none is configured.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

const PURGE_INTERVAL: TimeDelta = TimeDelta::minutes(5);

/// A token recorded for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

struct Inner {
    sessions: HashMap<Uuid, VecDeque<IssuedToken>>,
    last_purge: DateTime<Utc>,
}

impl Inner {
    fn purge_if_due(&mut self, now: DateTime<Utc>) {
        if now.signed_duration_since(self.last_purge) <= PURGE_INTERVAL {
            return;
        }
        for tokens in self.sessions.values_mut() {
            tokens.retain(|t| t.is_live(now));
        }
        self.sessions.retain(|_, tokens| !tokens.is_empty());
        self.last_purge = now;
    }
}

/// Server-side record of issued CSRF tokens.
pub struct CsrfTokenStore {
    inner: Mutex<Inner>,
    secret: Option<Vec<u8>>,
    ttl: TimeDelta,
}

impl CsrfTokenStore {
    /// Create a store. `secret` enables signed tokens.
    pub fn new(secret: Option<Vec<u8>>, ttl: Duration) -> Self {
        Self::starting_at(secret, ttl, Utc::now())
    }

    pub fn starting_at(secret: Option<Vec<u8>>, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                last_purge: now,
            }),
            secret,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    // A poisoned lock may hold a half-applied consume; refuse to use it.
    fn lock(&self) -> Option<MutexGuard<'_, Inner>> {
        self.inner.lock().ok()
    }

    pub fn issue(&self, session_id: Uuid) -> Result<String, CsrfError> {
        self.issue_at(session_id, Utc::now())
    }

    /// Generate a token for `session_id` and record it with its expiry.
    pub fn issue_at(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<String, CsrfError> {
        let token = generate_csrf_token(self.secret.as_deref())?;
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut inner = self.lock().ok_or(CsrfError::StoreUnavailable)?;
        inner.purge_if_due(now);

        let tokens = inner.sessions.entry(session_id).or_default();
        tokens.retain(|t| t.is_live(now));
        while tokens.len() >= MAX_TOKENS_PER_SESSION {
            tokens.pop_front();
        }
        tokens.push_back(IssuedToken {
            token: token.clone(),
            expires_at,
        });

        Ok(token)
    }

    pub fn validate_and_consume(&self, session_id: Uuid, submitted: Option<&str>) -> bool {
        self.validate_and_consume_at(session_id, submitted, Utc::now())
    }

    /// Check `submitted` against the live tokens of the session and remove
    /// the one it matches. Returns `false` on any failure.
    pub fn validate_and_consume_at(
        &self,
        session_id: Uuid,
        submitted: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(mut inner) = self.lock() else {
            tracing::error!("CSRF token store lock poisoned");
            return false;
        };
        inner.purge_if_due(now);

        let Some(tokens) = inner.sessions.get_mut(&session_id) else {
            return false;
        };
        let secret = self.secret.as_deref();
        let matched = tokens
            .iter()
            .position(|t| t.is_live(now) && validate_csrf_token(submitted, &t.token, secret));

        match matched {
            Some(index) => {
                tokens.remove(index);
                if tokens.is_empty() {
                    inner.sessions.remove(&session_id);
                }
                true
            }
            None => false,
        }
    }

    /// Drop every token of the session.
    pub fn revoke_session(&self, session_id: Uuid) {
        if let Some(mut inner) = self.lock() {
            inner.sessions.remove(&session_id);
        }
    }

    /// Tokens held for the session, expired ones included until purged.
    pub fn outstanding(&self, session_id: Uuid) -> usize {
        self.lock()
            .and_then(|inner| inner.sessions.get(&session_id).map(VecDeque::len))
            .unwrap_or(0)
    }

    /// Number of sessions holding at least one token.
    pub fn session_count(&self) -> usize {
        self.lock().map(|inner| inner.sessions.len()).unwrap_or(0)
    }
}
