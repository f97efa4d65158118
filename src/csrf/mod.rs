// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CSRF protection for state-changing form submissions.
//!
//! # Token lifecycle
//!
//! ```text
//! GET /v1/csrf-token
//!   ├─ session id from cookie / x-session-id (minted + Set-Cookie if absent)
//!   └─ CsrfTokenStore::issue ──► "<64 hex>[.<64 hex hmac>]"
//!
//! POST (form)
//!   ├─ CsrfSession extractor ──► 403 if no session
//!   ├─ token = x-csrf-token header, else csrf_token field
//!   └─ CsrfTokenStore::validate_and_consume ──► 403 unless a live token matches
//!        (the matching token is removed under the same lock)
//! ```
//!
//! Signing is enabled by `CSRF_SECRET`. Without it tokens are plain random
//! values and are only as strong as the server-side record.

pub mod error;
pub mod extract;
pub mod store;
pub mod token;

pub use error::{CsrfError, CSRF_REJECTED_MESSAGE};
pub use extract::{header_token, session_id_from_headers, submitted_token, CsrfSession};
pub use store::{CsrfTokenStore, IssuedToken, DEFAULT_TOKEN_TTL};
pub use token::{constant_time_eq, generate_csrf_token, validate_csrf_token};

use uuid::Uuid;

/// Validate and consume the token submitted for `session_id`.
///
/// `header` and `field` are the raw `x-csrf-token` header and `csrf_token`
/// field values; the header wins when both are present.
pub fn verify_submission(
    store: &CsrfTokenStore,
    session_id: Uuid,
    header: Option<&str>,
    field: Option<&str>,
) -> Result<(), CsrfError> {
    let Some(token) = submitted_token(header, field) else {
        tracing::warn!(session = %session_id, reason = "missing_token", "CSRF check failed");
        return Err(CsrfError::MissingToken);
    };

    if store.validate_and_consume(session_id, Some(token)) {
        Ok(())
    } else {
        tracing::warn!(session = %session_id, reason = "invalid_token", "CSRF check failed");
        Err(CsrfError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn verify_submission_consumes_token() {
        let store = CsrfTokenStore::new(None, Duration::from_secs(60));
        let session = Uuid::new_v4();
        let token = store.issue(session).unwrap();

        assert!(verify_submission(&store, session, None, Some(&token)).is_ok());
        assert!(matches!(
            verify_submission(&store, session, None, Some(&token)),
            Err(CsrfError::InvalidToken)
        ));
    }

    #[test]
    fn header_is_preferred_over_field() {
        let store = CsrfTokenStore::new(None, Duration::from_secs(60));
        let session = Uuid::new_v4();
        let token = store.issue(session).unwrap();

        // A stale field value is ignored when the header is valid.
        assert!(verify_submission(&store, session, Some(&token), Some("stale")).is_ok());
    }

    #[test]
    fn missing_token_is_reported() {
        let store = CsrfTokenStore::new(None, Duration::from_secs(60));
        assert!(matches!(
            verify_submission(&store, Uuid::new_v4(), None, None),
            Err(CsrfError::MissingToken)
        ));
    }
}
