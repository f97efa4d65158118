// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the HTTP surface. All types derive
//! `ToSchema` for OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **CSRF**: token issuance
//! - **Profile**: creator profile fields submitted from the storefront forms
//! - **Structured Data**: schema.org JSON-LD for product and shop pages
//!
//! Upload results are [`crate::upload::FileValidationResult`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// CSRF Models
// =============================================================================

/// A freshly issued CSRF token.
///
/// Send it back in the `x-csrf-token` header or the `csrf_token` form field
/// of the next state-changing request. Each token is accepted once.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
    /// Seconds until the token expires.
    pub expires_in_secs: u64,
}

// =============================================================================
// Profile Models
// =============================================================================

/// Maximum length of the profile bio in characters.
pub const MAX_BIO_LEN: usize = 500;

/// Creator profile form submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProfileRequest {
    pub display_name: String,
    pub username: String,
    pub email: String,
    /// Shop or portfolio link; must be `https`.
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// CSRF token, when not sent as a header.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Sanitized creator profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ProfileResponse {
    pub display_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

// =============================================================================
// Structured Data Models
// =============================================================================

/// Escaped JSON-LD ready to embed in a page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StructuredDataResponse {
    /// Serialized JSON-LD with `<`, `>`, `&`, U+2028 and U+2029 escaped.
    pub json_ld: String,
    /// The same payload wrapped in `<script type="application/ld+json">`.
    pub script: String,
}
