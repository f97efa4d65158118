// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input sanitization.
//!
//! - [`json_ld`]: structured data embedded in pages
//! - [`fields`]: user-submitted form fields

pub mod fields;
pub mod json_ld;

pub use fields::{
    sanitize_email, sanitize_name, sanitize_text, sanitize_url, sanitize_username, validate_uuid,
    FieldError,
};
pub use json_ld::{
    check_json_ld, render_json_ld_script, validate_and_escape_json_ld, wrap_json_ld_script,
    JsonLdRejection,
};
