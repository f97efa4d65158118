// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Allow-list sanitizers for individual form fields.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;

pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 30;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_URL_LEN: usize = 2048;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,}$")
        .ok()
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{field} is required")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
    #[error("{field} is not valid")]
    Invalid { field: &'static str },
    #[error("URL must use https")]
    InsecureScheme,
    #[error("URL must not contain credentials")]
    EmbeddedCredentials,
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

/// Trimmed, lowercased `local@domain.tld`.
pub fn sanitize_email(input: &str) -> Result<String, FieldError> {
    let email = input.trim().to_lowercase();
    if email.is_empty() {
        return Err(FieldError::Empty { field: "email" });
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(FieldError::TooLong {
            field: "email",
            max: MAX_EMAIL_LEN,
        });
    }
    let well_formed = EMAIL.as_ref().is_some_and(|re| re.is_match(&email));
    if !well_formed || email.contains("..") {
        return Err(FieldError::Invalid { field: "email" });
    }
    Ok(email)
}

/// Keep `[A-Za-z0-9_-]`, lowercase, 3 to 30 characters.
pub fn sanitize_username(input: &str) -> Result<String, FieldError> {
    let username: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_USERNAME_LEN)
        .collect();

    if username.is_empty() {
        return Err(FieldError::Empty { field: "username" });
    }
    if username.len() < MIN_USERNAME_LEN {
        return Err(FieldError::TooShort {
            field: "username",
            min: MIN_USERNAME_LEN,
        });
    }
    Ok(username)
}

/// NFC-normalized display name of letters, spaces, `-`, `'` and `.`.
pub fn sanitize_name(input: &str) -> Result<String, FieldError> {
    let filtered: String = input
        .nfc()
        .filter(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '-' | '\'' | '.'))
        .collect();
    let name: String = filtered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    let name = name.trim_end().to_string();

    if name.is_empty() {
        return Err(FieldError::Empty { field: "name" });
    }
    Ok(name)
}

/// An absolute `https` URL with a host and no userinfo, normalized.
pub fn sanitize_url(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty { field: "url" });
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(FieldError::TooLong {
            field: "url",
            max: MAX_URL_LEN,
        });
    }

    let url = Url::parse(trimmed).map_err(|_| FieldError::Invalid { field: "url" })?;
    if url.scheme() != "https" {
        return Err(FieldError::InsecureScheme);
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FieldError::Invalid { field: "url" });
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(FieldError::EmbeddedCredentials);
    }
    Ok(url.to_string())
}

/// Parse a UUID, returning it in canonical hyphenated lowercase form.
pub fn validate_uuid(input: &str) -> Result<Uuid, FieldError> {
    Uuid::parse_str(input.trim()).map_err(|_| FieldError::Invalid { field: "id" })
}

/// Strip control characters other than newline and tab, trim, and cap at
/// `max_chars` characters.
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect();
    cleaned.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}
