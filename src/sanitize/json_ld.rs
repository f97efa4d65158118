// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Validation and escaping of schema.org JSON-LD for inline `<script>` tags.
//!
//! Input is expected to be built server-side from trusted fields; the checks
//! here are a second line behind that.

use std::sync::LazyLock;

use regex::RegexSet;
use serde_json::{Map, Value};

/// The only accepted `@context`.
pub const SCHEMA_ORG_CONTEXT: &str = "https://schema.org";

/// Maximum object/array nesting.
pub const MAX_DEPTH: usize = 32;

const DANGEROUS_PATTERNS: &[&str] = &[
    r"(?i)<\s*/?\s*script",
    r"(?i)javascript\s*:",
    r"(?i)vbscript\s*:",
    r"(?i)data\s*:\s*text/html",
    r"(?i)\bon[a-z]+\s*=",
    r"(?i)&#x?[0-9a-f]+",
    r"(?i)expression\s*\(",
    r"(?i)@import",
];

const DANGEROUS_VALUE_FRAGMENTS: &[&str] = &["<script", "javascript:", "onerror", "onclick"];

// `None` if the set failed to compile; every document is then rejected.
static DANGEROUS: LazyLock<Option<RegexSet>> = LazyLock::new(|| RegexSet::new(DANGEROUS_PATTERNS).ok());

/// Why a document was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JsonLdRejection {
    #[error("root is not an object")]
    NotAnObject,
    #[error("serialization failed")]
    Unserializable,
    #[error("matched a dangerous pattern")]
    DangerousPattern,
    #[error("@context is not https://schema.org")]
    WrongContext,
    #[error("nested value contains markup or script")]
    DangerousValue,
    #[error("property name is not allowed")]
    InvalidKey,
    #[error("nesting too deep")]
    TooDeep,
}

impl JsonLdRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            JsonLdRejection::NotAnObject => "not_an_object",
            JsonLdRejection::Unserializable => "unserializable",
            JsonLdRejection::DangerousPattern => "dangerous_pattern",
            JsonLdRejection::WrongContext => "wrong_context",
            JsonLdRejection::DangerousValue => "dangerous_value",
            JsonLdRejection::InvalidKey => "invalid_key",
            JsonLdRejection::TooDeep => "too_deep",
        }
    }
}

/// Validate `data` and return it serialized and escaped, or `None`.
pub fn validate_and_escape_json_ld(data: &Value) -> Option<String> {
    match check_json_ld(data) {
        Ok(escaped) => Some(escaped),
        Err(rejection) => {
            tracing::warn!(reason = rejection.reason(), "Rejected JSON-LD");
            None
        }
    }
}

/// Validate `data` and wrap the escaped output in a JSON-LD script tag.
pub fn render_json_ld_script(data: &Value) -> Option<String> {
    validate_and_escape_json_ld(data).map(|json| wrap_json_ld_script(&json))
}

/// Wrap already-escaped JSON-LD in its script element.
pub fn wrap_json_ld_script(escaped: &str) -> String {
    format!(r#"<script type="application/ld+json">{escaped}</script>"#)
}

/// Same as [`validate_and_escape_json_ld`], reporting the rejection cause.
pub fn check_json_ld(data: &Value) -> Result<String, JsonLdRejection> {
    let root = data.as_object().ok_or(JsonLdRejection::NotAnObject)?;

    let serialized = serde_json::to_string(data).map_err(|_| JsonLdRejection::Unserializable)?;
    let dangerous = match &*DANGEROUS {
        Some(set) => set.is_match(&serialized),
        None => true,
    };
    if dangerous {
        return Err(JsonLdRejection::DangerousPattern);
    }

    if root.get("@context").and_then(Value::as_str) != Some(SCHEMA_ORG_CONTEXT) {
        return Err(JsonLdRejection::WrongContext);
    }

    check_object(root, 1)?;

    Ok(escape_for_script(&serialized))
}

fn check_object(object: &Map<String, Value>, depth: usize) -> Result<(), JsonLdRejection> {
    if depth > MAX_DEPTH {
        return Err(JsonLdRejection::TooDeep);
    }
    for (key, value) in object {
        if !is_allowed_key(key) {
            return Err(JsonLdRejection::InvalidKey);
        }
        check_value(value, depth)?;
    }
    Ok(())
}

fn check_value(value: &Value, depth: usize) -> Result<(), JsonLdRejection> {
    match value {
        Value::String(s) => {
            let lower = s.to_lowercase();
            if DANGEROUS_VALUE_FRAGMENTS.iter().any(|f| lower.contains(f)) {
                return Err(JsonLdRejection::DangerousValue);
            }
            Ok(())
        }
        Value::Object(object) => check_object(object, depth + 1),
        Value::Array(items) => {
            if depth + 1 > MAX_DEPTH {
                return Err(JsonLdRejection::TooDeep);
            }
            items.iter().try_for_each(|item| check_value(item, depth + 1))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(()),
    }
}

/// `@` followed by letters, or a schema.org-style identifier.
fn is_allowed_key(key: &str) -> bool {
    if let Some(keyword) = key.strip_prefix('@') {
        return !keyword.is_empty() && keyword.chars().all(|c| c.is_ascii_alphabetic());
    }
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escape characters that could close the script element or break JS
/// parsing. Only valid inside JSON strings, which is the only place they can
/// occur in serialized JSON.
fn escape_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}
