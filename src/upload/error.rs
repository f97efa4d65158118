// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upload validation errors.

use crate::error::ApiError;

/// Message shown for every content-level rejection.
pub const CORRUPT_FILE_MESSAGE: &str = "File may be corrupted or malicious";

/// Why an upload was rejected. The variant is logged; only
/// [`UploadError::user_message`] reaches the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("file is empty")]
    Empty,
    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("unsupported declared type {0:?}")]
    UnsupportedType(String),
    /// `detected` is the type the leading bytes do carry, if any.
    #[error("content does not match declared type {declared} (detected {detected:?})")]
    SignatureMismatch {
        declared: &'static str,
        detected: Option<&'static str>,
    },
    #[error("could not read {format} dimensions: {reason}")]
    Undecodable {
        format: &'static str,
        reason: &'static str,
    },
    #[error("dimensions {width}x{height} out of bounds")]
    DimensionsOutOfBounds { width: u32, height: u32 },
    #[error("aspect ratio of {width}x{height} out of bounds")]
    AspectRatioOutOfBounds { width: u32, height: u32 },
    #[error("missing multipart field {0:?}")]
    MissingField(&'static str),
}

impl UploadError {
    /// Client-facing message. Size and type gates are specific; content
    /// gates all share [`CORRUPT_FILE_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Empty => "File is empty".to_string(),
            UploadError::TooLarge { limit, .. } => {
                format!("File too large. Maximum size is {}MB", limit / (1024 * 1024))
            }
            UploadError::UnsupportedType(_) => {
                "Invalid file type. Only JPEG, PNG, GIF and WebP images are allowed".to_string()
            }
            UploadError::MissingField(field) => format!("Missing {field} field"),
            UploadError::SignatureMismatch { .. }
            | UploadError::Undecodable { .. }
            | UploadError::DimensionsOutOfBounds { .. }
            | UploadError::AspectRatioOutOfBounds { .. } => CORRUPT_FILE_MESSAGE.to_string(),
        }
    }

    /// Whether this is a content-level rejection (possibly spoofed file).
    pub fn is_content_rejection(&self) -> bool {
        matches!(
            self,
            UploadError::SignatureMismatch { .. }
                | UploadError::Undecodable { .. }
                | UploadError::DimensionsOutOfBounds { .. }
                | UploadError::AspectRatioOutOfBounds { .. }
        )
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError::bad_request(err.user_message())
    }
}
