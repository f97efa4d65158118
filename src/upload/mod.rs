// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content validation for uploaded images.
//!
//! The declared MIME type is never trusted on its own: the leading bytes must
//! carry the declared format's signature, and the header must decode to
//! plausible dimensions.
//!
//! ```text
//! bytes + declared MIME
//!   1. size        0 < len ≤ 10 MB
//!   2. type        jpeg | jpg | png | gif | webp
//!   3. signature   magic bytes match the declared format
//!   4. dimensions  per-format header decode
//!   5. bounds      1..=5000 px, aspect ratio in [0.01, 100]
//!   └─► ValidatedImage { format, dimensions }
//! ```
//!
//! Gates run in order and stop at the first failure.

pub mod dimensions;
pub mod error;
pub mod format;

#[cfg(test)]
pub(crate) mod fixtures;

pub use dimensions::Dimensions;
pub use error::{UploadError, CORRUPT_FILE_MESSAGE};
pub use format::ImageFormat;

use serde::Serialize;
use utoipa::ToSchema;

/// Largest accepted upload (10 MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Largest accepted width or height in pixels.
pub const MAX_DIMENSION: u32 = 5000;

pub const MIN_ASPECT_RATIO: f64 = 0.01;
pub const MAX_ASPECT_RATIO: f64 = 100.0;

/// An upload that passed every gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedImage {
    pub format: ImageFormat,
    pub dimensions: Dimensions,
}

impl ValidatedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Validate `bytes` against the declared MIME type.
pub fn validate_image_file(bytes: &[u8], declared_mime: &str) -> Result<ValidatedImage, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            limit: MAX_FILE_SIZE,
        });
    }

    let format = ImageFormat::from_mime(declared_mime)
        .ok_or_else(|| UploadError::UnsupportedType(declared_mime.to_string()))?;

    let head = &bytes[..bytes.len().min(12)];
    if !format.matches_signature(head) {
        return Err(UploadError::SignatureMismatch {
            declared: format.mime_type(),
            detected: ImageFormat::sniff(head).map(ImageFormat::mime_type),
        });
    }

    let dimensions = format.dimensions(bytes)?;
    check_bounds(dimensions)?;

    Ok(ValidatedImage { format, dimensions })
}

fn check_bounds(Dimensions { width, height }: Dimensions) -> Result<(), UploadError> {
    if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
        return Err(UploadError::DimensionsOutOfBounds { width, height });
    }
    let ratio = f64::from(width) / f64::from(height);
    if !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio) {
        return Err(UploadError::AspectRatioOutOfBounds { width, height });
    }
    Ok(())
}

/// Wire form of a validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum FileValidationResult {
    Valid {
        valid: bool,
        mime_type: String,
        dimensions: Dimensions,
    },
    Invalid {
        valid: bool,
        error: String,
    },
}

impl FileValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, FileValidationResult::Valid { .. })
    }
}

impl From<&Result<ValidatedImage, UploadError>> for FileValidationResult {
    fn from(outcome: &Result<ValidatedImage, UploadError>) -> Self {
        match outcome {
            Ok(image) => FileValidationResult::Valid {
                valid: true,
                mime_type: image.mime_type().to_string(),
                dimensions: image.dimensions,
            },
            Err(err) => FileValidationResult::Invalid {
                valid: false,
                error: err.user_message(),
            },
        }
    }
}
