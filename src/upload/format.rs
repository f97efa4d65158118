// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Accepted image formats and their file signatures.

use serde::Serialize;
use utoipa::ToSchema;

use super::dimensions::{self, Dimensions};
use super::UploadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

pub(crate) const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

impl ImageFormat {
    /// Parse a declared MIME type. Case-insensitive; parameters after `;`
    /// are ignored; `image/jpg` is accepted as JPEG.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/gif" => Some(ImageFormat::Gif),
            "image/webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    /// Canonical MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
            ImageFormat::Webp => "WebP",
        }
    }

    /// Whether the leading bytes carry this format's signature.
    pub fn matches_signature(self, bytes: &[u8]) -> bool {
        match self {
            ImageFormat::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            ImageFormat::Png => bytes.starts_with(&PNG_SIGNATURE),
            ImageFormat::Gif => {
                bytes.len() >= 6
                    && bytes.starts_with(b"GIF8")
                    && matches!(bytes[4], b'7' | b'9')
                    && bytes[5] == b'a'
            }
            ImageFormat::Webp => bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        }
    }

    /// Identify a buffer by signature alone.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        [
            ImageFormat::Jpeg,
            ImageFormat::Png,
            ImageFormat::Gif,
            ImageFormat::Webp,
        ]
        .into_iter()
        .find(|format| format.matches_signature(bytes))
    }

    /// Decode width and height from the image header.
    pub fn dimensions(self, bytes: &[u8]) -> Result<Dimensions, UploadError> {
        let decoded = match self {
            ImageFormat::Jpeg => dimensions::jpeg(bytes),
            ImageFormat::Png => dimensions::png(bytes),
            ImageFormat::Gif => dimensions::gif(bytes),
            ImageFormat::Webp => dimensions::webp(bytes),
        };
        decoded.map_err(|reason| UploadError::Undecodable {
            format: self.name(),
            reason,
        })
    }
}
