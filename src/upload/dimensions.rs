// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Header-only dimension decoders, one per format.
//!
//! Every read is bounds-checked; a truncated or malformed header yields an
//! error with a short reason for the logs.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

type Decoded = Result<Dimensions, &'static str>;

fn be16(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 2)?;
    Some(u32::from(u16::from_be_bytes([b[0], b[1]])))
}

fn le16(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 2)?;
    Some(u32::from(u16::from_le_bytes([b[0], b[1]])))
}

fn le24(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 3)?;
    Some(u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16)
}

fn be32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn le32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

const JPEG_SOI: u8 = 0xD8;
const JPEG_EOI: u8 = 0xD9;
const JPEG_SOS: u8 = 0xDA;
const JPEG_TEM: u8 = 0x01;

/// Walk JPEG segments from offset 2 until a baseline/progressive SOF.
pub fn jpeg(bytes: &[u8]) -> Decoded {
    let mut i = 2;
    loop {
        if bytes.get(i) != Some(&0xFF) {
            return Err(if i >= bytes.len() {
                "no SOF marker"
            } else {
                "expected segment marker"
            });
        }
        // Any number of 0xFF fill bytes may precede the marker code.
        while bytes.get(i) == Some(&0xFF) {
            i += 1;
        }
        let marker = *bytes.get(i).ok_or("truncated marker")?;
        i += 1;

        match marker {
            JPEG_SOI | JPEG_TEM | 0xD0..=0xD7 => continue,
            JPEG_EOI | JPEG_SOS => return Err("no SOF before scan data"),
            _ => {}
        }

        let length = be16(bytes, i).ok_or("truncated segment length")? as usize;
        if length < 2 {
            return Err("invalid segment length");
        }

        if (0xC0..=0xC3).contains(&marker) {
            // length(2) precision(1) height(2) width(2)
            let height = be16(bytes, i + 3).ok_or("truncated SOF")?;
            let width = be16(bytes, i + 5).ok_or("truncated SOF")?;
            return Ok(Dimensions { width, height });
        }

        i += length;
    }
}

/// IHDR must be the first chunk.
pub fn png(bytes: &[u8]) -> Decoded {
    if bytes.get(12..16) != Some(b"IHDR".as_slice()) {
        return Err("IHDR chunk missing");
    }
    let width = be32(bytes, 16).ok_or("truncated IHDR")?;
    let height = be32(bytes, 20).ok_or("truncated IHDR")?;
    Ok(Dimensions { width, height })
}

/// Logical screen size from the GIF header.
pub fn gif(bytes: &[u8]) -> Decoded {
    let width = le16(bytes, 6).ok_or("truncated header")?;
    let height = le16(bytes, 8).ok_or("truncated header")?;
    Ok(Dimensions { width, height })
}

const VP8_START_CODE: [u8; 3] = [0x9D, 0x01, 0x2A];
const VP8L_SIGNATURE: u8 = 0x2F;

/// Dispatch on the first chunk tag: lossy `VP8 `, lossless `VP8L` or
/// extended `VP8X`.
pub fn webp(bytes: &[u8]) -> Decoded {
    match bytes.get(12..16) {
        Some(b"VP8 ") => {
            if bytes.get(23..26) != Some(VP8_START_CODE.as_slice()) {
                return Err("VP8 start code missing");
            }
            let width = le16(bytes, 26).ok_or("truncated VP8 frame header")? & 0x3FFF;
            let height = le16(bytes, 28).ok_or("truncated VP8 frame header")? & 0x3FFF;
            Ok(Dimensions { width, height })
        }
        Some(b"VP8L") => {
            if bytes.get(20) != Some(&VP8L_SIGNATURE) {
                return Err("VP8L signature missing");
            }
            let bits = le32(bytes, 21).ok_or("truncated VP8L header")?;
            Ok(Dimensions {
                width: (bits & 0x3FFF) + 1,
                height: ((bits >> 14) & 0x3FFF) + 1,
            })
        }
        Some(b"VP8X") => {
            let width = le24(bytes, 24).ok_or("truncated VP8X header")? + 1;
            let height = le24(bytes, 27).ok_or("truncated VP8X header")? + 1;
            Ok(Dimensions { width, height })
        }
        Some(_) => Err("unknown WebP chunk"),
        None => Err("truncated RIFF header"),
    }
}
