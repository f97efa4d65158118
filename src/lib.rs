// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! WornVault Guard - request validation and abuse prevention
//!
//! The checks the WornVault storefront runs before any business logic
//! touches a request, plus a small Axum service exposing them.
//!
//! ## Modules
//!
//! - `rate_limit` - Fixed-window request budgets per client and route class
//! - `csrf` - Signed single-use CSRF tokens bound to a session
//! - `upload` - Magic-byte and header validation of uploaded images
//! - `sanitize` - JSON-LD escaping and form field allow-lists
//! - `api` - HTTP routes (Axum) mounting the checks

pub mod api;
pub mod config;
pub mod csrf;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod sanitize;
pub mod state;
pub mod telemetry;
pub mod upload;
