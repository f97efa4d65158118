// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the service. Configuration is loaded from the environment
//! once at startup and shared read-only through [`crate::state::AppState`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `CSRF_SECRET` | HMAC key for signed CSRF tokens (>= 32 bytes) | unset (unsigned tokens) |
//! | `CSRF_TOKEN_TTL_SECS` | Lifetime of an issued CSRF token | `3600` |
//! | `RATE_LIMIT_ENABLED` | Enable the rate-limit middleware | `true` |
//! | `TRUST_PROXY_HEADERS` | Derive client identity from `X-Forwarded-For` & co. | `false` |
//! | `UPLOAD_READ_TIMEOUT_SECS` | Max time to read a multipart upload | `30` |

use std::env;
use std::fmt;
use std::time::Duration;

/// Environment variable name for the bind host.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable name for the CSRF signing secret.
///
/// When unset, tokens are issued unsigned and validated by plain
/// constant-time comparison against the session copy.
pub const CSRF_SECRET_ENV: &str = "CSRF_SECRET";

/// Environment variable name for the CSRF token lifetime in seconds.
pub const CSRF_TOKEN_TTL_ENV: &str = "CSRF_TOKEN_TTL_SECS";

/// Environment variable name for the rate-limit switch.
pub const RATE_LIMIT_ENABLED_ENV: &str = "RATE_LIMIT_ENABLED";

/// Environment variable name for trusting reverse-proxy forwarding headers.
///
/// Only enable behind a proxy that overwrites `X-Forwarded-For`; otherwise
/// clients can pick their own rate-limit bucket.
pub const TRUST_PROXY_HEADERS_ENV: &str = "TRUST_PROXY_HEADERS";

/// Environment variable name for the upload read timeout in seconds.
pub const UPLOAD_READ_TIMEOUT_ENV: &str = "UPLOAD_READ_TIMEOUT_SECS";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CSRF_TTL: Duration = crate::csrf::DEFAULT_TOKEN_TTL;
const DEFAULT_UPLOAD_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum accepted length of `CSRF_SECRET` in bytes.
pub const MIN_CSRF_SECRET_LEN: usize = 32;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Configuration errors raised at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("CSRF_SECRET must be at least 32 bytes")]
    WeakCsrfSecret,
}

/// Service configuration loaded from the environment.
#[derive(Clone)]
pub struct GuardConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub csrf_secret: Option<Vec<u8>>,
    pub csrf_token_ttl: Duration,
    pub rate_limit_enabled: bool,
    pub trust_proxy_headers: bool,
    pub upload_read_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_format: LogFormat::Pretty,
            csrf_secret: None,
            csrf_token_ttl: DEFAULT_CSRF_TTL,
            rate_limit_enabled: true,
            trust_proxy_headers: false,
            upload_read_timeout: DEFAULT_UPLOAD_READ_TIMEOUT,
        }
    }
}

// The CSRF secret never reaches logs.
impl fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_format", &self.log_format)
            .field("csrf_secret", &self.csrf_secret.as_ref().map(|_| "<redacted>"))
            .field("csrf_token_ttl", &self.csrf_token_ttl)
            .field("rate_limit_enabled", &self.rate_limit_enabled)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("upload_read_timeout", &self.upload_read_timeout)
            .finish()
    }
}

impl GuardConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Split out from [`GuardConfig::from_env`] so tests never touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup(HOST_ENV).unwrap_or(defaults.host);

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: PORT_ENV,
                value: raw.clone(),
                reason: "expected a port number",
            })?,
            None => defaults.port,
        };

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(raw) => parse_log_format(&raw)?,
            None => defaults.log_format,
        };

        let csrf_secret = match lookup(CSRF_SECRET_ENV) {
            Some(secret) if secret.is_empty() => None,
            Some(secret) if secret.len() < MIN_CSRF_SECRET_LEN => {
                return Err(ConfigError::WeakCsrfSecret)
            }
            Some(secret) => Some(secret.into_bytes()),
            None => None,
        };

        let csrf_token_ttl = match lookup(CSRF_TOKEN_TTL_ENV) {
            Some(raw) => parse_secs(CSRF_TOKEN_TTL_ENV, &raw)?,
            None => defaults.csrf_token_ttl,
        };

        let rate_limit_enabled = match lookup(RATE_LIMIT_ENABLED_ENV) {
            Some(raw) => parse_bool(RATE_LIMIT_ENABLED_ENV, &raw)?,
            None => defaults.rate_limit_enabled,
        };

        let trust_proxy_headers = match lookup(TRUST_PROXY_HEADERS_ENV) {
            Some(raw) => parse_bool(TRUST_PROXY_HEADERS_ENV, &raw)?,
            None => defaults.trust_proxy_headers,
        };

        let upload_read_timeout = match lookup(UPLOAD_READ_TIMEOUT_ENV) {
            Some(raw) => parse_secs(UPLOAD_READ_TIMEOUT_ENV, &raw)?,
            None => defaults.upload_read_timeout,
        };

        Ok(Self {
            host,
            port,
            log_format,
            csrf_secret,
            csrf_token_ttl,
            rate_limit_enabled,
            trust_proxy_headers,
            upload_read_timeout,
        })
    }

    /// `host:port` string for binding the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "pretty" | "text" => Ok(LogFormat::Pretty),
        _ => Err(ConfigError::InvalidValue {
            var: LOG_FORMAT_ENV,
            value: raw.to_string(),
            reason: "expected 'json' or 'pretty'",
        }),
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: "expected a boolean",
        }),
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: "expected a positive number of seconds",
        }),
    }
}
