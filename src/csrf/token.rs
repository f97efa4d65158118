// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless CSRF token generation and validation.
//!
//! Token format: 64 hex characters (32 random bytes), optionally followed by
//! `.` and the hex HMAC-SHA256 of those 64 characters under the session secret.

use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CsrfError;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 32;

/// Hex length of the random part.
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

const SIGNATURE_SEPARATOR: char = '.';

/// Generate a new token, signed when `secret` is provided.
pub fn generate_csrf_token(secret: Option<&[u8]>) -> Result<String, CsrfError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| CsrfError::RandomUnavailable)?;

    let value = hex::encode(bytes);
    match secret {
        Some(secret) => {
            let signature = sign(&value, secret).ok_or(CsrfError::SigningUnavailable)?;
            Ok(format!("{value}{SIGNATURE_SEPARATOR}{signature}"))
        }
        None => Ok(value),
    }
}

/// Validate a submitted token against the issued one.
///
/// When `expected` is signed and a secret is available, both value halves are
/// compared and the signature is recomputed from the expected value; every
/// comparison runs to completion before the results are combined. Otherwise
/// the full strings are compared. Any missing, empty or malformed input, or a
/// failure to compute the HMAC, yields `false`.
pub fn validate_csrf_token(submitted: Option<&str>, expected: &str, secret: Option<&[u8]>) -> bool {
    let Some(submitted) = submitted.map(str::trim).filter(|s| is_well_formed(s)) else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    match (expected.split_once(SIGNATURE_SEPARATOR), secret) {
        (Some((expected_value, expected_sig)), Some(secret)) => {
            let Some((submitted_value, submitted_sig)) = submitted.split_once(SIGNATURE_SEPARATOR)
            else {
                return false;
            };
            let Some(recomputed) = sign(expected_value, secret) else {
                return false;
            };

            let value_ok = constant_time_eq(submitted_value, expected_value);
            let sig_ok = constant_time_eq(submitted_sig, &recomputed);
            let issued_ok = constant_time_eq(expected_sig, &recomputed);
            value_ok & sig_ok & issued_ok
        }
        _ => constant_time_eq(submitted, expected),
    }
}

/// Equality check whose running time depends only on the input length.
///
/// Unequal lengths return immediately; token length is not secret.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

/// Hex HMAC-SHA256 of `value` under `secret`.
pub(crate) fn sign(value: &str, secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(value.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Whether `token` has the shape of an issued token (signed or not).
pub fn is_well_formed(token: &str) -> bool {
    let is_hex64 = |s: &str| s.len() == TOKEN_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit());
    match token.split_once(SIGNATURE_SEPARATOR) {
        Some((value, sig)) => is_hex64(value) && is_hex64(sig),
        None => is_hex64(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn unsigned_token_is_64_hex_chars() {
        let token = generate_csrf_token(None).unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(is_well_formed(&token));
    }

    #[test]
    fn signed_token_has_hmac_suffix() {
        let token = generate_csrf_token(Some(SECRET)).unwrap();
        let (value, sig) = token.split_once('.').unwrap();
        assert_eq!(value.len(), 64);
        assert_eq!(sig.len(), 64);
        assert_eq!(sign(value, SECRET).unwrap(), sig);
        assert!(is_well_formed(&token));
    }

    #[test]
    fn tokens_are_unique() {
        let a = generate_csrf_token(None).unwrap();
        let b = generate_csrf_token(None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hmac_matches_rfc4231_case_2() {
        let sig = sign("what do ya want for nothing?", b"Jefe").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn unsigned_round_trip() {
        let token = generate_csrf_token(None).unwrap();
        assert!(validate_csrf_token(Some(&token), &token, None));
        assert!(validate_csrf_token(Some(&format!(" {token} ")), &token, None));
    }

    #[test]
    fn signed_round_trip() {
        let token = generate_csrf_token(Some(SECRET)).unwrap();
        assert!(validate_csrf_token(Some(&token), &token, Some(SECRET)));
    }

    #[test]
    fn missing_or_empty_tokens_fail() {
        let token = generate_csrf_token(None).unwrap();
        assert!(!validate_csrf_token(None, &token, None));
        assert!(!validate_csrf_token(Some(""), &token, None));
        assert!(!validate_csrf_token(Some("   "), &token, None));
        assert!(!validate_csrf_token(Some(&token), "", None));
    }

    #[test]
    fn tampered_signature_fails() {
        let token = generate_csrf_token(Some(SECRET)).unwrap();
        let (value, _) = token.split_once('.').unwrap();
        let forged = format!("{value}.{}", "0".repeat(64));
        assert!(!validate_csrf_token(Some(&forged), &token, Some(SECRET)));
    }

    #[test]
    fn tampered_value_fails_even_with_valid_signature_for_it() {
        let token = generate_csrf_token(Some(SECRET)).unwrap();
        let other_value = "a".repeat(64);
        let forged = format!("{other_value}.{}", sign(&other_value, SECRET).unwrap());
        assert!(!validate_csrf_token(Some(&forged), &token, Some(SECRET)));
    }

    #[test]
    fn signed_expected_rejects_unsigned_submission() {
        let token = generate_csrf_token(Some(SECRET)).unwrap();
        let (value, _) = token.split_once('.').unwrap();
        assert!(!validate_csrf_token(Some(value), &token, Some(SECRET)));
    }

    #[test]
    fn wrong_secret_fails() {
        let token = generate_csrf_token(Some(SECRET)).unwrap();
        assert!(!validate_csrf_token(
            Some(&token),
            &token,
            Some(b"another-secret-another-secret-xx")
        ));
    }

    #[test]
    fn constant_time_eq_semantics() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn mismatch_is_detected_at_every_position() {
        let reference = "f".repeat(64);
        for position in 0..64 {
            let mut candidate = reference.clone().into_bytes();
            candidate[position] = b'0';
            let candidate = String::from_utf8(candidate).unwrap();
            assert!(
                !constant_time_eq(&reference, &candidate),
                "mismatch at {position} went unnoticed"
            );
        }
        assert!(constant_time_eq(&reference, &"f".repeat(64)));
    }

    #[test]
    fn malformed_shapes_are_detected() {
        assert!(!is_well_formed("xyz"));
        assert!(!is_well_formed(&"g".repeat(64)));
        assert!(!is_well_formed(&format!("{}.", "a".repeat(64))));
    }

    #[test]
    fn malformed_submission_is_rejected_before_comparison() {
        let short = "ab";
        assert!(!validate_csrf_token(Some(short), short, None));

        let not_hex = "z".repeat(64);
        assert!(!validate_csrf_token(Some(&not_hex), &not_hex, None));

        let token = generate_csrf_token(Some(SECRET)).unwrap();
        let extra = format!("{token}.00");
        assert!(!validate_csrf_token(Some(&extra), &token, Some(SECRET)));
    }
}
