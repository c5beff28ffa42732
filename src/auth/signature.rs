// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signatures the platform attaches to responses, and login-session cookies.
//!
//! All of these are HMAC-SHA1 keyed with the base64 secret key:
//!
//! | Value | Signed text |
//! |-------|-------------|
//! | user signature | `<timestamp>_<UID>` |
//! | friendship signature | `<timestamp>_<friendUID>_<UID>` |
//! | session cookie | `<glt>_<expiration>` |
//! | user-signed session cookie | `<glt>_<expiration>_<userKey>` |

use chrono::Utc;

use super::oauth1::{calc_signature, verify_signature, HmacAlgorithm};
use crate::error::SdkError;

/// Check a `UIDSignature` returned with user info.
pub fn validate_user_signature(
    uid: &str,
    timestamp: &str,
    secret: &str,
    signature: &str,
) -> Result<bool, SdkError> {
    verify_signature(&format!("{timestamp}_{uid}"), secret, signature)
}

/// [`validate_user_signature`] that also rejects timestamps more than
/// `expiration_secs` away from now.
pub fn validate_user_signature_within(
    uid: &str,
    timestamp: &str,
    secret: &str,
    signature: &str,
    expiration_secs: i64,
) -> Result<bool, SdkError> {
    if signature_timestamp_expired(timestamp, expiration_secs)? {
        return Ok(false);
    }
    validate_user_signature(uid, timestamp, secret, signature)
}

/// Check a `friendshipSignature` returned with friend info.
pub fn validate_friend_signature(
    uid: &str,
    timestamp: &str,
    friend_uid: &str,
    secret: &str,
    signature: &str,
) -> Result<bool, SdkError> {
    verify_signature(&format!("{timestamp}_{friend_uid}_{uid}"), secret, signature)
}

pub fn validate_friend_signature_within(
    uid: &str,
    timestamp: &str,
    friend_uid: &str,
    secret: &str,
    signature: &str,
    expiration_secs: i64,
) -> Result<bool, SdkError> {
    if signature_timestamp_expired(timestamp, expiration_secs)? {
        return Ok(false);
    }
    validate_friend_signature(uid, timestamp, friend_uid, secret, signature)
}

/// True when `|now - timestamp| > expiration_secs`.
pub fn signature_timestamp_expired(timestamp: &str, expiration_secs: i64) -> Result<bool, SdkError> {
    let ts: i64 = timestamp.trim().parse().map_err(|_| {
        SdkError::Format(crate::params::ParamsError::Format {
            key: "signatureTimestamp".into(),
            expected: "long",
            found: "string",
        })
    })?;
    Ok((Utc::now().timestamp() - ts).abs() > expiration_secs)
}

/// Session expiration cookie value: `<exp>_<sig>`.
pub fn dynamic_session_signature(
    glt_cookie: &str,
    timeout_secs: i64,
    secret: &str,
) -> Result<String, SdkError> {
    let expiration = Utc::now().timestamp() + timeout_secs;
    let signature = calc_signature(&format!("{glt_cookie}_{expiration}"), secret, HmacAlgorithm::Sha1)?;
    Ok(format!("{expiration}_{signature}"))
}

/// Session expiration cookie signed for an administrative user key:
/// `<exp>_<userKey>_<sig>`.
pub fn dynamic_session_signature_user_signed(
    glt_cookie: &str,
    timeout_secs: i64,
    user_key: &str,
    secret: &str,
) -> Result<String, SdkError> {
    let expiration = Utc::now().timestamp() + timeout_secs;
    let signature = calc_signature(
        &format!("{glt_cookie}_{expiration}_{user_key}"),
        secret,
        HmacAlgorithm::Sha1,
    )?;
    Ok(format!("{expiration}_{user_key}_{signature}"))
}
