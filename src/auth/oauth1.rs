// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth1-style HMAC request signatures.
//!
//! Base string: `METHOD&enc(normalized_url)&enc(sorted_query)`, where the
//! sorted query joins `key=enc(value)` over the parameters in key order and
//! skips explicit nulls. Only `A-Z a-z 0-9 - _ . ~` pass through unencoded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use sha2::Sha256;
use url::Url;

use crate::error::SdkError;
use crate::params::Params;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Everything except RFC 3986 unreserved characters.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// HMAC digest used for a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmacAlgorithm {
    Sha1,
    Sha256,
}

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Lower-case scheme and host, drop default ports, query and fragment.
pub fn normalize_url(resource_url: &str) -> Result<String, SdkError> {
    let url = Url::parse(resource_url).map_err(|e| SdkError::InvalidUrl {
        url: resource_url.to_string(),
        reason: e.to_string(),
    })?;
    let host = url.host_str().ok_or_else(|| SdkError::InvalidUrl {
        url: resource_url.to_string(),
        reason: "missing host".into(),
    })?;

    let mut normalized = format!("{}://{}", url.scheme(), host.to_ascii_lowercase());
    // `Url::port` is None for the scheme's default port.
    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }
    normalized.push_str(url.path());
    Ok(normalized)
}

/// `key=enc(value)` pairs in key order joined by `&`.
pub fn sorted_query_string(params: &Params) -> String {
    params
        .signing_pairs()
        .map(|(key, value)| format!("{key}={}", percent_encode(&value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn base_string(http_method: &str, resource_url: &str, params: &Params) -> Result<String, SdkError> {
    let normalized = normalize_url(resource_url)?;
    Ok(format!(
        "{}&{}&{}",
        http_method.to_ascii_uppercase(),
        percent_encode(&normalized),
        percent_encode(&sorted_query_string(params))
    ))
}

/// Decode a base64 secret key into HMAC key bytes.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, SdkError> {
    STANDARD
        .decode(secret.trim())
        .map_err(|_| SdkError::KeySigning("secret key is not valid base64".into()))
}

/// HMAC of `text` keyed with the base64 `secret`, base64-encoded.
pub fn calc_signature(text: &str, secret: &str, algorithm: HmacAlgorithm) -> Result<String, SdkError> {
    let key = decode_secret(secret)?;
    let digest = match algorithm {
        HmacAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(&key).map_err(|_| invalid_key_length())?;
            mac.update(text.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        HmacAlgorithm::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(&key).map_err(|_| invalid_key_length())?;
            mac.update(text.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(STANDARD.encode(digest))
}

/// HMAC-SHA1 signature of an OAuth1 base string.
pub fn oauth1_signature(base_string: &str, secret: &str) -> Result<String, SdkError> {
    calc_signature(base_string, secret, HmacAlgorithm::Sha1)
}

/// Constant-time check of a base64 HMAC-SHA1 signature over `text`.
pub(crate) fn verify_signature(text: &str, secret: &str, signature: &str) -> Result<bool, SdkError> {
    let key = decode_secret(secret)?;
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return Ok(false);
    };
    let mut mac = HmacSha1::new_from_slice(&key).map_err(|_| invalid_key_length())?;
    mac.update(text.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

fn invalid_key_length() -> SdkError {
    SdkError::KeySigning("secret key has an invalid length".into())
}
