// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification of platform-issued RS256 tokens.
//!
//! ## Flow
//!
//! 1. Read `kid` from the token header
//! 2. Take the domain's key from the cache, or fetch it anonymously from
//!    `accounts.getJWTPublicKey` and cache it once it parses
//! 3. Check the signature, then issuer, `iat`, `exp` and `sub`
//!
//! A cached key whose kid differs from the token's is reported as
//! [`VerificationError::KeyNotFound`] without refetching. Callers that see a
//! key problem evict the domain and try again.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use tracing::{debug, info, warn};

use super::claims::IssuedClaims;
use super::credentials::Credentials;
use super::error::VerificationError;
use super::jwks::{find_key, PublicKey};
use crate::client::ApiClient;
use crate::context::SigningContext;
use crate::params::Params;
use crate::transport::Transport;

/// Tolerance applied after `exp`, in seconds.
pub const EXPIRY_GRACE_SECS: i64 = 120;

/// API method serving the data center's public key.
pub const PUBLIC_KEY_METHOD: &str = "accounts.getJWTPublicKey";

/// Issuer expected in tokens for an API key on a data center.
///
/// The domain is lower-cased, matching the key cache.
pub fn expected_issuer(domain: &str, api_key: &str) -> String {
    format!("https://fidm.{}/jwt/{api_key}", domain.to_ascii_lowercase())
}

/// Verifies tokens using a signing context's key cache.
pub struct TokenVerifier<T: Transport> {
    context: Arc<SigningContext>,
    transport: Arc<T>,
}

impl<T: Transport> TokenVerifier<T> {
    pub fn new(context: Arc<SigningContext>, transport: Arc<T>) -> Self {
        Self { context, transport }
    }

    /// Verify `token` and return its subject (the user's UID).
    pub async fn verify(
        &self,
        token: &str,
        api_key: &str,
        domain: &str,
    ) -> Result<String, VerificationError> {
        let domain = domain.to_ascii_lowercase();
        let domain = domain.as_str();
        let kid = token_kid(token)?;
        let key = self.resolve_key(&kid, api_key, domain).await?;
        let result = verify_with_key(token, &key, api_key, domain, Utc::now().timestamp());

        match &result {
            Ok(uid) => debug!(kid = %kid, domain, uid = %uid, "Token verified"),
            Err(e) => info!(kid = %kid, domain, error = e.error_code(), "Token rejected"),
        }
        result
    }

    async fn resolve_key(
        &self,
        kid: &str,
        api_key: &str,
        domain: &str,
    ) -> Result<PublicKey, VerificationError> {
        if let Some(cached) = self.context.keys().get(domain) {
            if cached.kid == kid {
                debug!(kid, domain, "Public key cache hit");
                return Ok(cached);
            }
            debug!(kid, cached_kid = %cached.kid, domain, "Cached public key has another kid");
            return Err(VerificationError::KeyNotFound {
                kid: kid.to_string(),
                domain: domain.to_string(),
            });
        }

        let key = self.fetch_key(kid, api_key, domain).await?;
        key.decoding_key()?;
        self.context.keys().insert(domain, key.clone());
        info!(kid, domain, "Cached public key");
        Ok(key)
    }

    async fn fetch_key(
        &self,
        kid: &str,
        api_key: &str,
        domain: &str,
    ) -> Result<PublicKey, VerificationError> {
        let fetch_error = |message: String| VerificationError::KeyFetch {
            domain: domain.to_string(),
            message,
        };
        let not_found = || VerificationError::KeyNotFound {
            kid: kid.to_string(),
            domain: domain.to_string(),
        };

        let credentials = Credentials::new().with_api_key(api_key);
        let client = ApiClient::with_transport(
            &credentials,
            domain,
            self.transport.clone(),
            self.context.clone(),
        )
        .map_err(|e| fetch_error(e.to_string()))?;

        let response = client
            .send(PUBLIC_KEY_METHOD, Params::new().with("V2", true))
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.is_success() {
            warn!(
                domain,
                error_code = response.error_code,
                "Public key request returned an error"
            );
            return Err(not_found());
        }

        let keys = response
            .data
            .get_array("keys")
            .ok()
            .flatten()
            .ok_or_else(not_found)?;
        find_key(keys, kid).ok_or_else(not_found)
    }
}

/// Read the `kid` from a token header.
pub fn token_kid(token: &str) -> Result<String, VerificationError> {
    let header = decode_header(token)
        .map_err(|e| VerificationError::MalformedToken(format!("bad header: {e}")))?;
    header
        .kid
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| VerificationError::MalformedToken("header has no kid".into()))
}

/// Check a token against a known key at time `now` (UTC seconds).
pub fn verify_with_key(
    token: &str,
    key: &PublicKey,
    api_key: &str,
    domain: &str,
    now: i64,
) -> Result<String, VerificationError> {
    let decoding_key = key.decoding_key()?;

    // Time claims are checked below with our own grace window.
    let mut validation = Validation::new(Algorithm::RS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;

    let claims = decode::<IssuedClaims>(token, &decoding_key, &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => VerificationError::SignatureInvalid,
            ErrorKind::InvalidAlgorithm => {
                VerificationError::MalformedToken("token is not RS256".into())
            }
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                VerificationError::InvalidPublicKey {
                    kid: key.kid.clone(),
                    message: e.to_string(),
                }
            }
            _ => VerificationError::MalformedToken(e.to_string()),
        })?
        .claims;

    if let Some(issuer) = claims.iss {
        let expected = expected_issuer(domain, api_key);
        if issuer != expected {
            return Err(VerificationError::IssuerMismatch {
                expected,
                found: issuer,
            });
        }
    }

    let (Some(iat), Some(exp)) = (claims.iat, claims.exp) else {
        return Err(VerificationError::MalformedToken(
            "token must carry iat and exp".into(),
        ));
    };
    if now < iat {
        return Err(VerificationError::TokenNotYetValid);
    }
    if now > exp.saturating_add(EXPIRY_GRACE_SECS) {
        return Err(VerificationError::TokenExpired);
    }

    claims
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or(VerificationError::MissingSubject)
}
