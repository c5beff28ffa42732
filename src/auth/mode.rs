// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication mode resolution.
//!
//! ## Precedence (highest first)
//!
//! 1. access token: [`AuthMode::Delegated`]
//! 2. mTLS chain + key and API key: [`AuthMode::Mtls`]
//! 3. user key, private key and API key: [`AuthMode::Jwt`]
//! 4. API key and secret: [`AuthMode::Basic`]
//! 5. API key alone: [`AuthMode::Anonymous`]
//!
//! Anything else is [`SdkError::InsufficientCredentials`]. There is no
//! silent anonymous fallback without an API key.

use std::fmt;

use super::Credentials;
use crate::error::SdkError;

/// How a request proves its authenticity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMode {
    /// Caller-supplied bearer access token (`oauth_token`)
    Delegated,
    /// API key only
    Anonymous,
    /// OAuth1-style HMAC-SHA1 over the parameters
    Basic,
    /// RS256 bearer token signed with the user's private key
    Jwt,
    /// TLS client certificate
    Mtls,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Delegated => "delegated",
            AuthMode::Anonymous => "anonymous",
            AuthMode::Basic => "basic",
            AuthMode::Jwt => "jwt",
            AuthMode::Mtls => "mtls",
        }
    }

    /// Modes whose proof must travel over TLS.
    pub fn requires_https(&self) -> bool {
        matches!(self, AuthMode::Delegated | AuthMode::Jwt | AuthMode::Mtls)
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick exactly one mode for the credentials.
pub fn resolve(credentials: &Credentials) -> Result<AuthMode, SdkError> {
    let api_key = credentials.api_key().is_some();

    if credentials.access_token().is_some() {
        return Ok(AuthMode::Delegated);
    }
    if api_key && credentials.has_mtls_material() {
        return Ok(AuthMode::Mtls);
    }
    if api_key && credentials.user_key().is_some() && credentials.private_key().is_some() {
        return Ok(AuthMode::Jwt);
    }
    if api_key && credentials.secret_key().is_some() {
        return Ok(AuthMode::Basic);
    }
    if api_key {
        return Ok(AuthMode::Anonymous);
    }
    Err(SdkError::InsufficientCredentials(
        "apiKey is required unless an access token is provided".into(),
    ))
}
