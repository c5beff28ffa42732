// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential set for a single request.

use std::fmt;

use crate::tls::MtlsConfig;

/// Identifiers and secrets available to a request.
///
/// Built once per signing attempt and never mutated while signing. Rebuild it
/// (and re-resolve the mode) when any field changes. Blank strings count as
/// absent.
#[derive(Clone, Default)]
pub struct Credentials {
    api_key: Option<String>,
    secret_key: Option<String>,
    user_key: Option<String>,
    private_key: Option<String>,
    access_token: Option<String>,
    mtls: Option<MtlsConfig>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = present(api_key.into());
        self
    }

    /// Base64-encoded shared secret.
    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = present(secret_key.into());
        self
    }

    pub fn with_user_key(mut self, user_key: impl Into<String>) -> Self {
        self.user_key = present(user_key.into());
        self
    }

    /// RSA private key, base64 PKCS#8, with or without PEM markers.
    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = present(private_key.into());
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = present(access_token.into());
        self
    }

    pub fn with_mtls(mut self, mtls: MtlsConfig) -> Self {
        self.mtls = Some(mtls);
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }

    pub fn user_key(&self) -> Option<&str> {
        self.user_key.as_deref()
    }

    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn mtls(&self) -> Option<&MtlsConfig> {
        self.mtls.as_ref()
    }

    /// Certificate chain and key both available, inline or on disk.
    pub fn has_mtls_material(&self) -> bool {
        self.mtls.as_ref().is_some_and(MtlsConfig::is_complete)
    }
}

fn present(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &redact(&self.secret_key))
            .field("user_key", &self.user_key)
            .field("private_key", &redact(&self.private_key))
            .field("access_token", &redact(&self.access_token))
            .field("mtls", &self.mtls)
            .finish()
    }
}
