// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Credentials and data center are read from the environment, then from an
//! optional properties file, then defaults. Blank values count as absent.
//!
//! ## Environment Variables
//!
//! | Variable | Property key | Description | Default |
//! |----------|--------------|-------------|---------|
//! | `GIGYA_API_KEY` | `gigya.api.key` | Site API key | - |
//! | `GIGYA_SECRET_KEY` | `gigya.secret.key` | Base64 HMAC secret | - |
//! | `GIGYA_USER_KEY` | `gigya.user.key` | Application user key | - |
//! | `GIGYA_PRIVATE_KEY` | `gigya.private.key` | RSA private key (PEM or bare base64) | - |
//! | `GIGYA_ACCESS_TOKEN` | `gigya.access.token` | OAuth access token | - |
//! | `GIGYA_API_DOMAIN` | `gigya.api.domain` | Data center | `us1.gigya.com` |
//! | `GIGYA_MTLS_CERT_PATH` | `gigya.mtls.cert.path` | Client certificate file | - |
//! | `GIGYA_MTLS_KEY_PATH` | `gigya.mtls.key.path` | Client key file | - |
//! | `GIGYA_MTLS_CERT_PEM` | `gigya.mtls.cert.pem` | Inline certificate, wins over the path | - |
//! | `GIGYA_MTLS_KEY_PEM` | `gigya.mtls.key.pem` | Inline key, wins over the path | - |
//! | `GIGYA_MTLS_PASSWORD` | `gigya.mtls.password` | Bundle passphrase | `changeit` (warned) |
//! | `LOG_FORMAT` | - | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | - | Log level filter | `info` |
//!
//! Inline PEM values may use literal `\n` escapes in place of newlines.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::auth::Credentials;
use crate::client::DEFAULT_API_DOMAIN;
use crate::error::SdkError;
use crate::tls::MtlsConfig;

pub const API_KEY_ENV: &str = "GIGYA_API_KEY";
pub const SECRET_KEY_ENV: &str = "GIGYA_SECRET_KEY";
pub const USER_KEY_ENV: &str = "GIGYA_USER_KEY";
pub const PRIVATE_KEY_ENV: &str = "GIGYA_PRIVATE_KEY";
pub const ACCESS_TOKEN_ENV: &str = "GIGYA_ACCESS_TOKEN";
pub const API_DOMAIN_ENV: &str = "GIGYA_API_DOMAIN";
pub const MTLS_CERT_PATH_ENV: &str = "GIGYA_MTLS_CERT_PATH";
pub const MTLS_KEY_PATH_ENV: &str = "GIGYA_MTLS_KEY_PATH";
pub const MTLS_CERT_PEM_ENV: &str = "GIGYA_MTLS_CERT_PEM";
pub const MTLS_KEY_PEM_ENV: &str = "GIGYA_MTLS_KEY_PEM";

/// Passphrase of the client certificate bundle.
///
/// # Default
/// `changeit`. Loading with the default logs a warning.
pub const MTLS_PASSWORD_ENV: &str = "GIGYA_MTLS_PASSWORD";

/// Logging format, `json` or `pretty`.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Standard tracing filter.
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Each setting as (environment variable, properties key).
const SETTINGS: [(&str, &str); 11] = [
    (API_KEY_ENV, "gigya.api.key"),
    (SECRET_KEY_ENV, "gigya.secret.key"),
    (USER_KEY_ENV, "gigya.user.key"),
    (PRIVATE_KEY_ENV, "gigya.private.key"),
    (ACCESS_TOKEN_ENV, "gigya.access.token"),
    (API_DOMAIN_ENV, "gigya.api.domain"),
    (MTLS_CERT_PATH_ENV, "gigya.mtls.cert.path"),
    (MTLS_KEY_PATH_ENV, "gigya.mtls.key.path"),
    (MTLS_CERT_PEM_ENV, "gigya.mtls.cert.pem"),
    (MTLS_KEY_PEM_ENV, "gigya.mtls.key.pem"),
    (MTLS_PASSWORD_ENV, "gigya.mtls.password"),
];

/// `key=value` (or `key: value`) lines; `#` and `!` start comments.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
            .filter_map(|line| {
                let split = line.find(['=', ':'])?;
                let key = line[..split].trim();
                let value = line[split + 1..].trim();
                (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
            })
            .collect();
        Self { entries }
    }

    pub fn from_file(path: &Path) -> Result<Self, SdkError> {
        let text = fs::read_to_string(path).map_err(|e| {
            SdkError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let properties = Self::parse(&text);
        debug!(path = %path.display(), entries = properties.entries.len(), "Loaded properties file");
        Ok(properties)
    }

    /// Non-blank value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Resolved SDK settings.
#[derive(Clone, Default)]
pub struct SdkConfig {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub user_key: Option<String>,
    pub private_key: Option<String>,
    pub access_token: Option<String>,
    pub api_domain: String,
    pub mtls_cert_path: Option<String>,
    pub mtls_key_path: Option<String>,
    pub mtls_cert_pem: Option<String>,
    pub mtls_key_pem: Option<String>,
    pub mtls_password: Option<String>,
}

impl SdkConfig {
    /// Environment only.
    pub fn from_env() -> Self {
        Self::resolve(env_optional, &Properties::default())
    }

    /// Environment first, then the properties file if one is given.
    pub fn load(properties_path: Option<&Path>) -> Result<Self, SdkError> {
        let properties = match properties_path {
            Some(path) => Properties::from_file(path)?,
            None => Properties::default(),
        };
        Ok(Self::resolve(env_optional, &properties))
    }

    /// Resolve every setting from `env`, then `properties`.
    pub fn resolve(env: impl Fn(&str) -> Option<String>, properties: &Properties) -> Self {
        let mut values: HashMap<&str, String> = SETTINGS
            .iter()
            .filter_map(|(env_name, property)| {
                env(env_name)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .or_else(|| properties.get(property).map(str::to_string))
                    .map(|value| (*env_name, value))
            })
            .collect();

        let mut take = |name: &str| values.remove(name);
        let pem = |value: Option<String>| value.map(|v| v.replace("\\n", "\n"));

        Self {
            api_key: take(API_KEY_ENV),
            secret_key: take(SECRET_KEY_ENV),
            user_key: take(USER_KEY_ENV),
            private_key: pem(take(PRIVATE_KEY_ENV)),
            access_token: take(ACCESS_TOKEN_ENV),
            api_domain: take(API_DOMAIN_ENV).unwrap_or_else(|| DEFAULT_API_DOMAIN.to_string()),
            mtls_cert_path: take(MTLS_CERT_PATH_ENV),
            mtls_key_path: take(MTLS_KEY_PATH_ENV),
            mtls_cert_pem: pem(take(MTLS_CERT_PEM_ENV)),
            mtls_key_pem: pem(take(MTLS_KEY_PEM_ENV)),
            mtls_password: take(MTLS_PASSWORD_ENV),
        }
    }

    /// Any certificate or key source configured.
    pub fn has_mtls_config(&self) -> bool {
        self.mtls_cert_path.is_some()
            || self.mtls_key_path.is_some()
            || self.mtls_cert_pem.is_some()
            || self.mtls_key_pem.is_some()
    }

    pub fn mtls_config(&self) -> Option<MtlsConfig> {
        if !self.has_mtls_config() {
            return None;
        }
        let mut config = MtlsConfig::new();
        if let Some(path) = &self.mtls_cert_path {
            config = config.with_certificate_path(path);
        }
        if let Some(path) = &self.mtls_key_path {
            config = config.with_private_key_path(path);
        }
        if let Some(pem) = &self.mtls_cert_pem {
            config = config.with_certificate_pem(pem.as_str());
        }
        if let Some(pem) = &self.mtls_key_pem {
            config = config.with_private_key_pem(pem.as_str());
        }
        if let Some(password) = &self.mtls_password {
            config = config.with_passphrase(password.as_str());
        }
        Some(config)
    }

    pub fn credentials(&self) -> Credentials {
        let mut credentials = Credentials::new();
        if let Some(v) = &self.api_key {
            credentials = credentials.with_api_key(v.as_str());
        }
        if let Some(v) = &self.secret_key {
            credentials = credentials.with_secret_key(v.as_str());
        }
        if let Some(v) = &self.user_key {
            credentials = credentials.with_user_key(v.as_str());
        }
        if let Some(v) = &self.private_key {
            credentials = credentials.with_private_key(v.as_str());
        }
        if let Some(v) = &self.access_token {
            credentials = credentials.with_access_token(v.as_str());
        }
        if let Some(mtls) = self.mtls_config() {
            credentials = credentials.with_mtls(mtls);
        }
        credentials
    }
}

impl std::fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("SdkConfig")
            .field("api_key", &self.api_key)
            .field("secret_key", &redact(&self.secret_key))
            .field("user_key", &self.user_key)
            .field("private_key", &redact(&self.private_key))
            .field("access_token", &redact(&self.access_token))
            .field("api_domain", &self.api_domain)
            .field("mtls_cert_path", &self.mtls_cert_path)
            .field("mtls_key_path", &self.mtls_key_path)
            .field("mtls_cert_pem", &self.mtls_cert_pem.as_ref().map(|_| "<inline>"))
            .field("mtls_key_pem", &redact(&self.mtls_key_pem))
            .field("mtls_password", &redact(&self.mtls_password))
            .finish()
    }
}

fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}
