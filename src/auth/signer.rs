// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request signing.
//!
//! A [`SigningStrategy`] is chosen once from the credentials and embeds the
//! mode-specific proof into the parameters, headers and TLS identity:
//!
//! | Mode | Parameters | Headers | TLS |
//! |------|------------|---------|-----|
//! | Delegated | `oauth_token` | | |
//! | Anonymous | `apiKey` | | |
//! | Basic | `apiKey`, `userKey`, `timestamp`, `nonce`, `sig` | | |
//! | Jwt | `apiKey` | `Authorization: Bearer <jwt>` | |
//! | Mtls | `apiKey` | | client certificate |

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::clock::ClockSkew;
use super::credentials::Credentials;
use super::jwt::compose_jwt;
use super::mode::{resolve, AuthMode};
use super::oauth1::{base_string, oauth1_signature};
use crate::context::SigningContext;
use crate::error::SdkError;
use crate::params::Params;
use crate::tls::{ClientIdentity, MtlsConfig};

pub const API_KEY_PARAM: &str = "apiKey";
pub const USER_KEY_PARAM: &str = "userKey";
pub const OAUTH_TOKEN_PARAM: &str = "oauth_token";
pub const TIMESTAMP_PARAM: &str = "timestamp";
pub const NONCE_PARAM: &str = "nonce";
pub const SIGNATURE_PARAM: &str = "sig";

/// Proof of authenticity produced alongside the mutated parameters.
#[derive(Debug, Clone)]
pub struct SigningResult {
    pub mode: AuthMode,
    pub headers: Vec<(String, String)>,
    pub identity: Option<Arc<ClientIdentity>>,
}

impl SigningResult {
    fn bare(mode: AuthMode) -> Self {
        Self {
            mode,
            headers: Vec::new(),
            identity: None,
        }
    }
}

/// One authentication strategy with the credentials it needs.
#[derive(Clone)]
pub enum SigningStrategy {
    Delegated {
        access_token: String,
    },
    Anonymous {
        api_key: String,
    },
    Basic {
        api_key: String,
        user_key: Option<String>,
        secret: String,
    },
    Jwt {
        api_key: String,
        user_key: String,
        private_key: String,
    },
    Mtls {
        api_key: String,
        config: MtlsConfig,
    },
}

impl SigningStrategy {
    /// Resolve the mode and capture what it needs.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self, SdkError> {
        let mode = resolve(credentials)?;
        let missing = |field: &str| SdkError::InsufficientCredentials(format!("{field} is required for {mode} mode"));
        let api_key = || credentials.api_key().map(str::to_string).ok_or_else(|| missing("apiKey"));

        let strategy = match mode {
            AuthMode::Delegated => SigningStrategy::Delegated {
                access_token: credentials
                    .access_token()
                    .map(str::to_string)
                    .ok_or_else(|| missing("accessToken"))?,
            },
            AuthMode::Anonymous => SigningStrategy::Anonymous { api_key: api_key()? },
            AuthMode::Basic => SigningStrategy::Basic {
                api_key: api_key()?,
                user_key: credentials.user_key().map(str::to_string),
                secret: credentials
                    .secret_key()
                    .map(str::to_string)
                    .ok_or_else(|| missing("secretKey"))?,
            },
            AuthMode::Jwt => SigningStrategy::Jwt {
                api_key: api_key()?,
                user_key: credentials
                    .user_key()
                    .map(str::to_string)
                    .ok_or_else(|| missing("userKey"))?,
                private_key: credentials
                    .private_key()
                    .map(str::to_string)
                    .ok_or_else(|| missing("privateKey"))?,
            },
            AuthMode::Mtls => SigningStrategy::Mtls {
                api_key: api_key()?,
                config: credentials.mtls().cloned().ok_or_else(|| missing("mTLS configuration"))?,
            },
        };
        Ok(strategy)
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            SigningStrategy::Delegated { .. } => AuthMode::Delegated,
            SigningStrategy::Anonymous { .. } => AuthMode::Anonymous,
            SigningStrategy::Basic { .. } => AuthMode::Basic,
            SigningStrategy::Jwt { .. } => AuthMode::Jwt,
            SigningStrategy::Mtls { .. } => AuthMode::Mtls,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            SigningStrategy::Delegated { .. } => None,
            SigningStrategy::Anonymous { api_key }
            | SigningStrategy::Basic { api_key, .. }
            | SigningStrategy::Jwt { api_key, .. }
            | SigningStrategy::Mtls { api_key, .. } => Some(api_key),
        }
    }

    /// Embed the proof for this mode. Basic mode timestamps are adjusted by
    /// the clock offset.
    pub fn sign(
        &self,
        params: &mut Params,
        http_method: &str,
        resource_url: &str,
        clock: &ClockSkew,
    ) -> Result<SigningResult, SdkError> {
        let mode = self.mode();
        let result = match self {
            SigningStrategy::Delegated { access_token } => {
                params.set(OAUTH_TOKEN_PARAM, access_token.as_str());
                SigningResult::bare(mode)
            }
            SigningStrategy::Anonymous { api_key } => {
                params.set(API_KEY_PARAM, api_key.as_str());
                SigningResult::bare(mode)
            }
            SigningStrategy::Basic {
                api_key,
                user_key,
                secret,
            } => {
                if !params.contains_key(OAUTH_TOKEN_PARAM) {
                    params.set(API_KEY_PARAM, api_key.as_str());
                }
                if let Some(user_key) = user_key {
                    params.set(USER_KEY_PARAM, user_key.as_str());
                }
                sign_hmac(
                    params,
                    http_method,
                    resource_url,
                    secret,
                    clock.now_secs(),
                    &generate_nonce(),
                )?;
                SigningResult::bare(mode)
            }
            SigningStrategy::Jwt {
                api_key,
                user_key,
                private_key,
            } => {
                let token = compose_jwt(user_key, private_key)?;
                params.set(API_KEY_PARAM, api_key.as_str());
                SigningResult {
                    mode,
                    headers: vec![("Authorization".to_string(), format!("Bearer {token}"))],
                    identity: None,
                }
            }
            SigningStrategy::Mtls { api_key, config } => {
                config.validate()?;
                let identity = config
                    .load()
                    .map_err(|e| SdkError::MtlsConfig(format!("client certificate unavailable: {e}")))?;
                params.set(API_KEY_PARAM, api_key.as_str());
                SigningResult {
                    mode,
                    headers: Vec::new(),
                    identity: Some(Arc::new(identity)),
                }
            }
        };
        debug!(mode = %mode, api_key = self.api_key().unwrap_or("-"), "Signed request");
        Ok(result)
    }
}

impl fmt::Debug for SigningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningStrategy")
            .field("mode", &self.mode())
            .field("api_key", &self.api_key())
            .finish_non_exhaustive()
    }
}

/// Resolve the credentials and sign in one step.
pub fn sign(
    context: &SigningContext,
    credentials: &Credentials,
    params: &mut Params,
    http_method: &str,
    resource_url: &str,
) -> Result<SigningResult, SdkError> {
    SigningStrategy::from_credentials(credentials)?.sign(params, http_method, resource_url, context.clock())
}

/// Add `timestamp`, `nonce` and `sig` for the given inputs.
///
/// Any previous `sig` is dropped first, so signing the same parameters with
/// the same timestamp and nonce always yields the same signature.
pub fn sign_hmac(
    params: &mut Params,
    http_method: &str,
    resource_url: &str,
    secret: &str,
    timestamp: i64,
    nonce: &str,
) -> Result<String, SdkError> {
    params.remove(SIGNATURE_PARAM);
    params.set(TIMESTAMP_PARAM, timestamp.to_string());
    params.set(NONCE_PARAM, nonce);

    let base = base_string(http_method, resource_url, params)?;
    let signature = oauth1_signature(&base, secret)?;
    params.set(SIGNATURE_PARAM, signature.as_str());
    Ok(signature)
}

/// `<unix millis>_<random i32>`.
///
/// Unique with high probability only: two requests in the same millisecond
/// collide if the random parts match.
pub fn generate_nonce() -> String {
    format!("{}_{}", Utc::now().timestamp_millis(), rand::random::<i32>())
}
