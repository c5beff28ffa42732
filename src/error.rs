// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Top-level SDK error.

use crate::auth::VerificationError;
use crate::params::ParamsError;
use crate::tls::TlsError;
use crate::transport::TransportError;

/// Platform error code for a request that could not be authorized locally.
pub const INSUFFICIENT_CREDENTIALS_CODE: i32 = 400002;
/// Platform error code for an invalid parameter value.
pub const INVALID_PARAMETER_CODE: i32 = 400006;
/// Platform error code for a stale timestamp/signature.
pub const SIGNATURE_EXPIRED_CODE: i32 = 403002;
/// Platform error code for a request timeout.
pub const REQUEST_TIMEOUT_CODE: i32 = 504002;
/// Platform error code for a generic failure.
pub const GENERAL_ERROR_CODE: i32 = 500000;

/// Errors surfaced by signing and sending.
///
/// Messages name the missing field, domain or file involved. They never carry
/// secret keys, private keys, passphrases or certificate bodies.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// No authentication mode can be built from the credentials.
    #[error("insufficient credentials: {0}")]
    InsufficientCredentials(String),

    /// A parameter could not be coerced to the requested type.
    #[error(transparent)]
    Format(#[from] ParamsError),

    /// The request URL cannot be parsed for signing.
    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Secret or private key unusable, or signing failed.
    #[error("key signing failed: {0}")]
    KeySigning(String),

    #[error("certificate load failed: {0}")]
    CertificateLoad(String),

    #[error("mTLS configuration error: {0}")]
    MtlsConfig(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SdkError {
    /// Numeric platform error code equivalent of this error.
    pub fn error_code(&self) -> i32 {
        match self {
            SdkError::InsufficientCredentials(_) => INSUFFICIENT_CREDENTIALS_CODE,
            SdkError::Format(_)
            | SdkError::InvalidUrl { .. }
            | SdkError::KeySigning(_)
            | SdkError::CertificateLoad(_)
            | SdkError::MtlsConfig(_) => INVALID_PARAMETER_CODE,
            SdkError::Transport(TransportError::Timeout { .. }) => REQUEST_TIMEOUT_CODE,
            SdkError::Transport(_) | SdkError::Verification(_) | SdkError::Config(_) => {
                GENERAL_ERROR_CODE
            }
        }
    }
}

impl From<TlsError> for SdkError {
    fn from(err: TlsError) -> Self {
        match err {
            TlsError::CertificateLoad(msg) => SdkError::CertificateLoad(msg),
            TlsError::MtlsConfig(msg) => SdkError::MtlsConfig(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_follow_platform_table() {
        assert_eq!(
            SdkError::InsufficientCredentials("apiKey".into()).error_code(),
            400002
        );
        assert_eq!(SdkError::KeySigning("bad key".into()).error_code(), 400006);
        assert_eq!(
            SdkError::Transport(TransportError::Timeout {
                host: "accounts.us1.gigya.com".into(),
                timeout_ms: 10,
            })
            .error_code(),
            504002
        );
        assert_eq!(SdkError::Config("x".into()).error_code(), 500000);
    }

    #[test]
    fn tls_errors_keep_their_kind() {
        let err: SdkError = TlsError::CertificateLoad("certificate missing".into()).into();
        assert!(matches!(err, SdkError::CertificateLoad(_)));
        let err: SdkError = TlsError::MtlsConfig("key missing".into()).into();
        assert!(matches!(err, SdkError::MtlsConfig(_)));
    }
}
