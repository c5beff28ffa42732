// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification errors.

/// Outcome of a failed token verification.
///
/// These are expected results (a rotated key, an expired token) rather than
/// infrastructure failures. `KeyFetch` is the one variant that means the
/// public-key endpoint itself could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Token header or claims could not be decoded
    #[error("token is malformed: {0}")]
    MalformedToken(String),

    /// No public key with this kid for the domain
    #[error("no public key with kid '{kid}' for domain '{domain}'")]
    KeyNotFound { kid: String, domain: String },

    /// Public-key endpoint unreachable
    #[error("failed to fetch public keys for domain '{domain}': {message}")]
    KeyFetch { domain: String, message: String },

    /// The fetched or cached key could not be turned into an RSA key
    #[error("public key '{kid}' is invalid: {message}")]
    InvalidPublicKey { kid: String, message: String },

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token issuer '{found}' does not match '{expected}'")]
    IssuerMismatch { expected: String, found: String },

    #[error("token has expired")]
    TokenExpired,

    #[error("token is not yet valid")]
    TokenNotYetValid,

    #[error("token has no subject")]
    MissingSubject,
}

impl VerificationError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            VerificationError::MalformedToken(_) => "malformed_token",
            VerificationError::KeyNotFound { .. } => "key_not_found",
            VerificationError::KeyFetch { .. } => "key_fetch_error",
            VerificationError::InvalidPublicKey { .. } => "invalid_public_key",
            VerificationError::SignatureInvalid => "signature_invalid",
            VerificationError::IssuerMismatch { .. } => "issuer_mismatch",
            VerificationError::TokenExpired => "token_expired",
            VerificationError::TokenNotYetValid => "token_not_yet_valid",
            VerificationError::MissingSubject => "missing_subject",
        }
    }

    /// True when the caller's public-key cache entry may be stale.
    pub fn is_key_problem(&self) -> bool {
        matches!(
            self,
            VerificationError::KeyNotFound { .. }
                | VerificationError::InvalidPublicKey { .. }
                | VerificationError::SignatureInvalid
        )
    }
}
