// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Credential handling, request signing and token verification.
//!
//! ## Modes
//!
//! The mode is resolved from whichever credentials are present, in this
//! order of precedence:
//!
//! 1. `Delegated` - an OAuth access token is sent as `oauth_token`
//! 2. `Mtls` - API key plus a client certificate and key; TLS identity
//! 3. `Jwt` - API key, user key and RSA private key; RS256 bearer token
//! 4. `Basic` - API key and secret; HMAC-SHA1 OAuth1-style `sig`
//! 5. `Anonymous` - API key only
//!
//! ## Security
//!
//! - Secrets, private keys and tokens never appear in `Debug` output,
//!   error messages or logs
//! - Timestamps are corrected by the offset learned from server `Date`
//!   headers
//! - Issued tokens get a 120 second grace window after `exp`

pub mod claims;
pub mod clock;
pub mod credentials;
pub mod error;
pub mod jwks;
pub mod jwt;
pub mod mode;
pub mod oauth1;
pub mod signature;
pub mod signer;
pub mod verifier;

pub use clock::ClockSkew;
pub use credentials::Credentials;
pub use error::VerificationError;
pub use jwks::{PublicKey, PublicKeyCache};
pub use mode::{resolve, AuthMode};
pub use signer::{sign, SigningResult, SigningStrategy};
pub use verifier::{TokenVerifier, EXPIRY_GRACE_SECS};
