// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gigya SDK - signed API calls and token verification
//!
//! Resolves an authentication mode from the credentials at hand, signs
//! requests for it, and verifies platform-issued RS256 tokens against a
//! cached public key.
//!
//! ## Modules
//!
//! - `params` - ordered, typed request parameters
//! - `auth` - credentials, mode resolution, signing and verification
//! - `tls` - mTLS client certificate loading
//! - `client` - routing, sending and the stale-signature retry
//! - `transport` - HTTP transport (reqwest over rustls)
//! - `config` - environment and properties-file configuration

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod params;
pub mod response;
pub mod tls;
pub mod transport;

#[cfg(test)]
mod testutil;

pub use auth::{AuthMode, Credentials, SigningStrategy, VerificationError};
pub use client::ApiClient;
pub use context::SigningContext;
pub use error::SdkError;
pub use params::{ParamValue, Params};
pub use response::ApiResponse;
