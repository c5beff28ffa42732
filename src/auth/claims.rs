// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims.

use serde::{Deserialize, Serialize};

/// Claims of a request-authorization token composed by this SDK.
///
/// No `exp`: the receiving side applies its own expiry policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestClaims {
    /// Unique token id
    pub jti: String,

    /// Issued at (UTC seconds)
    pub iat: i64,
}

/// Claims of a token issued by the platform (id tokens).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuedClaims {
    /// Subject: the user's UID
    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub iss: Option<String>,

    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(default)]
    pub exp: Option<i64>,

    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}
