// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RS256 request-authorization tokens.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use pem::Pem;
use uuid::Uuid;

use super::claims::RequestClaims;
use crate::error::SdkError;

const PKCS1_MARKER: &str = "RSA PRIVATE KEY";

/// Compose a token with header `{alg: RS256, typ: JWT, kid: user_key}` and
/// claims `{jti, iat}`, signed with the user's RSA private key.
pub fn compose_jwt(user_key: &str, private_key: &str) -> Result<String, SdkError> {
    let key = encoding_key(private_key)?;

    let mut header = Header::new(Algorithm::RS256);
    header.typ = Some("JWT".to_string());
    header.kid = Some(user_key.to_string());

    let claims = RequestClaims {
        jti: Uuid::new_v4().to_string(),
        iat: Utc::now().timestamp(),
    };

    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| SdkError::KeySigning(format!("RS256 signing failed: {e}")))
}

/// Parse a base64 RSA private key, PKCS#8 or PKCS#1, with or without PEM
/// markers and line breaks.
pub fn encoding_key(private_key: &str) -> Result<EncodingKey, SdkError> {
    let is_pkcs1 = private_key.contains(PKCS1_MARKER);
    let der = decode_key_body(private_key)?;

    let parsed = if is_pkcs1 {
        Ok(EncodingKey::from_rsa_der(&der))
    } else {
        let wrapped = pem::encode(&Pem::new("PRIVATE KEY", der));
        EncodingKey::from_rsa_pem(wrapped.as_bytes())
    };
    parsed.map_err(|_| SdkError::KeySigning("private key is not a valid RSA key".into()))
}

fn decode_key_body(raw: &str) -> Result<Vec<u8>, SdkError> {
    let body: String = raw
        .replace("\\n", "\n")
        .replace("\\r", "")
        .lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect();
    if body.is_empty() {
        return Err(SdkError::KeySigning("private key is empty".into()));
    }
    STANDARD
        .decode(body)
        .map_err(|_| SdkError::KeySigning("private key is not valid base64".into()))
}
