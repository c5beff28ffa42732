// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public keys for token verification, cached per data center.
//!
//! ## Cache semantics
//!
//! - Keyed by the lower-cased serving domain; one key per domain
//! - Entries are written only after a fetched key parses successfully
//! - No TTL: callers evict a domain (or everything) when a key rotates
//! - Concurrent fetches of the same key may both insert; last write wins

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::VerificationError;
use crate::params::ParamValue;

/// RSA public key in JWK terms (base64url modulus and exponent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub kid: String,
    pub n: String,
    pub e: String,
}

impl PublicKey {
    pub fn new(kid: impl Into<String>, n: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            kid: kid.into(),
            n: n.into(),
            e: e.into(),
        }
    }

    /// Convert an RSA JWK. Keys without a kid or of another family are rejected.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, VerificationError> {
        let kid = jwk.common.key_id.clone().unwrap_or_default();
        match &jwk.algorithm {
            AlgorithmParameters::RSA(rsa) if !kid.is_empty() => {
                Ok(Self::new(kid, rsa.n.clone(), rsa.e.clone()))
            }
            AlgorithmParameters::RSA(_) => Err(VerificationError::InvalidPublicKey {
                kid,
                message: "JWK has no kid".into(),
            }),
            _ => Err(VerificationError::InvalidPublicKey {
                kid,
                message: "JWK is not an RSA key".into(),
            }),
        }
    }

    pub fn decoding_key(&self) -> Result<DecodingKey, VerificationError> {
        DecodingKey::from_rsa_components(&self.n, &self.e).map_err(|e| {
            VerificationError::InvalidPublicKey {
                kid: self.kid.clone(),
                message: e.to_string(),
            }
        })
    }

    pub fn to_jwk_json(&self) -> Value {
        json!({
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "kid": self.kid,
            "n": self.n,
            "e": self.e,
        })
    }
}

/// Find the key with `kid` in a `keys` array from the public-key endpoint.
///
/// Entries that are not valid RSA JWKs are skipped.
pub fn find_key(keys: &[ParamValue], kid: &str) -> Option<PublicKey> {
    keys.iter()
        .filter_map(|entry| match entry {
            ParamValue::Object(params) => {
                serde_json::from_value::<Jwk>(params.to_json_value()).ok()
            }
            _ => None,
        })
        .filter(|jwk| jwk.common.key_id.as_deref() == Some(kid))
        .find_map(|jwk| PublicKey::from_jwk(&jwk).ok())
}

/// Process-wide map from serving domain to its current public key.
#[derive(Debug, Default)]
pub struct PublicKeyCache {
    entries: RwLock<HashMap<String, PublicKey>>,
}

impl PublicKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: &str) -> Option<PublicKey> {
        let key = domain.to_lowercase();
        self.read().get(&key).cloned()
    }

    /// Insert or replace the key for a domain (also used to pre-seed).
    pub fn insert(&self, domain: &str, public_key: PublicKey) {
        let key = domain.to_lowercase();
        self.write().insert(key, public_key);
    }

    /// Remove one domain's key.
    pub fn evict(&self, domain: &str) -> Option<PublicKey> {
        let key = domain.to_lowercase();
        self.write().remove(&key)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every write is a single map operation, so a poisoned map is still
    // consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, PublicKey>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, PublicKey>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;
    use crate::testutil::{jwks_body, public_key_a, public_key_b};

    #[test]
    fn domain_keys_are_case_insensitive() {
        let cache = PublicKeyCache::new();
        cache.insert("US1.Gigya.com", public_key_a());
        assert_eq!(cache.get("us1.gigya.com"), Some(public_key_a()));
    }

    #[test]
    fn poisoned_lock_keeps_working() {
        let cache = PublicKeyCache::new();
        cache.insert("us1.gigya.com", public_key_a());

        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                let _guard = cache.entries.write().unwrap();
                panic!("writer died holding the lock");
            });
            assert!(handle.join().is_err());
        });
        assert!(cache.entries.is_poisoned());

        cache.insert("eu1.gigya.com", public_key_b());
        assert_eq!(cache.get("us1.gigya.com"), Some(public_key_a()));
        assert_eq!(cache.get("eu1.gigya.com"), Some(public_key_b()));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.evict("eu1.gigya.com"), Some(public_key_b()));
    }

    #[test]
    fn evict_removes_only_that_domain() {
        let cache = PublicKeyCache::new();
        cache.insert("us1.gigya.com", public_key_a());
        cache.insert("eu1.gigya.com", public_key_b());

        assert_eq!(cache.evict("US1.GIGYA.COM"), Some(public_key_a()));
        assert!(cache.get("us1.gigya.com").is_none());
        assert_eq!(cache.get("eu1.gigya.com"), Some(public_key_b()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_everything() {
        let cache = PublicKeyCache::new();
        cache.insert("us1.gigya.com", public_key_a());
        cache.insert("eu1.gigya.com", public_key_b());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn find_key_matches_kid_and_skips_junk() {
        let data = Params::from_json(&jwks_body(&[public_key_b(), public_key_a()])).unwrap();
        let mut keys = data.get_array("keys").unwrap().unwrap().to_vec();
        keys.insert(0, ParamValue::String("junk".into()));
        keys.insert(1, ParamValue::Object(Params::new().with("kid", "key-a")));

        assert_eq!(find_key(&keys, "key-a"), Some(public_key_a()));
        assert_eq!(find_key(&keys, "key-c"), None);
    }

    #[test]
    fn decoding_key_builds_from_components() {
        assert!(public_key_a().decoding_key().is_ok());
    }

    #[test]
    fn bad_modulus_is_invalid_public_key() {
        let key = PublicKey::new("k", "***", "AQAB");
        assert!(matches!(
            key.decoding_key(),
            Err(VerificationError::InvalidPublicKey { .. })
        ));
    }
}
