// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! mTLS client certificate loading.
//!
//! Certificate chain and private key come from inline PEM text or from files.
//! Inline content takes precedence when both are configured. Loading fails
//! fast when either half is unavailable; there is no anonymous fallback.
//!
//! ## Key formats
//!
//! - PKCS#8 (`PRIVATE KEY`)
//! - PKCS#1 (`RSA PRIVATE KEY`)
//! - SEC1 (`EC PRIVATE KEY`)
//! - bare base64 PKCS#8 without PEM markers
//!
//! The key is checked against the rustls ring provider so an unusable key is
//! rejected at load time, not during the handshake.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pem::Pem;
use rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Development passphrase used when none is configured. Not production-safe.
pub const DEFAULT_PASSPHRASE: &str = "changeit";

/// Certificate location used by [`MtlsConfig::from_default_location`].
pub const DEFAULT_CERT_PATH: &str = "config/mtls/client.pem";

/// Private key location used by [`MtlsConfig::from_default_location`].
pub const DEFAULT_KEY_PATH: &str = "config/mtls/client.key";

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const PKCS8_TAG: &str = "PRIVATE KEY";
const PKCS1_TAG: &str = "RSA PRIVATE KEY";
const SEC1_TAG: &str = "EC PRIVATE KEY";

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// Material missing, unreadable or unparsable.
    #[error("{0}")]
    CertificateLoad(String),

    /// Configuration incomplete.
    #[error("{0}")]
    MtlsConfig(String),
}

/// Where the client certificate and key come from.
#[derive(Clone, Default)]
pub struct MtlsConfig {
    certificate_pem: Option<String>,
    certificate_path: Option<PathBuf>,
    private_key_pem: Option<String>,
    private_key_path: Option<PathBuf>,
    passphrase: Option<String>,
}

impl MtlsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `config/mtls/client.pem` and `config/mtls/client.key`, default passphrase.
    pub fn from_default_location() -> Self {
        Self::new()
            .with_certificate_path(DEFAULT_CERT_PATH)
            .with_private_key_path(DEFAULT_KEY_PATH)
    }

    pub fn with_certificate_pem(mut self, pem: impl Into<String>) -> Self {
        self.certificate_pem = non_blank(pem.into());
        self
    }

    pub fn with_certificate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    pub fn with_private_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.private_key_pem = non_blank(pem.into());
        self
    }

    pub fn with_private_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = non_blank(passphrase.into());
        self
    }

    pub fn certificate_path(&self) -> Option<&Path> {
        self.certificate_path.as_deref()
    }

    pub fn private_key_path(&self) -> Option<&Path> {
        self.private_key_path.as_deref()
    }

    /// Bundle passphrase, falling back to [`DEFAULT_PASSPHRASE`].
    ///
    /// The passphrase is carried and its absence is warned about, but it is
    /// never applied: identities are built from unencrypted PEM, so the key
    /// material is not protected by it. An encrypted key fails to load.
    pub fn passphrase(&self) -> &str {
        self.passphrase.as_deref().unwrap_or(DEFAULT_PASSPHRASE)
    }

    pub fn uses_default_passphrase(&self) -> bool {
        self.passphrase.is_none()
    }

    /// Inline certificate, or a certificate file that exists.
    pub fn has_certificate(&self) -> bool {
        source_available(self.certificate_pem.as_deref(), self.certificate_path.as_deref())
    }

    /// Inline key, or a key file that exists.
    pub fn has_private_key(&self) -> bool {
        source_available(self.private_key_pem.as_deref(), self.private_key_path.as_deref())
    }

    /// Both halves available.
    pub fn is_complete(&self) -> bool {
        self.has_certificate() && self.has_private_key()
    }

    pub fn validate(&self) -> Result<(), TlsError> {
        if !self.has_certificate() {
            return Err(TlsError::MtlsConfig(
                "mTLS certificate missing (no PEM or existing file provided)".into(),
            ));
        }
        if !self.has_private_key() {
            return Err(TlsError::MtlsConfig(
                "mTLS private key missing (no PEM or existing file provided)".into(),
            ));
        }
        Ok(())
    }

    /// Read and parse both halves into a [`ClientIdentity`].
    pub fn load(&self) -> Result<ClientIdentity, TlsError> {
        if self.uses_default_passphrase() {
            warn!("mTLS passphrase not configured; using the development default, which is not safe for production");
        }

        let certificate = read_source(
            self.certificate_pem.as_deref(),
            self.certificate_path.as_deref(),
            "certificate",
        )?;
        let private_key = read_source(
            self.private_key_pem.as_deref(),
            self.private_key_path.as_deref(),
            "private key",
        )?;

        let identity = ClientIdentity::from_pem(&certificate, &private_key)?;
        debug!(
            chain_len = identity.certificate_chain().len(),
            fingerprint = %identity.fingerprint(),
            "Loaded mTLS client identity"
        );
        Ok(identity)
    }
}

impl fmt::Debug for MtlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MtlsConfig")
            .field("certificate_pem", &self.certificate_pem.as_ref().map(|_| "<inline>"))
            .field("certificate_path", &self.certificate_path)
            .field("private_key_pem", &self.private_key_pem.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Parsed client certificate chain (leaf first) and private key.
#[derive(Clone)]
pub struct ClientIdentity {
    chain: Vec<CertificateDer<'static>>,
    key: Arc<PrivateKeyDer<'static>>,
    fingerprint: String,
}

impl ClientIdentity {
    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> Result<Self, TlsError> {
        let chain = parse_certificate_chain(certificate_pem)?;
        let key = parse_private_key(private_key_pem)?;

        rustls::crypto::ring::sign::any_supported_type(&key).map_err(|_| {
            TlsError::CertificateLoad("private key is not a supported signing key".into())
        })?;

        let fingerprint = chain
            .first()
            .map(|leaf| hex_digest(leaf.as_ref()))
            .unwrap_or_default();

        Ok(Self {
            chain,
            key: Arc::new(key),
            fingerprint,
        })
    }

    pub fn certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    pub fn private_key(&self) -> &PrivateKeyDer<'static> {
        &self.key
    }

    /// SHA-256 of the leaf certificate DER, lower-case hex.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Key followed by the chain as one PEM document.
    pub fn to_pem(&self) -> String {
        let (tag, der) = match self.key.as_ref() {
            PrivateKeyDer::Pkcs1(k) => (PKCS1_TAG, k.secret_pkcs1_der()),
            PrivateKeyDer::Sec1(k) => (SEC1_TAG, k.secret_sec1_der()),
            other => (PKCS8_TAG, other.secret_der()),
        };
        let mut blocks = vec![Pem::new(tag, der.to_vec())];
        blocks.extend(
            self.chain
                .iter()
                .map(|cert| Pem::new(CERTIFICATE_TAG, cert.as_ref().to_vec())),
        );
        pem::encode_many(&blocks)
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("chain_len", &self.chain.len())
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn source_available(inline: Option<&str>, path: Option<&Path>) -> bool {
    inline.is_some() || path.is_some_and(Path::exists)
}

fn read_source(inline: Option<&str>, path: Option<&Path>, what: &str) -> Result<String, TlsError> {
    if let Some(pem) = inline {
        return Ok(pem.replace("\\n", "\n"));
    }
    match path {
        Some(path) if path.exists() => fs::read_to_string(path).map_err(|e| {
            TlsError::CertificateLoad(format!("failed to read {what} file {}: {e}", path.display()))
        }),
        Some(path) => Err(TlsError::CertificateLoad(format!(
            "{what} file {} not found and no inline PEM provided",
            path.display()
        ))),
        None => Err(TlsError::CertificateLoad(format!(
            "{what} PEM not provided and no file configured"
        ))),
    }
}

fn parse_certificate_chain(text: &str) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let blocks = pem::parse_many(text)
        .map_err(|e| TlsError::CertificateLoad(format!("certificate PEM is invalid: {e}")))?;
    let chain: Vec<_> = blocks
        .into_iter()
        .filter(|block| block.tag() == CERTIFICATE_TAG)
        .map(|block| CertificateDer::from(block.into_contents()))
        .collect();
    if chain.is_empty() {
        return Err(TlsError::CertificateLoad(
            "no CERTIFICATE block found in certificate PEM".into(),
        ));
    }
    Ok(chain)
}

fn parse_private_key(text: &str) -> Result<PrivateKeyDer<'static>, TlsError> {
    let invalid = || TlsError::CertificateLoad("private key PEM is invalid".into());

    if text.contains("-----BEGIN") {
        let blocks = pem::parse_many(text).map_err(|_| invalid())?;
        for block in blocks {
            let tag = block.tag().to_owned();
            let der = block.into_contents();
            let key = match tag.as_str() {
                PKCS8_TAG => PrivateKeyDer::from(PrivatePkcs8KeyDer::from(der)),
                PKCS1_TAG => PrivateKeyDer::from(PrivatePkcs1KeyDer::from(der)),
                SEC1_TAG => PrivateKeyDer::from(PrivateSec1KeyDer::from(der)),
                _ => continue,
            };
            return Ok(key);
        }
        return Err(TlsError::CertificateLoad(
            "no private key block found in key PEM".into(),
        ));
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let der = STANDARD.decode(compact).map_err(|_| invalid())?;
    Ok(PrivateKeyDer::from(PrivatePkcs8KeyDer::from(der)))
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
