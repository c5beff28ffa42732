// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared signing state.

use std::sync::Arc;

use crate::auth::{ClockSkew, PublicKeyCache};

/// State shared by every request made through one SDK instance: the server
/// clock offset and the public-key cache.
///
/// Owned by the caller and passed to signers and verifiers explicitly, so
/// separate instances (and tests) never see each other's state.
#[derive(Debug, Default)]
pub struct SigningContext {
    clock: ClockSkew,
    keys: PublicKeyCache,
}

impl SigningContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for the common `Arc`-shared case.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn clock(&self) -> &ClockSkew {
        &self.clock
    }

    pub fn keys(&self) -> &PublicKeyCache {
        &self.keys
    }
}
