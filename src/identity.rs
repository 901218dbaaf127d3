//! Player identity verification
//!
//! Verification is an opaque external service. The game only reads a
//! verified flag and whether a check is in flight; it never blocks on one.
//! `SimulatedVerifier` stands in for the real provider: a fixed delay,
//! then success, with the flag persisted so it survives reloads.

use serde::{Deserialize, Serialize};

use crate::error::ExternalServiceError;

/// Coarse verification status visible to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[default]
    Unverified,
    /// Check in flight since the given clock (ms)
    Verifying {
        since_ms: u64,
    },
    Verified,
}

impl VerificationStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }

    pub fn is_verifying(&self) -> bool {
        matches!(self, VerificationStatus::Verifying { .. })
    }
}

/// A verification provider polled from the game loop
pub trait Verifier {
    fn status(&self) -> VerificationStatus;

    /// Kick off a check; returns immediately
    fn begin(&mut self, now_ms: u64) -> Result<(), ExternalServiceError>;

    /// Advance any in-flight check and report the current status
    fn poll(&mut self, now_ms: u64) -> VerificationStatus;

    /// Forget the verification (and its persisted flag)
    fn reset(&mut self);

    fn is_verified(&self) -> bool {
        self.status().is_verified()
    }
}

/// Where the verified flag is persisted
pub trait FlagStore {
    fn load(&self) -> bool;
    fn store(&mut self, verified: bool) -> Result<(), ExternalServiceError>;
}

/// In-memory flag (native, tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryFlagStore {
    pub verified: bool,
}

impl FlagStore for MemoryFlagStore {
    fn load(&self) -> bool {
        self.verified
    }

    fn store(&mut self, verified: bool) -> Result<(), ExternalServiceError> {
        self.verified = verified;
        Ok(())
    }
}

/// LocalStorage-backed flag (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageFlagStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageFlagStore {
    const STORAGE_KEY: &'static str = "civic_verified";

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl FlagStore for LocalStorageFlagStore {
    fn load(&self) -> bool {
        Self::storage()
            .and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten())
            .is_some_and(|v| v == "true")
    }

    fn store(&mut self, verified: bool) -> Result<(), ExternalServiceError> {
        let storage = Self::storage()
            .ok_or_else(|| ExternalServiceError::Storage("LocalStorage unavailable".into()))?;
        let result = if verified {
            storage.set_item(Self::STORAGE_KEY, "true")
        } else {
            storage.remove_item(Self::STORAGE_KEY)
        };
        result.map_err(|e| ExternalServiceError::Storage(format!("{:?}", e)))
    }
}

/// Fixed-delay verifier with a persisted flag
#[derive(Debug, Clone)]
pub struct SimulatedVerifier<S: FlagStore> {
    store: S,
    delay_ms: u64,
    status: VerificationStatus,
}

impl<S: FlagStore> SimulatedVerifier<S> {
    /// Restores a previously persisted verification
    pub fn new(store: S, delay_ms: u64) -> Self {
        let status = if store.load() {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Unverified
        };
        Self {
            store,
            delay_ms,
            status,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: FlagStore> Verifier for SimulatedVerifier<S> {
    fn status(&self) -> VerificationStatus {
        self.status
    }

    fn begin(&mut self, now_ms: u64) -> Result<(), ExternalServiceError> {
        if matches!(self.status, VerificationStatus::Unverified) {
            log::info!("Starting identity verification...");
            self.status = VerificationStatus::Verifying { since_ms: now_ms };
        }
        Ok(())
    }

    fn poll(&mut self, now_ms: u64) -> VerificationStatus {
        if let VerificationStatus::Verifying { since_ms } = self.status {
            if now_ms.saturating_sub(since_ms) >= self.delay_ms {
                match self.store.store(true) {
                    Ok(()) => log::info!("Identity verification successful"),
                    // The session is still verified, it just won't survive a reload
                    Err(e) => log::warn!("Could not persist verification: {}", e),
                }
                self.status = VerificationStatus::Verified;
            }
        }
        self.status
    }

    fn reset(&mut self) {
        if let Err(e) = self.store.store(false) {
            log::warn!("Could not clear verification: {}", e);
        }
        self.status = VerificationStatus::Unverified;
    }
}
