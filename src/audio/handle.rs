//! Revocable handles for encoded audio.
//!
//! [`BlobRegistry`] plays the role of an object-URL table: registering an
//! [`EncodedAudio`] yields an opaque [`AudioHandle`] that resolves to the
//! clip until it is revoked.  Revocation drops the registry's reference to
//! the bytes, which is what keeps memory bounded in a long session.
//!
//! Handles are not `Clone`; the record that receives one is its only owner.
//! Releasing a handle twice is reported as [`DoubleReleaseFault`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::codec::EncodedAudio;

// ---------------------------------------------------------------------------
// AudioHandle
// ---------------------------------------------------------------------------

/// Opaque reference to a registered [`EncodedAudio`].
///
/// Displays as a URL-like string (`blob:tts-studio/<n>`).
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AudioHandle {
    id: u64,
}

impl fmt::Display for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:tts-studio/{}", self.id)
    }
}

// ---------------------------------------------------------------------------
// DoubleReleaseFault
// ---------------------------------------------------------------------------

/// A handle was revoked after it had already been released.
///
/// This is an internal invariant violation, never a user-facing condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("audio handle {0} was already released")]
pub struct DoubleReleaseFault(pub String);

// ---------------------------------------------------------------------------
// BlobRegistry
// ---------------------------------------------------------------------------

/// Table of live audio resources keyed by handle.
#[derive(Debug, Default)]
pub struct BlobRegistry {
    next_id: u64,
    live: HashMap<u64, Arc<EncodedAudio>>,
    revocations: u64,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `audio` and mint a fresh handle for it.
    pub fn register(&mut self, audio: EncodedAudio) -> AudioHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, Arc::new(audio));
        log::debug!("blob registry: registered blob:tts-studio/{id}");
        AudioHandle { id }
    }

    /// The clip behind `handle`, or `None` once it has been revoked.
    pub fn resolve(&self, handle: &AudioHandle) -> Option<Arc<EncodedAudio>> {
        self.live.get(&handle.id).cloned()
    }

    /// Release the resource behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`DoubleReleaseFault`] if `handle` was already revoked.
    pub fn revoke(&mut self, handle: &AudioHandle) -> Result<(), DoubleReleaseFault> {
        match self.live.remove(&handle.id) {
            Some(_) => {
                self.revocations += 1;
                log::debug!("blob registry: revoked {handle}");
                Ok(())
            }
            None => Err(DoubleReleaseFault(handle.to_string())),
        }
    }

    /// Number of handles that currently resolve.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of successful revocations over the registry's lifetime.
    pub fn revocation_count(&self) -> u64 {
        self.revocations
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
