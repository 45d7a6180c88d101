use crate::types::{CiphertextHandle, RevealedValue};
use alloy::primitives::U256;

/// Last-fetched ciphertext handle and, if decrypted, its revealed value.
///
/// The revealed value survives only while the handle that produced it is
/// still current; committing a new handle always drops it.
#[derive(Debug, Clone, Default)]
pub struct CiphertextCache {
    handle: Option<CiphertextHandle>,
    revealed: Option<RevealedValue>,
}

impl CiphertextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Option<CiphertextHandle> {
        self.handle
    }

    /// Handle present and not the all-zero "absent" sentinel.
    pub fn has_ciphertext(&self) -> bool {
        self.handle.is_some_and(|h| !h.is_zero())
    }

    /// Revealed plaintext for `handle`, if it is the current handle.
    pub fn revealed_for(&self, handle: CiphertextHandle) -> Option<U256> {
        match (self.handle, self.revealed) {
            (Some(current), Some(revealed)) if current == handle && revealed.handle == handle => {
                Some(revealed.value)
            }
            _ => None,
        }
    }

    /// Install a freshly fetched handle, dropping any revealed value.
    pub fn commit_handle(&mut self, handle: CiphertextHandle) {
        self.handle = Some(handle);
        self.revealed = None;
    }

    /// Commit a revealed value iff `handle` is still the current handle.
    /// Returns whether the commit happened.
    pub fn commit_revealed(&mut self, value: U256, handle: CiphertextHandle) -> bool {
        if self.handle == Some(handle) {
            self.revealed = Some(RevealedValue { value, handle });
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.handle = None;
        self.revealed = None;
    }
}
