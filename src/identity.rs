use crate::types::TypedDataPayload;
use alloy::primitives::Address;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Chain/signer pair captured at the start of an operation and compared
/// against the latest observed identity before committing its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub chain_id: u64,
    pub signer: Address,
}

/// Wallet-side signer. `address` is the stable identity key; signing a
/// typed-data payload may wait indefinitely on user approval.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;
    async fn sign_typed_data(&self, payload: &TypedDataPayload) -> anyhow::Result<String>;
}

/// External wallet notifications feeding the identity tracker.
pub enum WalletEvent {
    ChainChanged(u64),
    AccountChanged(Option<Arc<dyn WalletSigner>>),
    Disconnected,
}

#[derive(Debug, Default, Clone, Copy)]
struct LatestIdentity {
    chain_id: Option<u64>,
    signer: Option<Address>,
}

/// Single canonical "latest identity" cell.
///
/// Predicates always read the latest cell, never a value captured earlier;
/// callers snapshot with [`IdentityTracker::snapshot`] and re-validate at
/// every suspend-point boundary. Reads never suspend.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    latest: RwLock<LatestIdentity>,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_chain(&self, chain_id: u64) {
        self.latest.write().chain_id = Some(chain_id);
    }

    pub fn set_signer(&self, signer: Option<Address>) {
        self.latest.write().signer = signer;
    }

    pub fn clear(&self) {
        *self.latest.write() = LatestIdentity::default();
    }

    pub fn current_chain(&self) -> Option<u64> {
        self.latest.read().chain_id
    }

    pub fn current_signer(&self) -> Option<Address> {
        self.latest.read().signer
    }

    /// Latest complete identity, if both chain and signer are known.
    pub fn snapshot(&self) -> Option<Identity> {
        let latest = self.latest.read();
        match (latest.chain_id, latest.signer) {
            (Some(chain_id), Some(signer)) => Some(Identity { chain_id, signer }),
            _ => None,
        }
    }

    pub fn matches_current_chain(&self, chain_id: u64) -> bool {
        self.latest.read().chain_id == Some(chain_id)
    }

    pub fn matches_current_signer(&self, signer: Address) -> bool {
        self.latest.read().signer == Some(signer)
    }

    /// Both halves of the snapshot still current.
    pub fn matches(&self, snapshot: &Identity) -> bool {
        let latest = self.latest.read();
        latest.chain_id == Some(snapshot.chain_id) && latest.signer == Some(snapshot.signer)
    }
}
