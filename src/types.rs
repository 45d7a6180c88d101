use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to an encrypted value held by the ledger.
///
/// The all-zero handle is the ledger's sentinel for "no ciphertext yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(pub B256);

impl CiphertextHandle {
    pub const ZERO: Self = Self(B256::ZERO);

    pub fn new(bytes: B256) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == B256::ZERO
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whose ciphertext a refresh targets: one logged outcome, or a player's
/// running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKey {
    Outcome(u64),
    Player(Address),
}

/// A confidential outcome plus the public metadata recorded alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeSubmission {
    /// Confidential score; only ever leaves the client encrypted.
    pub score: u32,
    pub public_score: u32,
    pub result_hash: B256,
    pub result_cid: String,
}

/// Result of a submit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub tx_hash: B256,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Confirmed,
    Reverted,
}

/// Public (non-confidential) per-player milestones kept by the contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub num_games: u64,
    pub total_public_score: u64,
    pub max_single_public_score: u64,
    pub last_played_at: u64,
}

/// Plaintext paired with the handle it was decrypted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealedValue {
    pub value: U256,
    pub handle: CiphertextHandle,
}

/// EIP-712 payload produced by the oracle and signed by the wallet.
///
/// Opaque to the coordinator; only the oracle and the signer interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataPayload {
    pub domain: serde_json::Value,
    pub primary_type: String,
    pub types: serde_json::Value,
    pub message: serde_json::Value,
}
