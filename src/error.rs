use alloy::primitives::B256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Coordinator errors.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Not ready: {0}")]
    NotReady(&'static str),

    #[error("Another {0} operation is already in flight")]
    Busy(&'static str),

    #[error("Chain or signer changed, {0} cancelled")]
    Stale(&'static str),

    #[error("Decryption authorization failed: {0}")]
    Authorization(String),

    #[error("Oracle call failed: {0}")]
    Oracle(String),

    #[error("Ledger read failed: {0}")]
    Ledger(String),

    #[error("Transaction failed: {message}")]
    Transaction {
        tx_hash: Option<B256>,
        message: String,
    },
}

impl CoordinatorError {
    /// Transaction hash attached to the failure, if one was broadcast.
    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            CoordinatorError::Transaction { tx_hash, .. } => *tx_hash,
            _ => None,
        }
    }
}
