//! Client-side coordination layer for a confidential outcome ledger.
//!
//! Scores go on chain encrypted by an external homomorphic-encryption oracle
//! and are revealed only under a signed, time-bounded decryption grant. The
//! wallet's chain and signer can change at any moment, so every operation
//! snapshots the identity it started under and discards its own result if
//! that snapshot is no longer current at commit time. One [`Coordinator`]
//! instance owns the ciphertext cache, the grant cache and the per-kind
//! single-flight locks.

pub mod cache;
pub mod config;
pub mod contract;
pub mod coordinator;
pub mod error;
pub mod grant;
pub mod identity;
pub mod ledger;
pub mod logger;
pub mod oracle;
pub mod storage;
pub mod types;

pub use config::CoordinatorConfig;
pub use contract::{Deployment, DeploymentRegistry};
pub use coordinator::Coordinator;
pub use error::{CoordinatorError, Result};
pub use grant::{DecryptionGrant, GrantAuthorizer};
pub use identity::{Identity, IdentityTracker, WalletEvent, WalletSigner};
pub use ledger::{LedgerClient, OutcomePayload};
pub use oracle::{DecryptionRequest, EncryptedInput, EncryptionOracle, OracleKeypair};
pub use storage::{GrantStore, MemoryGrantStore};
pub use types::{
    CiphertextHandle, OutcomeSubmission, PlayerStats, RevealedValue, SubjectKey,
    SubmissionOutcome, TxStatus, TypedDataPayload,
};
