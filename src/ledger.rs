use crate::types::{CiphertextHandle, PlayerStats, SubjectKey, TxStatus};
use alloy::primitives::{Address, B256};
use async_trait::async_trait;

/// Encrypted outcome plus public metadata, as the contract's log operation
/// takes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomePayload {
    pub handle: CiphertextHandle,
    pub proof: Vec<u8>,
    pub result_hash: B256,
    pub result_cid: String,
    pub public_score: u32,
}

/// Read/write client for the outcome ledger contract.
///
/// Gas, nonces and retries are this collaborator's concern; the coordinator
/// never resubmits on its own.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Ciphertext handle for a subject; the all-zero handle means the ledger
    /// has not produced one yet.
    async fn read_handle(
        &self,
        contract_address: Address,
        subject: SubjectKey,
    ) -> anyhow::Result<CiphertextHandle>;

    /// Broadcast an outcome transaction, returning its hash.
    async fn submit_outcome(
        &self,
        contract_address: Address,
        payload: &OutcomePayload,
    ) -> anyhow::Result<B256>;

    /// Wait for one confirmation of a broadcast transaction.
    async fn await_confirmation(&self, tx_hash: B256) -> anyhow::Result<TxStatus>;

    /// Public per-player milestones.
    async fn player_stats(
        &self,
        contract_address: Address,
        player: Address,
    ) -> anyhow::Result<PlayerStats>;

    /// Id the next logged outcome will get.
    async fn next_outcome_id(&self, contract_address: Address) -> anyhow::Result<u64>;
}
