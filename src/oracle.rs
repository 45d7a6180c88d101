use crate::grant::DecryptionGrant;
use crate::types::{CiphertextHandle, TypedDataPayload};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;

/// Ephemeral keypair the oracle hands out for one decryption grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleKeypair {
    pub public_key: String,
    pub private_key: String,
}

/// Ciphertext reference plus input proof, ready to go on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: CiphertextHandle,
    pub proof: Vec<u8>,
}

/// One handle to reveal, scoped to the contract it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionRequest {
    pub handle: CiphertextHandle,
    pub contract_address: Address,
}

/// Homomorphic-encryption oracle. Black box: the coordinator only sequences
/// its calls and gates their results on identity freshness.
#[async_trait]
pub trait EncryptionOracle: Send + Sync {
    fn generate_keypair(&self) -> OracleKeypair;

    /// EIP-712 payload authorizing `public_key` to decrypt ciphertexts of
    /// the given contracts for `[start_timestamp, start + duration_days)`.
    fn create_typed_data(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> TypedDataPayload;

    /// Build an encrypted input bound to `(contract_address, user_address)`.
    async fn encrypt_outcome(
        &self,
        contract_address: Address,
        user_address: Address,
        value: u32,
    ) -> anyhow::Result<EncryptedInput>;

    /// Reveal the requested handles under a valid grant.
    async fn user_decrypt(
        &self,
        requests: &[DecryptionRequest],
        grant: &DecryptionGrant,
    ) -> anyhow::Result<HashMap<CiphertextHandle, U256>>;
}
