use crate::error::{CoordinatorError, Result};
use crate::identity::WalletSigner;
use crate::oracle::EncryptionOracle;
use crate::storage::GrantStore;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

const GRANT_KEY_PREFIX: &str = "nebula.grant.";
const SECONDS_PER_DAY: u64 = 86_400;

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Time-bounded, signature-backed authorization to reveal ciphertexts bound
/// to a set of contract addresses.
///
/// Serialized as-is into the grant store; `contract_addresses` is kept
/// sorted so equality and cache keys do not depend on request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionGrant {
    pub public_key: String,
    pub private_key: String,
    pub signature: String,
    pub user_address: Address,
    pub contract_addresses: Vec<Address>,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl DecryptionGrant {
    /// Valid for `[start_timestamp, start_timestamp + duration_days)`.
    pub fn is_valid_at(&self, now: u64) -> bool {
        now >= self.start_timestamp
            && now < self.start_timestamp + self.duration_days * SECONDS_PER_DAY
    }

    /// Scoped to exactly this user and contract set.
    pub fn covers(&self, user_address: Address, contract_addresses: &[Address]) -> bool {
        let mut requested = contract_addresses.to_vec();
        requested.sort();
        self.user_address == user_address && self.contract_addresses == requested
    }
}

/// Store key for the grant scoped to `(user_address, contract_addresses)`.
pub fn grant_storage_key(user_address: Address, contract_addresses: &[Address]) -> String {
    let mut sorted = contract_addresses.to_vec();
    sorted.sort();
    let mut hasher = Sha256::new();
    hasher.update(user_address.as_slice());
    for address in &sorted {
        hasher.update(address.as_slice());
    }
    format!("{}{}", GRANT_KEY_PREFIX, hex::encode(hasher.finalize()))
}

/// Obtains decryption grants, reusing a persisted one while it is still
/// valid and exactly in scope.
pub struct GrantAuthorizer {
    store: Arc<dyn GrantStore>,
    duration_days: u64,
}

impl GrantAuthorizer {
    pub fn new(store: Arc<dyn GrantStore>, duration_days: u64) -> Self {
        Self {
            store,
            duration_days,
        }
    }

    /// Load a cached grant or request a fresh typed-data signature.
    ///
    /// `force` skips the cache and always re-signs. Signing rejection leaves
    /// the store untouched.
    pub async fn load_or_sign(
        &self,
        oracle: &dyn EncryptionOracle,
        signer: &dyn WalletSigner,
        contract_addresses: &[Address],
        force: bool,
    ) -> Result<DecryptionGrant> {
        let user_address = signer.address();
        let mut contracts = contract_addresses.to_vec();
        contracts.sort();
        let key = grant_storage_key(user_address, &contracts);

        if !force {
            if let Some(raw) = self.store.get_item(&key).await {
                match serde_json::from_str::<DecryptionGrant>(&raw) {
                    Ok(grant)
                        if grant.is_valid_at(unix_now())
                            && grant.covers(user_address, &contracts) =>
                    {
                        debug!(user = %user_address, "reusing cached decryption grant");
                        return Ok(grant);
                    }
                    Ok(_) => {
                        debug!(user = %user_address, "cached grant expired or out of scope, re-signing");
                    }
                    Err(e) => {
                        warn!("discarding unreadable cached grant: {}", e);
                    }
                }
            }
        }

        let keypair = oracle.generate_keypair();
        let start_timestamp = unix_now();
        let payload = oracle.create_typed_data(
            &keypair.public_key,
            &contracts,
            start_timestamp,
            self.duration_days,
        );

        let signature = signer
            .sign_typed_data(&payload)
            .await
            .map_err(|e| CoordinatorError::Authorization(e.to_string()))?;

        let grant = DecryptionGrant {
            public_key: keypair.public_key,
            private_key: keypair.private_key,
            signature,
            user_address,
            contract_addresses: contracts,
            start_timestamp,
            duration_days: self.duration_days,
        };

        match serde_json::to_string(&grant) {
            Ok(raw) => self.store.set_item(&key, &raw).await,
            Err(e) => warn!("failed to serialize decryption grant for caching: {}", e),
        }
        debug!(user = %user_address, start_timestamp, "signed fresh decryption grant");

        Ok(grant)
    }
}
