use crate::cache::CiphertextCache;
use crate::config::CoordinatorConfig;
use crate::contract::{Deployment, DeploymentRegistry};
use crate::error::{CoordinatorError, Result};
use crate::grant::GrantAuthorizer;
use crate::identity::{Identity, IdentityTracker, WalletEvent, WalletSigner};
use crate::ledger::{LedgerClient, OutcomePayload};
use crate::oracle::{DecryptionRequest, EncryptionOracle};
use crate::storage::GrantStore;
use crate::types::{
    CiphertextHandle, OutcomeSubmission, PlayerStats, SubjectKey, SubmissionOutcome, TxStatus,
};
use alloy::primitives::{Address, B256, U256};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Coordinates ciphertext state, decryption authorization and submissions
/// for one subject against one outcome-ledger deployment per chain.
///
/// All mutable state (cache, grant store handle, per-kind locks) is owned by
/// the instance; callers observe through read-only getters. Results of
/// suspended operations commit only if the identity snapshotted at call
/// start is still current.
pub struct Coordinator {
    config: CoordinatorConfig,
    registry: DeploymentRegistry,
    ledger: Arc<dyn LedgerClient>,
    oracle: Arc<dyn EncryptionOracle>,
    authorizer: GrantAuthorizer,
    identity: IdentityTracker,
    signer: RwLock<Option<Arc<dyn WalletSigner>>>,
    cache: Mutex<CiphertextCache>,
    status: RwLock<String>,
    last_tx_hash: RwLock<Option<B256>>,
    // Single-flight guards, one per operation kind. Non-reentrant; taken
    // with try_lock so overlapping calls are rejected, never queued.
    refresh_lock: AsyncMutex<()>,
    decrypt_lock: AsyncMutex<()>,
    submit_lock: AsyncMutex<()>,
}

impl Coordinator {
    pub fn new(
        config: CoordinatorConfig,
        registry: DeploymentRegistry,
        ledger: Arc<dyn LedgerClient>,
        oracle: Arc<dyn EncryptionOracle>,
        grant_store: Arc<dyn GrantStore>,
    ) -> Self {
        let authorizer = GrantAuthorizer::new(grant_store, config.grant_duration_days);
        Self {
            config,
            registry,
            ledger,
            oracle,
            authorizer,
            identity: IdentityTracker::new(),
            signer: RwLock::new(None),
            cache: Mutex::new(CiphertextCache::new()),
            status: RwLock::new(String::new()),
            last_tx_hash: RwLock::new(None),
            refresh_lock: AsyncMutex::new(()),
            decrypt_lock: AsyncMutex::new(()),
            submit_lock: AsyncMutex::new(()),
        }
    }

    // ===== Wallet lifecycle =====

    /// Install a signer and chain, then refresh the caller's own total if
    /// configured to.
    pub async fn connect(&self, signer: Arc<dyn WalletSigner>, chain_id: u64) {
        let address = signer.address();
        *self.signer.write() = Some(signer);
        self.identity.set_chain(chain_id);
        self.identity.set_signer(Some(address));
        info!(%address, chain_id, "wallet connected");

        if self.config.auto_refresh_total {
            if let Err(e) = self.refresh_total().await {
                debug!("initial total refresh failed: {}", e);
            }
        }
    }

    pub fn disconnect(&self) {
        *self.signer.write() = None;
        self.identity.clear();
        self.cache.lock().clear();
        *self.last_tx_hash.write() = None;
        self.set_status("");
        info!("wallet disconnected");
    }

    /// Single mutation path for the latest-identity cell.
    pub fn apply_wallet_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::ChainChanged(chain_id) => {
                debug!(chain_id, "chain changed");
                self.identity.set_chain(chain_id);
            }
            WalletEvent::AccountChanged(signer) => {
                let address = signer.as_ref().map(|s| s.address());
                debug!(?address, "account changed");
                *self.signer.write() = signer;
                self.identity.set_signer(address);
            }
            WalletEvent::Disconnected => self.disconnect(),
        }
    }

    /// Drain wallet events on a background task until the sender drops.
    pub fn spawn_wallet_listener(
        self: &Arc<Self>,
        mut events: mpsc::UnboundedReceiver<WalletEvent>,
    ) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                coordinator.apply_wallet_event(event);
            }
            debug!("wallet event stream closed");
        })
    }

    // ===== Observers =====

    pub fn status(&self) -> String {
        self.status.read().clone()
    }

    pub fn handle(&self) -> Option<CiphertextHandle> {
        self.cache.lock().handle()
    }

    pub fn revealed_value(&self) -> Option<U256> {
        let cache = self.cache.lock();
        cache.handle().and_then(|h| cache.revealed_for(h))
    }

    pub fn is_decrypted(&self) -> bool {
        self.revealed_value().is_some()
    }

    pub fn last_tx_hash(&self) -> Option<B256> {
        *self.last_tx_hash.read()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_lock.try_lock().is_err()
    }

    pub fn is_decrypting(&self) -> bool {
        self.decrypt_lock.try_lock().is_err()
    }

    pub fn is_submitting(&self) -> bool {
        self.submit_lock.try_lock().is_err()
    }

    pub fn can_refresh(&self) -> bool {
        self.current_deployment().is_some() && self.current_signer().is_some()
            && !self.is_refreshing()
    }

    pub fn can_decrypt(&self) -> bool {
        let has_undecrypted = {
            let cache = self.cache.lock();
            cache.has_ciphertext()
                && cache.handle().is_some_and(|h| cache.revealed_for(h).is_none())
        };
        has_undecrypted
            && self.current_deployment().is_some()
            && self.current_signer().is_some()
            && !self.is_refreshing()
            && !self.is_decrypting()
    }

    pub fn can_submit(&self) -> bool {
        self.current_deployment().is_some()
            && self.current_signer().is_some()
            && !self.is_refreshing()
            && !self.is_submitting()
    }

    // ===== Refresh =====

    /// Refresh the ciphertext handle of the connected signer's running total.
    pub async fn refresh_total(&self) -> Result<()> {
        match self.identity.current_signer() {
            Some(address) => self.refresh(SubjectKey::Player(address)).await,
            None => {
                self.cache.lock().clear();
                self.set_status("Connection not ready. Cannot query ciphertext.");
                Ok(())
            }
        }
    }

    /// Refresh the ciphertext handle of one logged outcome.
    pub async fn refresh_outcome(&self, outcome_id: u64) -> Result<()> {
        self.refresh(SubjectKey::Outcome(outcome_id)).await
    }

    async fn refresh(&self, subject: SubjectKey) -> Result<()> {
        // A refresh arriving while one is in flight is a no-op, not an error.
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            debug!(?subject, "refresh already in flight, ignoring");
            return Ok(());
        };

        let Some(deployment) = self.current_deployment() else {
            self.cache.lock().clear();
            self.set_status("Connection not ready. Cannot query ciphertext.");
            return Ok(());
        };
        let snapshot_chain = deployment.chain_id;
        let snapshot_address = deployment.address;

        let handle = match self.ledger.read_handle(snapshot_address, subject).await {
            Ok(handle) => handle,
            Err(e) => {
                error!(?subject, "ciphertext refresh failed: {:#}", e);
                self.set_status(format!("Refresh failed: {}", e));
                return Err(CoordinatorError::Ledger(e.to_string()));
            }
        };

        // Commit gate: the chain and target contract must still be current.
        if !self.identity.matches_current_chain(snapshot_chain)
            || self.current_deployment().map(|d| d.address) != Some(snapshot_address)
        {
            debug!(?subject, "discarding stale refresh result");
            return Ok(());
        }

        self.cache.lock().commit_handle(handle);
        let message = match (subject, handle.is_zero()) {
            (SubjectKey::Outcome(id), true) => format!("Outcome #{} has no ciphertext yet.", id),
            (SubjectKey::Outcome(id), false) => {
                format!("Outcome #{} ciphertext refreshed. Ready to decrypt.", id)
            }
            (SubjectKey::Player(_), true) => {
                "No ciphertext found. Submit a game first or refresh later.".to_string()
            }
            (SubjectKey::Player(_), false) => "Ciphertext refreshed. Ready to decrypt.".to_string(),
        };
        self.set_status(message);
        Ok(())
    }

    // ===== Decrypt =====

    /// Reveal the cached ciphertext handle.
    ///
    /// Returns the plaintext, or `None` when the result was discarded as
    /// stale (the user switched context, which is not a failure).
    pub async fn decrypt(&self) -> Result<Option<U256>> {
        self.decrypt_with(false).await
    }

    pub async fn decrypt_with(&self, force_sign: bool) -> Result<Option<U256>> {
        // A decrypt issued right after a refresh must not race it: wait for
        // the refresh to settle, bounded, then proceed regardless.
        if self.is_refreshing() {
            self.set_status("Refreshing ciphertext... will decrypt afterwards.");
            match timeout(self.config.refresh_wait_timeout, self.refresh_lock.lock()).await {
                Ok(guard) => drop(guard),
                Err(_) => warn!(
                    "refresh still in flight after {:?}, decrypting anyway",
                    self.config.refresh_wait_timeout
                ),
            }
        }

        let Ok(_guard) = self.decrypt_lock.try_lock() else {
            self.set_status("Decrypting... please wait.");
            return Err(CoordinatorError::Busy("decrypt"));
        };

        let Some(deployment) = self.current_deployment() else {
            self.set_status("Contract or signer not ready. Connect a wallet and wait for setup.");
            return Err(CoordinatorError::NotReady("contract deployment"));
        };
        let Some(signer) = self.current_signer() else {
            self.set_status("Contract or signer not ready. Connect a wallet and wait for setup.");
            return Err(CoordinatorError::NotReady("signer"));
        };

        let (handle, already_revealed) = {
            let cache = self.cache.lock();
            let handle = cache.handle();
            (handle, handle.and_then(|h| cache.revealed_for(h)))
        };
        let Some(handle) = handle.filter(|h| !h.is_zero()) else {
            self.set_status("No ciphertext to decrypt. Submit a game or refresh the ciphertext.");
            return Err(CoordinatorError::NotReady("ciphertext handle"));
        };
        if let Some(value) = already_revealed {
            return Ok(Some(value));
        }

        let snapshot = Identity {
            chain_id: deployment.chain_id,
            signer: signer.address(),
        };
        let snapshot_address = deployment.address;
        self.set_status("Starting decryption...");

        let grant = match self
            .authorizer
            .load_or_sign(
                self.oracle.as_ref(),
                signer.as_ref(),
                &[snapshot_address],
                force_sign,
            )
            .await
        {
            Ok(grant) => grant,
            Err(e) => {
                self.set_status(format!("Decryption failed: {}", e));
                return Err(e);
            }
        };

        // The signature request can sit on user approval for a long time.
        if self.is_stale(&snapshot, snapshot_address) {
            debug!("identity changed while waiting for decryption grant");
            self.set_status("Stale request ignored.");
            return Ok(None);
        }

        self.set_status("Calling user decryption...");
        let request = DecryptionRequest {
            handle,
            contract_address: snapshot_address,
        };
        let results = match self.oracle.user_decrypt(&[request], &grant).await {
            Ok(results) => results,
            Err(e) => {
                error!("user decryption failed: {:#}", e);
                self.set_status(format!("Decryption failed: {}", e));
                return Err(CoordinatorError::Oracle(e.to_string()));
            }
        };

        if self.is_stale(&snapshot, snapshot_address) {
            self.set_status("Stale result ignored.");
            return Ok(None);
        }
        let Some(value) = results.get(&handle).copied() else {
            self.set_status("Decryption failed: no plaintext returned for handle.");
            return Err(CoordinatorError::Oracle(
                "no plaintext returned for requested handle".to_string(),
            ));
        };

        // The handle could have been replaced by a refresh that committed
        // while we were suspended.
        if !self.cache.lock().commit_revealed(value, handle) {
            self.set_status("Stale result ignored.");
            return Ok(None);
        }
        self.set_status("Decryption completed.");
        info!(%handle, "ciphertext revealed");
        Ok(Some(value))
    }

    /// Reveal an externally supplied handle without touching the shared
    /// cache. Used to reveal other participants' totals one at a time.
    pub async fn decrypt_handle(
        &self,
        handle: CiphertextHandle,
        force_sign: bool,
    ) -> Result<U256> {
        let Some(deployment) = self.current_deployment() else {
            return Err(CoordinatorError::NotReady("contract deployment"));
        };
        let Some(signer) = self.current_signer() else {
            return Err(CoordinatorError::NotReady("signer"));
        };
        if handle.is_zero() {
            return Err(CoordinatorError::NotReady("ciphertext handle"));
        }

        let snapshot = Identity {
            chain_id: deployment.chain_id,
            signer: signer.address(),
        };
        let snapshot_address = deployment.address;

        let grant = self
            .authorizer
            .load_or_sign(
                self.oracle.as_ref(),
                signer.as_ref(),
                &[snapshot_address],
                force_sign,
            )
            .await?;
        if self.is_stale(&snapshot, snapshot_address) {
            return Err(CoordinatorError::Stale("decryption"));
        }

        let request = DecryptionRequest {
            handle,
            contract_address: snapshot_address,
        };
        let results = self
            .oracle
            .user_decrypt(&[request], &grant)
            .await
            .map_err(|e| CoordinatorError::Oracle(e.to_string()))?;
        if self.is_stale(&snapshot, snapshot_address) {
            return Err(CoordinatorError::Stale("decryption"));
        }

        results.get(&handle).copied().ok_or_else(|| {
            CoordinatorError::Oracle("no plaintext returned for requested handle".to_string())
        })
    }

    // ===== Submit =====

    /// Encrypt an outcome, broadcast it and wait for one confirmation, then
    /// refresh the submitter's now-stale total.
    ///
    /// Never retried automatically: resubmitting an already-broadcast
    /// encrypted payload is the user's call.
    pub async fn submit(&self, submission: OutcomeSubmission) -> Result<SubmissionOutcome> {
        // Submissions must not race a refresh of the same subject.
        if self.is_refreshing() {
            return Err(CoordinatorError::Busy("refresh"));
        }

        let outcome = {
            let Ok(_guard) = self.submit_lock.try_lock() else {
                return Err(CoordinatorError::Busy("submit"));
            };

            let Some(deployment) = self.current_deployment() else {
                self.set_status("Contract or signer not ready.");
                return Err(CoordinatorError::NotReady("contract deployment"));
            };
            let Some(signer) = self.current_signer() else {
                self.set_status("Contract or signer not ready.");
                return Err(CoordinatorError::NotReady("signer"));
            };
            let snapshot = Identity {
                chain_id: deployment.chain_id,
                signer: signer.address(),
            };
            let contract_address = deployment.address;

            self.set_status("Preparing score encryption...");
            let encrypted = match self
                .oracle
                .encrypt_outcome(contract_address, snapshot.signer, submission.score)
                .await
            {
                Ok(encrypted) => encrypted,
                Err(e) => {
                    error!("outcome encryption failed: {:#}", e);
                    self.set_status(format!("Submission failed: {}", e));
                    return Err(CoordinatorError::Oracle(e.to_string()));
                }
            };

            // No transaction is produced from a stale identity.
            if self.is_stale(&snapshot, contract_address) {
                self.set_status("Stale submission ignored.");
                return Err(CoordinatorError::Stale("submission"));
            }

            self.set_status("Submitting transaction...");
            let payload = OutcomePayload {
                handle: encrypted.handle,
                proof: encrypted.proof,
                result_hash: submission.result_hash,
                result_cid: submission.result_cid.clone(),
                public_score: submission.public_score,
            };
            let tx_hash = match self.ledger.submit_outcome(contract_address, &payload).await {
                Ok(tx_hash) => tx_hash,
                Err(e) => {
                    error!("outcome broadcast failed: {:#}", e);
                    self.set_status(format!("Submission failed: {}", e));
                    return Err(CoordinatorError::Transaction {
                        tx_hash: None,
                        message: e.to_string(),
                    });
                }
            };
            *self.last_tx_hash.write() = Some(tx_hash);
            self.set_status(format!("Waiting for confirmation: {}", tx_hash));

            match self.ledger.await_confirmation(tx_hash).await {
                Ok(TxStatus::Confirmed) => {}
                Ok(TxStatus::Reverted) => {
                    self.set_status(format!("Transaction reverted: {}", tx_hash));
                    return Err(CoordinatorError::Transaction {
                        tx_hash: Some(tx_hash),
                        message: "transaction reverted".to_string(),
                    });
                }
                Err(e) => {
                    error!(%tx_hash, "confirmation wait failed: {:#}", e);
                    self.set_status(format!("Submission failed: {}", e));
                    return Err(CoordinatorError::Transaction {
                        tx_hash: Some(tx_hash),
                        message: e.to_string(),
                    });
                }
            }

            self.set_status("Submission complete.");
            info!(%tx_hash, "outcome submitted and confirmed");
            SubmissionOutcome {
                tx_hash,
                confirmed: true,
            }
        };

        // The cached total is stale by definition now.
        if let Err(e) = self.refresh_total().await {
            debug!("post-submit total refresh failed: {}", e);
        }

        Ok(outcome)
    }

    // ===== Public reads =====

    pub async fn player_stats(&self, player: Address) -> Result<PlayerStats> {
        let Some(deployment) = self.current_deployment() else {
            return Err(CoordinatorError::NotReady("contract deployment"));
        };
        self.ledger
            .player_stats(deployment.address, player)
            .await
            .map_err(|e| CoordinatorError::Ledger(e.to_string()))
    }

    pub async fn next_outcome_id(&self) -> Result<u64> {
        let Some(deployment) = self.current_deployment() else {
            return Err(CoordinatorError::NotReady("contract deployment"));
        };
        self.ledger
            .next_outcome_id(deployment.address)
            .await
            .map_err(|e| CoordinatorError::Ledger(e.to_string()))
    }

    // ===== Internals =====

    fn current_signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.signer.read().clone()
    }

    /// Deployment for the currently active chain, if any and non-zero.
    fn current_deployment(&self) -> Option<Deployment> {
        let chain_id = self.identity.current_chain()?;
        if !self.registry.is_deployed(chain_id) {
            return None;
        }
        self.registry.deployment(chain_id).cloned()
    }

    fn is_stale(&self, snapshot: &Identity, contract_address: Address) -> bool {
        !self.identity.matches(snapshot)
            || self.current_deployment().map(|d| d.address) != Some(contract_address)
    }

    fn set_status(&self, message: impl Into<String>) {
        *self.status.write() = message.into();
    }
}
