//! Task lifecycle: on-chain creation, escrow, and progress reads.
//!
//! Creation runs validation entirely before the first network call, then
//! checks the network and contract, dry-runs the call, and only then
//! broadcasts. The off-chain mirror record is written after on-chain
//! success; a crash in between leaves the chain ahead of the mirror,
//! which later reads recover from via [`submission_progress`] rather than
//! any rollback.
//!
//! [`submission_progress`]: TaskLifecycleManager::submission_progress

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use veridoc_chain::{ChainClient, ChainError, CreateTaskCall, SigningContext};
use veridoc_core::{escrow_total, normalize_cid, Address, TaskRecord, TaskStatus};
use veridoc_store::MirrorStore;

use crate::EngineError;

/// Inputs for creating a validation task for one claim's document.
#[derive(Debug, Clone)]
pub struct CreateTaskRequest {
    pub claim_id: String,
    pub contract_address: Address,
    /// Raw document locator; normalised before it goes on chain.
    pub document_locator: String,
    pub required_validators: u32,
    /// Wallet receiving the fixed issuer bonus at finalization.
    pub issuer_wallet: Address,
    /// Validator reward pool in base units.
    pub reward_amount: u128,
    /// Fixed per-task bonus, independent of validator count.
    pub issuer_bonus: u128,
}

pub struct TaskLifecycleManager<S, C> {
    store: Arc<S>,
    chain: Arc<C>,
}

impl<S: MirrorStore, C: ChainClient> TaskLifecycleManager<S, C> {
    pub fn new(store: Arc<S>, chain: Arc<C>) -> Self {
        Self { store, chain }
    }

    /// Create an on-chain validation task and its mirror record.
    ///
    /// Escrows `reward_amount + issuer_bonus` exactly. The new task id is
    /// recovered from the creation event when present, falling back to the
    /// contract's task counter; the fallback is best-effort and racy under
    /// concurrent creators on the same contract, so its use is logged.
    pub async fn create_task(
        &self,
        ctx: &SigningContext,
        request: CreateTaskRequest,
    ) -> Result<TaskRecord, EngineError> {
        // Validation first: no side effects, no network.
        if request.required_validators < 1 {
            return Err(EngineError::Validation(
                "required validator count must be at least 1".into(),
            ));
        }
        let content_id = normalize_cid(&request.document_locator);
        if content_id.is_empty() {
            return Err(EngineError::Validation("document locator is empty".into()));
        }
        let value = escrow_total(request.reward_amount, request.issuer_bonus)?;

        // An active task pins the claim; check the mirror before spending
        // anything. The store re-checks under its write lock at insert.
        if let Some(task) = self.store.task_for_claim(&request.claim_id).await? {
            if !task.status.is_terminal() {
                return Err(EngineError::Validation(format!(
                    "claim {} already has active task {}",
                    request.claim_id, task.task_id
                )));
            }
        }

        self.require_network(ctx).await?;
        if !self.chain.has_code(&request.contract_address).await? {
            return Err(EngineError::Chain(ChainError::NoCode(
                request.contract_address,
            )));
        }

        let call = CreateTaskCall {
            contract: request.contract_address.clone(),
            content_id: content_id.clone(),
            required_validators: request.required_validators,
            issuer_wallet: request.issuer_wallet.clone(),
            value,
        };

        // Dry run: surface the revert reason without spending gas.
        if let Err(err) = self.chain.simulate_create_task(ctx, &call).await {
            return Err(match err {
                ChainError::Reverted(reason) => {
                    EngineError::TaskCreationWouldRevert { reason }
                }
                other => EngineError::Chain(other),
            });
        }

        let receipt = self.chain.send_create_task(ctx, &call).await?;
        let task_id = match receipt.task_created {
            Some(event) => event.task_id,
            None => {
                // No creation event in the receipt. Infer the most recently
                // assigned id from the counter; wrong under concurrent
                // creators on the same contract, hence best-effort.
                warn!(
                    tx = %receipt.tx_hash,
                    "creation event missing, falling back to task counter"
                );
                let counter = self.chain.task_counter(&request.contract_address).await?;
                counter
                    .checked_sub(1)
                    .ok_or(ChainError::TaskIdUnavailable)?
            }
        };

        let record = TaskRecord {
            task_id,
            contract_address: request.contract_address,
            claim_id: request.claim_id,
            content_id,
            required_validators: request.required_validators,
            reward_amount: request.reward_amount,
            issuer_wallet: request.issuer_wallet,
            creation_tx: receipt.tx_hash,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
        };
        // On-chain state is already ahead of the mirror here; if this write
        // fails the task still exists and is recoverable from chain reads.
        self.store.insert_task(record.clone()).await?;
        info!(
            task_id,
            claim_id = %record.claim_id,
            escrowed = value,
            tx = %record.creation_tx,
            "validation task created"
        );
        Ok(record)
    }

    /// Current and required submission counts, read from chain state.
    ///
    /// This is the authoritative path for anything gating task completion;
    /// the mirror may lag.
    pub async fn submission_progress(
        &self,
        contract: &Address,
        task_id: u64,
    ) -> Result<(u32, u32), EngineError> {
        let info = self.chain.task_info(contract, task_id).await?;
        Ok((info.submission_count, info.required_validators))
    }

    async fn require_network(&self, ctx: &SigningContext) -> Result<(), EngineError> {
        let actual = self.chain.chain_id().await?;
        if actual != ctx.chain_id {
            return Err(EngineError::Chain(ChainError::WrongNetwork {
                expected: ctx.chain_id,
                actual,
            }));
        }
        Ok(())
    }
}
