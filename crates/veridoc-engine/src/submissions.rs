//! Submission collection: validator results, dedup, and progress queries.
//!
//! The happy path mirrors task creation: validate, check the network and
//! the wallet, dry-run, broadcast, then append the off-chain row. The
//! completion decision reads the chain's submission count, never the
//! mirror, since the mirror may lag behind confirmed transactions.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use veridoc_chain::{ChainClient, ChainError, SigningContext, SubmitResultCall};
use veridoc_core::{looks_like_cid, normalize_cid, SubmissionRecord, TaskRecord, TaskStatus};
use veridoc_store::{MirrorStore, StoreError};

use crate::EngineError;

pub struct SubmissionCollector<S, C> {
    store: Arc<S>,
    chain: Arc<C>,
}

impl<S: MirrorStore, C: ChainClient> SubmissionCollector<S, C> {
    pub fn new(store: Arc<S>, chain: Arc<C>) -> Self {
        Self { store, chain }
    }

    /// Submit a validator's result for a task.
    ///
    /// The result locator is normalised before it goes on chain; an
    /// unverified shape is logged but never blocks submission. Zero-balance
    /// wallets fail fast with [`ChainError::InsufficientFunds`] instead of
    /// an opaque RPC failure. When the mirror already holds a row for this
    /// (task, validator) pair the call is a no-op returning the existing
    /// row, so replays never double-credit.
    pub async fn submit_result(
        &self,
        ctx: &SigningContext,
        task_id: u64,
        validator_id: &str,
        result_locator: &str,
    ) -> Result<SubmissionRecord, EngineError> {
        let task = self
            .store
            .task(task_id)
            .await?
            .ok_or(StoreError::UnknownTask(task_id))?;

        let result_cid = normalize_cid(result_locator);
        if result_cid.is_empty() {
            return Err(EngineError::Validation("result locator is empty".into()));
        }
        if !looks_like_cid(&result_cid) {
            warn!(task_id, locator = %result_cid, "result locator has an unverified shape");
        }

        let actual = self.chain.chain_id().await?;
        if actual != ctx.chain_id {
            return Err(EngineError::Chain(ChainError::WrongNetwork {
                expected: ctx.chain_id,
                actual,
            }));
        }
        let balance = self.chain.balance(&ctx.wallet).await?;
        if balance == 0 {
            return Err(EngineError::Chain(ChainError::InsufficientFunds {
                wallet: ctx.wallet.clone(),
                balance,
            }));
        }
        let chain_task = self
            .chain
            .task_info(&task.contract_address, task_id)
            .await?;
        if chain_task.finalized {
            return Err(EngineError::Validation(format!(
                "task {task_id} is already finalized"
            )));
        }

        let call = SubmitResultCall {
            contract: task.contract_address.clone(),
            task_id,
            result_cid: result_cid.clone(),
        };
        if let Err(err) = self.chain.simulate_submit_result(ctx, &call).await {
            return Err(match err {
                ChainError::Reverted(reason) => EngineError::SubmissionWouldRevert { reason },
                other => EngineError::Chain(other),
            });
        }

        let receipt = self.chain.send_submit_result(ctx, &call).await?;

        let row = SubmissionRecord {
            submission_id: 0,
            task_id,
            validator_id: validator_id.to_string(),
            result_cid,
            tx_hash: receipt.tx_hash,
            wallet: ctx.wallet.clone(),
            submitted_at: Utc::now(),
        };
        let stored = match self.store.append_submission(row).await {
            Ok(stored) => stored,
            Err(StoreError::DuplicateSubmission { .. }) => {
                // The chain accepted the transaction but the mirror already
                // credits this validator, typically a replayed request after
                // a crash between broadcast and persistence. Keep the
                // original row.
                warn!(task_id, validator_id, "duplicate mirror row, keeping the original");
                self.existing_submission(task_id, validator_id).await?
            }
            Err(other) => return Err(other.into()),
        };

        self.refresh_completion(&task).await?;
        info!(
            task_id,
            validator_id,
            tx = %stored.tx_hash,
            "validator result recorded"
        );
        Ok(stored)
    }

    /// Flip the mirror task to `Completed` once the chain's submission
    /// count reaches the required quorum. The chain count is authoritative;
    /// the required count comes from the mirror, where it is immutable
    /// after creation.
    async fn refresh_completion(&self, task: &TaskRecord) -> Result<(), EngineError> {
        let count = self
            .chain
            .submission_count(&task.contract_address, task.task_id)
            .await?;
        if count >= task.required_validators && task.status == TaskStatus::Pending {
            self.store
                .set_task_status(task.task_id, TaskStatus::Completed)
                .await?;
            info!(task_id = task.task_id, "task reached quorum");
        }
        Ok(())
    }

    async fn existing_submission(
        &self,
        task_id: u64,
        validator_id: &str,
    ) -> Result<SubmissionRecord, EngineError> {
        self.store
            .submissions_by_task(task_id)
            .await?
            .into_iter()
            .find(|s| s.validator_id == validator_id)
            .ok_or_else(|| EngineError::Store(StoreError::UnknownTask(task_id)))
    }

    /// Submissions for a task, in submission order.
    pub async fn submissions_by_task(
        &self,
        task_id: u64,
    ) -> Result<Vec<SubmissionRecord>, EngineError> {
        Ok(self.store.submissions_by_task(task_id).await?)
    }

    /// Tasks where the validator has submitted but quorum is still open.
    pub async fn active_tasks_for_validator(
        &self,
        validator_id: &str,
    ) -> Result<Vec<TaskRecord>, EngineError> {
        self.tasks_for_validator(validator_id, false).await
    }

    /// Tasks the validator participated in that have reached quorum or
    /// been finalized.
    pub async fn completed_tasks_for_validator(
        &self,
        validator_id: &str,
    ) -> Result<Vec<TaskRecord>, EngineError> {
        self.tasks_for_validator(validator_id, true).await
    }

    async fn tasks_for_validator(
        &self,
        validator_id: &str,
        completed: bool,
    ) -> Result<Vec<TaskRecord>, EngineError> {
        let submissions = self.store.submissions_by_validator(validator_id).await?;
        let mut tasks = Vec::with_capacity(submissions.len());
        for submission in submissions {
            if let Some(task) = self.store.task(submission.task_id).await? {
                let done = matches!(task.status, TaskStatus::Completed | TaskStatus::Finalized);
                if done == completed {
                    tasks.push(task);
                }
            }
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridoc_chain::SimChain;
    use veridoc_core::{parse_amount, Address};
    use veridoc_store::{MemoryStore, MirrorStore};

    use crate::tasks::{CreateTaskRequest, TaskLifecycleManager};

    const CHAIN_ID: u64 = 31337;
    const RESULT: &str = "ipfs://bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

    fn addr(n: u64) -> Address {
        Address::parse(&format!("0x{n:040x}")).unwrap()
    }

    fn ctx(n: u64) -> SigningContext {
        SigningContext::new(addr(n), CHAIN_ID)
    }

    struct Fixture {
        collector: SubmissionCollector<MemoryStore, SimChain>,
        chain: Arc<SimChain>,
        store: Arc<MemoryStore>,
    }

    /// Deploy a contract, fund issuer and two validators, create task 0
    /// requiring 2 validators.
    async fn fixture() -> Fixture {
        let chain = Arc::new(SimChain::new(CHAIN_ID));
        let store = Arc::new(MemoryStore::new());
        let contract = chain
            .deploy_contract(parse_amount("0.01").unwrap(), 250)
            .unwrap();
        chain.fund(&addr(1), parse_amount("10.0").unwrap()).unwrap();
        chain.fund(&addr(2), parse_amount("1.0").unwrap()).unwrap();
        chain.fund(&addr(3), parse_amount("1.0").unwrap()).unwrap();

        let manager = TaskLifecycleManager::new(store.clone(), chain.clone());
        manager
            .create_task(
                &ctx(1),
                CreateTaskRequest {
                    claim_id: "clm-1".into(),
                    contract_address: contract,
                    document_locator: RESULT.into(),
                    required_validators: 2,
                    issuer_wallet: addr(1),
                    reward_amount: parse_amount("2.0").unwrap(),
                    issuer_bonus: parse_amount("0.01").unwrap(),
                },
            )
            .await
            .unwrap();

        Fixture {
            collector: SubmissionCollector::new(store.clone(), chain.clone()),
            chain,
            store,
        }
    }

    #[tokio::test]
    async fn completion_happens_exactly_at_quorum() {
        let f = fixture().await;

        f.collector
            .submit_result(&ctx(2), 0, "val-2", RESULT)
            .await
            .unwrap();
        let task = f.store.task(0).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Pending, "1 of 2 must stay pending");

        f.collector
            .submit_result(&ctx(3), 0, "val-3", RESULT)
            .await
            .unwrap();
        let task = f.store.task(0).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn duplicate_validator_is_refused_by_simulation() {
        let f = fixture().await;
        f.collector
            .submit_result(&ctx(2), 0, "val-2", RESULT)
            .await
            .unwrap();
        let err = f
            .collector
            .submit_result(&ctx(2), 0, "val-2", RESULT)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SubmissionWouldRevert { .. }));
        // Still one row mirrored.
        assert_eq!(f.collector.submissions_by_task(0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_balance_fails_fast() {
        let f = fixture().await;
        let err = f
            .collector
            .submit_result(&ctx(9), 0, "val-9", RESULT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Chain(ChainError::InsufficientFunds { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_task_is_a_validation_failure() {
        let f = fixture().await;
        let err = f
            .collector
            .submit_result(&ctx(2), 42, "val-2", RESULT)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::UnknownTask(42))));
    }

    #[tokio::test]
    async fn finalized_task_refuses_further_submissions() {
        let f = fixture().await;
        f.collector
            .submit_result(&ctx(2), 0, "val-2", RESULT)
            .await
            .unwrap();
        f.collector
            .submit_result(&ctx(3), 0, "val-3", RESULT)
            .await
            .unwrap();

        f.chain.fund(&addr(4), 1).unwrap();
        let err = f
            .collector
            .submit_result(&ctx(4), 0, "val-4", RESULT)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn unverified_result_shape_is_accepted() {
        let f = fixture().await;
        // Not CID-shaped; logged, not blocked.
        let stored = f
            .collector
            .submit_result(&ctx(2), 0, "val-2", "opaque-result-ref")
            .await
            .unwrap();
        assert_eq!(stored.result_cid, "opaque-result-ref");
    }

    #[tokio::test]
    async fn validator_task_queries_split_by_completion() {
        let f = fixture().await;
        f.collector
            .submit_result(&ctx(2), 0, "val-2", RESULT)
            .await
            .unwrap();

        let active = f
            .collector
            .active_tasks_for_validator("val-2")
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert!(f
            .collector
            .completed_tasks_for_validator("val-2")
            .await
            .unwrap()
            .is_empty());

        f.collector
            .submit_result(&ctx(3), 0, "val-3", RESULT)
            .await
            .unwrap();
        assert!(f
            .collector
            .active_tasks_for_validator("val-2")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            f.collector
                .completed_tasks_for_validator("val-2")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn submission_order_is_preserved() {
        let f = fixture().await;
        f.collector
            .submit_result(&ctx(2), 0, "val-2", RESULT)
            .await
            .unwrap();
        f.collector
            .submit_result(&ctx(3), 0, "val-3", RESULT)
            .await
            .unwrap();
        let rows = f.collector.submissions_by_task(0).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].validator_id, "val-2");
        assert_eq!(rows[1].validator_id, "val-3");
        assert!(rows[0].submitted_at <= rows[1].submitted_at);
    }
}
