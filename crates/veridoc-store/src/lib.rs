//! Off-chain mirror store for the claim verification workflow.
//!
//! The store holds the fast-query copy of on-chain task and submission
//! state plus the purely off-chain records (claims, scores, threshold
//! configs, contract registrations). It is eventually consistent with the
//! chain; nothing here is authoritative for gating irreversible actions.
//!
//! [`MirrorStore`] is the trait seam the engine works against. The
//! in-process [`MemoryStore`] backs tests and local demos; production
//! deployments sit behind the backend persistence API instead (see the
//! `veridoc-sync` crate).

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use veridoc_core::{
    Address, Claim, ClaimStatus, ContractRecord, ScoringRecord, SubmissionRecord, TaskRecord,
    TaskStatus, ThresholdConfig,
};

/// Filter and pagination parameters for task-mirror queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_wallet: Option<Address>,
    /// Free-text match over document locator or claim id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// 1-based page index.
    pub page: usize,
    pub page_size: usize,
}

impl TaskQuery {
    pub const DEFAULT_PAGE_SIZE: usize = 20;
}

/// One page of query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matches across all pages.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Persistence seam for the verification workflow.
///
/// Write operations encode the workflow's two exclusion invariants:
/// [`register_contract`](MirrorStore::register_contract) keeps at most one
/// contract per wallet, and [`insert_task`](MirrorStore::insert_task) keeps
/// at most one active task per claim.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    // ── Contract registry ──

    async fn contract_for_wallet(
        &self,
        wallet: &Address,
    ) -> Result<Option<ContractRecord>, StoreError>;

    /// Register a contract for a wallet, or return the existing record.
    ///
    /// Idempotent under races: when two registrations for the same wallet
    /// collide, both callers receive the record that won. The caller can
    /// tell which happened by comparing addresses; neither path is an error.
    async fn register_contract(
        &self,
        record: ContractRecord,
    ) -> Result<ContractRecord, StoreError>;

    // ── Threshold configuration ──

    async fn threshold_config(
        &self,
        insurance_id: &str,
    ) -> Result<Option<ThresholdConfig>, StoreError>;

    async fn put_threshold_config(
        &self,
        insurance_id: &str,
        config: ThresholdConfig,
    ) -> Result<(), StoreError>;

    // ── Scoring records ──

    /// Insert or overwrite the authoritative score for a claim.
    async fn upsert_score(&self, record: ScoringRecord) -> Result<(), StoreError>;

    async fn score_for_claim(&self, claim_id: &str) -> Result<Option<ScoringRecord>, StoreError>;

    async fn scores_for_claims(
        &self,
        claim_ids: &[String],
    ) -> Result<Vec<ScoringRecord>, StoreError>;

    // ── Claims ──

    async fn insert_claim(&self, claim: Claim) -> Result<(), StoreError>;

    async fn claim(&self, claim_id: &str) -> Result<Option<Claim>, StoreError>;

    /// Claims filtered by lifecycle status. Pending queues are status
    /// filters over this, never separate collections.
    async fn claims_with_status(&self, status: ClaimStatus) -> Result<Vec<Claim>, StoreError>;

    async fn update_claim(
        &self,
        claim_id: &str,
        status: ClaimStatus,
        verified: bool,
    ) -> Result<(), StoreError>;

    // ── Task mirror ──

    async fn insert_task(&self, task: TaskRecord) -> Result<(), StoreError>;

    async fn task(&self, task_id: u64) -> Result<Option<TaskRecord>, StoreError>;

    /// The most recent task for a claim, if any.
    async fn task_for_claim(&self, claim_id: &str) -> Result<Option<TaskRecord>, StoreError>;

    async fn set_task_status(&self, task_id: u64, status: TaskStatus) -> Result<(), StoreError>;

    async fn query_tasks(&self, query: &TaskQuery) -> Result<Page<TaskRecord>, StoreError>;

    // ── Submissions ──

    /// Append a submission row, assigning its id.
    ///
    /// A second row for the same (task, validator) pair is refused with
    /// [`StoreError::DuplicateSubmission`] so replays never double-credit.
    async fn append_submission(
        &self,
        submission: SubmissionRecord,
    ) -> Result<SubmissionRecord, StoreError>;

    /// Submissions for a task, ordered by submission time.
    async fn submissions_by_task(
        &self,
        task_id: u64,
    ) -> Result<Vec<SubmissionRecord>, StoreError>;

    async fn submissions_by_validator(
        &self,
        validator_id: &str,
    ) -> Result<Vec<SubmissionRecord>, StoreError>;
}
