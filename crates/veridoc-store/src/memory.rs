//! In-memory mirror store.
//!
//! Backs tests and the local demo flow. A single `RwLock` over the whole
//! dataset stands in for the backend's transactional guarantees: the
//! wallet-uniqueness and one-active-task-per-claim checks run under the
//! write lock, so racing writers observe a consistent winner.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;
use tracing::debug;
use veridoc_core::{
    Address, Claim, ClaimStatus, ContractRecord, ScoringRecord, SubmissionRecord, TaskRecord,
    TaskStatus, ThresholdConfig,
};

use crate::{MirrorStore, Page, StoreError, TaskQuery};

#[derive(Default)]
struct Inner {
    contracts: HashMap<Address, ContractRecord>,
    configs: HashMap<String, ThresholdConfig>,
    scores: HashMap<String, ScoringRecord>,
    claims: HashMap<String, Claim>,
    tasks: BTreeMap<u64, TaskRecord>,
    submissions: Vec<SubmissionRecord>,
    next_submission_id: u64,
}

/// In-memory [`MirrorStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MirrorStore for MemoryStore {
    async fn contract_for_wallet(
        &self,
        wallet: &Address,
    ) -> Result<Option<ContractRecord>, StoreError> {
        Ok(self.inner.read().await.contracts.get(wallet).cloned())
    }

    async fn register_contract(
        &self,
        record: ContractRecord,
    ) -> Result<ContractRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.contracts.get(&record.wallet) {
            debug!(
                wallet = %record.wallet,
                existing = %existing.contract_address,
                "wallet already registered, returning existing contract"
            );
            return Ok(existing.clone());
        }
        inner.contracts.insert(record.wallet.clone(), record.clone());
        Ok(record)
    }

    async fn threshold_config(
        &self,
        insurance_id: &str,
    ) -> Result<Option<ThresholdConfig>, StoreError> {
        Ok(self.inner.read().await.configs.get(insurance_id).cloned())
    }

    async fn put_threshold_config(
        &self,
        insurance_id: &str,
        config: ThresholdConfig,
    ) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .configs
            .insert(insurance_id.to_string(), config);
        Ok(())
    }

    async fn upsert_score(&self, record: ScoringRecord) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .scores
            .insert(record.claim_id.clone(), record);
        Ok(())
    }

    async fn score_for_claim(&self, claim_id: &str) -> Result<Option<ScoringRecord>, StoreError> {
        Ok(self.inner.read().await.scores.get(claim_id).cloned())
    }

    async fn scores_for_claims(
        &self,
        claim_ids: &[String],
    ) -> Result<Vec<ScoringRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(claim_ids
            .iter()
            .filter_map(|id| inner.scores.get(id).cloned())
            .collect())
    }

    async fn insert_claim(&self, claim: Claim) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .claims
            .insert(claim.claim_id.clone(), claim);
        Ok(())
    }

    async fn claim(&self, claim_id: &str) -> Result<Option<Claim>, StoreError> {
        Ok(self.inner.read().await.claims.get(claim_id).cloned())
    }

    async fn claims_with_status(&self, status: ClaimStatus) -> Result<Vec<Claim>, StoreError> {
        let inner = self.inner.read().await;
        let mut claims: Vec<Claim> = inner
            .claims
            .values()
            .filter(|c| c.status == status)
            .cloned()
            .collect();
        claims.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(claims)
    }

    async fn update_claim(
        &self,
        claim_id: &str,
        status: ClaimStatus,
        verified: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let claim = inner
            .claims
            .get_mut(claim_id)
            .ok_or_else(|| StoreError::UnknownClaim(claim_id.to_string()))?;
        claim.status = status;
        claim.verified = verified;
        Ok(())
    }

    async fn insert_task(&self, task: TaskRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let active = inner
            .tasks
            .values()
            .any(|t| t.claim_id == task.claim_id && !t.status.is_terminal());
        if active {
            return Err(StoreError::TaskAlreadyActive(task.claim_id));
        }
        inner.tasks.insert(task.task_id, task);
        Ok(())
    }

    async fn task(&self, task_id: u64) -> Result<Option<TaskRecord>, StoreError> {
        Ok(self.inner.read().await.tasks.get(&task_id).cloned())
    }

    async fn task_for_claim(&self, claim_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .values()
            .filter(|t| t.claim_id == claim_id)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn set_task_status(&self, task_id: u64, status: TaskStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(&task_id)
            .ok_or(StoreError::UnknownTask(task_id))?;
        task.status = status;
        Ok(())
    }

    async fn query_tasks(&self, query: &TaskQuery) -> Result<Page<TaskRecord>, StoreError> {
        let inner = self.inner.read().await;
        let needle = query.search.as_deref().map(str::to_ascii_lowercase);
        let matches: Vec<TaskRecord> = inner
            .tasks
            .values()
            .filter(|t| query.status.is_none_or(|s| t.status == s))
            .filter(|t| {
                query
                    .issuer_wallet
                    .as_ref()
                    .is_none_or(|w| &t.issuer_wallet == w)
            })
            .filter(|t| {
                needle.as_deref().is_none_or(|n| {
                    t.content_id.to_ascii_lowercase().contains(n)
                        || t.claim_id.to_ascii_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();

        let page = query.page.max(1);
        let page_size = if query.page_size == 0 {
            TaskQuery::DEFAULT_PAGE_SIZE
        } else {
            query.page_size
        };
        let total = matches.len();
        let items = matches
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    async fn append_submission(
        &self,
        mut submission: SubmissionRecord,
    ) -> Result<SubmissionRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.tasks.contains_key(&submission.task_id) {
            return Err(StoreError::UnknownTask(submission.task_id));
        }
        let duplicate = inner
            .submissions
            .iter()
            .any(|s| s.task_id == submission.task_id && s.validator_id == submission.validator_id);
        if duplicate {
            return Err(StoreError::DuplicateSubmission {
                task_id: submission.task_id,
                validator_id: submission.validator_id,
            });
        }
        inner.next_submission_id += 1;
        submission.submission_id = inner.next_submission_id;
        inner.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn submissions_by_task(
        &self,
        task_id: u64,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut subs: Vec<SubmissionRecord> = inner
            .submissions
            .iter()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect();
        subs.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(subs)
    }

    async fn submissions_by_validator(
        &self,
        validator_id: &str,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .iter()
            .filter(|s| s.validator_id == validator_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{n:040x}")).unwrap()
    }

    fn contract(wallet: Address, contract_address: Address) -> ContractRecord {
        ContractRecord {
            user_id: "user-1".into(),
            wallet,
            contract_address,
            created_at: Utc::now(),
        }
    }

    fn task(task_id: u64, claim_id: &str, status: TaskStatus) -> TaskRecord {
        TaskRecord {
            task_id,
            contract_address: addr(9),
            claim_id: claim_id.into(),
            content_id: "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi".into(),
            required_validators: 2,
            reward_amount: 1,
            issuer_wallet: addr(1),
            creation_tx: format!("0x{task_id:064x}"),
            status,
            created_at: Utc::now(),
        }
    }

    fn submission(task_id: u64, validator_id: &str) -> SubmissionRecord {
        SubmissionRecord {
            submission_id: 0,
            task_id,
            validator_id: validator_id.into(),
            result_cid: "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG".into(),
            tx_hash: "0xff".into(),
            wallet: addr(7),
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn register_contract_is_idempotent() {
        let store = MemoryStore::new();
        let first = store
            .register_contract(contract(addr(1), addr(10)))
            .await
            .unwrap();
        // Second registration with a different proposed address loses.
        let second = store
            .register_contract(contract(addr(1), addr(11)))
            .await
            .unwrap();
        assert_eq!(first.contract_address, addr(10));
        assert_eq!(second.contract_address, addr(10));
    }

    #[tokio::test]
    async fn concurrent_registrations_converge() {
        let store = Arc::new(MemoryStore::new());
        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.register_contract(contract(addr(1), addr(10))).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.register_contract(contract(addr(1), addr(11))).await })
        };
        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        // Both callers see the same winner, whichever it was.
        assert_eq!(a.contract_address, b.contract_address);
        let stored = store.contract_for_wallet(&addr(1)).await.unwrap().unwrap();
        assert_eq!(stored.contract_address, a.contract_address);
    }

    #[tokio::test]
    async fn one_active_task_per_claim() {
        let store = MemoryStore::new();
        store
            .insert_task(task(1, "clm-1", TaskStatus::Pending))
            .await
            .unwrap();
        let err = store
            .insert_task(task(2, "clm-1", TaskStatus::Pending))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TaskAlreadyActive(_)));
        // A terminal task frees the claim for a new one.
        store.set_task_status(1, TaskStatus::Completed).await.unwrap();
        store
            .insert_task(task(2, "clm-1", TaskStatus::Pending))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_submission_refused() {
        let store = MemoryStore::new();
        store
            .insert_task(task(1, "clm-1", TaskStatus::Pending))
            .await
            .unwrap();
        let first = store.append_submission(submission(1, "val-1")).await.unwrap();
        assert_eq!(first.submission_id, 1);
        let err = store
            .append_submission(submission(1, "val-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSubmission { .. }));
        // Same validator on another task is fine.
        store
            .insert_task(task(2, "clm-2", TaskStatus::Pending))
            .await
            .unwrap();
        store.append_submission(submission(2, "val-1")).await.unwrap();
    }

    #[tokio::test]
    async fn submission_for_unknown_task_refused() {
        let store = MemoryStore::new();
        let err = store
            .append_submission(submission(99, "val-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownTask(99)));
    }

    #[tokio::test]
    async fn task_query_filters_and_paginates() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let mut t = task(i, &format!("clm-{i}"), TaskStatus::Pending);
            if i >= 3 {
                t.status = TaskStatus::Completed;
            }
            store.insert_task(t).await.unwrap();
        }

        let pending = store
            .query_tasks(&TaskQuery {
                status: Some(TaskStatus::Pending),
                page: 1,
                page_size: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.total, 3);
        assert_eq!(pending.items.len(), 2);

        let page2 = store
            .query_tasks(&TaskQuery {
                status: Some(TaskStatus::Pending),
                page: 2,
                page_size: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page2.items.len(), 1);

        let searched = store
            .query_tasks(&TaskQuery {
                search: Some("CLM-4".into()),
                page: 1,
                page_size: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.total, 1);
        assert_eq!(searched.items[0].claim_id, "clm-4");
    }

    #[tokio::test]
    async fn claims_with_status_scopes_the_queues() {
        let store = MemoryStore::new();
        for (id, status) in [
            ("clm-a", ClaimStatus::Pending),
            ("clm-b", ClaimStatus::Pending),
            ("clm-c", ClaimStatus::Approved),
        ] {
            store
                .insert_claim(Claim {
                    claim_id: id.into(),
                    patient_id: "pat".into(),
                    insurance_id: "ins".into(),
                    document_locator: "doc".into(),
                    verified: false,
                    status,
                    issuer_id: None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        assert_eq!(
            store
                .claims_with_status(ClaimStatus::Pending)
                .await
                .unwrap()
                .len(),
            2
        );
        // Approving removes the claim from the pending queue by scoping.
        store
            .update_claim("clm-a", ClaimStatus::Approved, true)
            .await
            .unwrap();
        assert_eq!(
            store
                .claims_with_status(ClaimStatus::Pending)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn threshold_config_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.threshold_config("ins-1").await.unwrap().is_none());
        let cfg = ThresholdConfig::new(20.0, 50.0, 90.0).unwrap();
        store.put_threshold_config("ins-1", cfg.clone()).await.unwrap();
        assert_eq!(store.threshold_config("ins-1").await.unwrap(), Some(cfg));
    }

    #[tokio::test]
    async fn score_upsert_overwrites() {
        let store = MemoryStore::new();
        store
            .upsert_score(ScoringRecord {
                claim_id: "clm-1".into(),
                score: 45.0,
                evaluated_at: Utc::now(),
            })
            .await
            .unwrap();
        store
            .upsert_score(ScoringRecord {
                claim_id: "clm-1".into(),
                score: 72.0,
                evaluated_at: Utc::now(),
            })
            .await
            .unwrap();
        let record = store.score_for_claim("clm-1").await.unwrap().unwrap();
        assert_eq!(record.score, 72.0);
    }
}
