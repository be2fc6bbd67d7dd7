//! HTTP client for the backend persistence API.
//!
//! The backend owns the durable copies of threshold configs, contract
//! registrations, task mirror records, submission rows, claim statuses,
//! and AI scoring records. This client is plain JSON over HTTP; the
//! uniqueness and idempotency guarantees live server-side (unique key on
//! wallet for contracts, unique (task, validator) pair for submissions),
//! so a conflicting write comes back as the surviving row, not an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use veridoc_core::{
    Address, ClaimStatus, ContractRecord, ScoringRecord, SubmissionRecord, TaskRecord,
    ThresholdConfig,
};
use veridoc_store::{Page, TaskQuery};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for the backend persistence API.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

/// Per-claim outcome of a bulk status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Serialize)]
struct BulkUpdateRequest<'a> {
    claim_ids: &'a [String],
    status: ClaimStatus,
}

#[derive(Serialize)]
struct ScoreBatchRequest<'a> {
    claim_ids: &'a [String],
}

impl BackendClient {
    /// Create a client for the given backend base URL.
    ///
    /// `base_url` should be like `http://localhost:8080` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    // ── Threshold configuration ──

    /// Fetch an insurer's threshold config; `None` means platform defaults.
    pub async fn threshold_config(
        &self,
        insurance_id: &str,
    ) -> Result<Option<ThresholdConfig>, SyncError> {
        let url = format!("{}/api/insurances/{insurance_id}/thresholds", self.base_url);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(resp).await?.json().await?))
    }

    pub async fn put_threshold_config(
        &self,
        insurance_id: &str,
        config: &ThresholdConfig,
    ) -> Result<(), SyncError> {
        let url = format!("{}/api/insurances/{insurance_id}/thresholds", self.base_url);
        Self::check(self.client.put(&url).json(config).send().await?).await?;
        Ok(())
    }

    // ── Contract registry ──

    pub async fn contract_for_wallet(
        &self,
        wallet: &Address,
    ) -> Result<Option<ContractRecord>, SyncError> {
        let url = format!("{}/api/contracts/{wallet}", self.base_url);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(resp).await?.json().await?))
    }

    /// Register a contract for a wallet.
    ///
    /// The backend enforces the unique key on wallet and answers with the
    /// surviving record, so the loser of a registration race still gets a
    /// usable address back.
    pub async fn register_contract(
        &self,
        record: &ContractRecord,
    ) -> Result<ContractRecord, SyncError> {
        let url = format!("{}/api/contracts", self.base_url);
        info!(wallet = %record.wallet, "registering validation contract");
        let resp = Self::check(self.client.post(&url).json(record).send().await?).await?;
        Ok(resp.json().await?)
    }

    // ── Task mirror ──

    pub async fn create_task_record(&self, task: &TaskRecord) -> Result<(), SyncError> {
        let url = format!("{}/api/tasks", self.base_url);
        info!(task_id = task.task_id, claim_id = %task.claim_id, "persisting task mirror record");
        Self::check(self.client.post(&url).json(task).send().await?).await?;
        Ok(())
    }

    /// Query task mirror records with status/issuer filters, free-text
    /// search over document locator or claim id, and pagination.
    pub async fn query_tasks(&self, query: &TaskQuery) -> Result<Page<TaskRecord>, SyncError> {
        let url = format!("{}/api/tasks", self.base_url);
        let resp = Self::check(self.client.get(&url).query(query).send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn set_task_status(
        &self,
        task_id: u64,
        status: &str,
    ) -> Result<(), SyncError> {
        let url = format!("{}/api/tasks/{task_id}/status", self.base_url);
        Self::check(
            self.client
                .put(&url)
                .json(&serde_json::json!({ "status": status }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    // ── Submissions ──

    pub async fn append_submission(
        &self,
        submission: &SubmissionRecord,
    ) -> Result<SubmissionRecord, SyncError> {
        let url = format!("{}/api/submissions", self.base_url);
        let resp = Self::check(self.client.post(&url).json(submission).send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn submissions_by_task(
        &self,
        task_id: u64,
    ) -> Result<Vec<SubmissionRecord>, SyncError> {
        let url = format!("{}/api/tasks/{task_id}/submissions", self.base_url);
        let resp = Self::check(self.client.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn submissions_by_validator(
        &self,
        validator_id: &str,
    ) -> Result<Vec<SubmissionRecord>, SyncError> {
        let url = format!("{}/api/validators/{validator_id}/submissions", self.base_url);
        let resp = Self::check(self.client.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }

    // ── Claims and scoring ──

    /// Bulk-update claim statuses. Per-claim outcomes come back split into
    /// updated and skipped; a skipped claim never aborts the batch.
    pub async fn bulk_update_claims(
        &self,
        claim_ids: &[String],
        status: ClaimStatus,
    ) -> Result<BulkUpdateResponse, SyncError> {
        let url = format!("{}/api/claims/bulk-status", self.base_url);
        info!(count = claim_ids.len(), status = status.as_str(), "bulk claim status update");
        let resp = Self::check(
            self.client
                .post(&url)
                .json(&BulkUpdateRequest { claim_ids, status })
                .send()
                .await?,
        )
        .await?;
        Ok(resp.json().await?)
    }

    /// Fetch AI scoring records for a batch of claims. Claims without a
    /// record are simply absent from the response.
    pub async fn scores_for_claims(
        &self,
        claim_ids: &[String],
    ) -> Result<Vec<ScoringRecord>, SyncError> {
        let url = format!("{}/api/scores/batch", self.base_url);
        let resp = Self::check(
            self.client
                .post(&url)
                .json(&ScoreBatchRequest { claim_ids })
                .send()
                .await?,
        )
        .await?;
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn backend_client_trims_trailing_slash() {
        let client = BackendClient::new("http://localhost:8080/".into());
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn contract_record_json_roundtrip() {
        let record = ContractRecord {
            user_id: "user-42".into(),
            wallet: Address::parse("0x00000000000000000000000000000000000000aa").unwrap(),
            contract_address: Address::parse("0x00000000000000000000000000000000000000bb")
                .unwrap(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: ContractRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.wallet, record.wallet);
        assert_eq!(parsed.contract_address, record.contract_address);
    }

    #[test]
    fn task_record_json_preserves_u128_amounts() {
        let task = TaskRecord {
            task_id: 3,
            contract_address: Address::parse("0x00000000000000000000000000000000000000bb")
                .unwrap(),
            claim_id: "clm-9".into(),
            content_id: "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi".into(),
            required_validators: 2,
            reward_amount: 2_000_000_000_000_000_000,
            issuer_wallet: Address::parse("0x00000000000000000000000000000000000000aa").unwrap(),
            creation_tx: "0x01".into(),
            status: veridoc_core::TaskStatus::Pending,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&task).unwrap();
        let parsed: TaskRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.reward_amount, 2_000_000_000_000_000_000);
        assert_eq!(parsed.status, veridoc_core::TaskStatus::Pending);
    }

    #[test]
    fn task_query_serialises_only_set_filters() {
        let query = TaskQuery {
            status: Some(veridoc_core::TaskStatus::Pending),
            search: Some("clm-9".into()),
            page: 1,
            page_size: 20,
            ..Default::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["search"], "clm-9");
        assert!(json.get("issuer_wallet").is_none());
    }

    #[test]
    fn bulk_update_response_parses() {
        let json = r#"{ "updated": ["clm-1"], "skipped": ["clm-2"] }"#;
        let parsed: BulkUpdateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.updated, vec!["clm-1"]);
        assert_eq!(parsed.skipped, vec!["clm-2"]);
    }
}
