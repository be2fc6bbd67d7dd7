//! Settlement: reconciling claim status once validators have spoken.
//!
//! Reward distribution is the contract's job and happens on chain at
//! finalization; this resolver only brings the off-chain claim records in
//! line and exposes the audit trail. Bulk operations report per-claim
//! outcomes; one ineligible claim never aborts the rest.

use std::sync::Arc;

use tracing::{info, warn};
use veridoc_chain::ChainClient;
use veridoc_core::{ClaimStatus, SubmissionRecord, TaskStatus};
use veridoc_store::MirrorStore;

use crate::EngineError;

/// The insurer's verdict for a batch of claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Per-claim outcome of a bulk resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Updated {
        claim_id: String,
        status: ClaimStatus,
    },
    Skipped {
        claim_id: String,
        reason: String,
    },
    NotFound {
        claim_id: String,
    },
}

pub struct SettlementResolver<S, C> {
    store: Arc<S>,
    chain: Arc<C>,
}

impl<S: MirrorStore, C: ChainClient> SettlementResolver<S, C> {
    pub fn new(store: Arc<S>, chain: Arc<C>) -> Self {
        Self { store, chain }
    }

    /// Resolve a batch of claims, one outcome per id, in input order.
    ///
    /// Approval requires the claim's document to be verified or its task to
    /// have reached quorum; the task check re-reads chain state rather than
    /// trusting the mirror, since approval is irreversible. Rejection has
    /// no precondition beyond the claim existing and not already being
    /// terminal.
    pub async fn bulk_resolve(
        &self,
        claim_ids: &[String],
        decision: Decision,
    ) -> Result<Vec<ResolveOutcome>, EngineError> {
        let mut outcomes = Vec::with_capacity(claim_ids.len());
        for claim_id in claim_ids {
            let outcome = match self.resolve_one(claim_id, decision).await {
                Ok(outcome) => outcome,
                // Per-item failure reports and moves on.
                Err(err) => {
                    warn!(claim_id = %claim_id, error = %err, "claim resolution failed");
                    ResolveOutcome::Skipped {
                        claim_id: claim_id.clone(),
                        reason: err.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn resolve_one(
        &self,
        claim_id: &str,
        decision: Decision,
    ) -> Result<ResolveOutcome, EngineError> {
        let Some(claim) = self.store.claim(claim_id).await? else {
            return Ok(ResolveOutcome::NotFound {
                claim_id: claim_id.to_string(),
            });
        };
        if claim.status.is_terminal() {
            return Ok(ResolveOutcome::Skipped {
                claim_id: claim_id.to_string(),
                reason: format!("already {}", claim.status.as_str()),
            });
        }

        match decision {
            Decision::Reject => {
                self.store
                    .update_claim(claim_id, ClaimStatus::Rejected, claim.verified)
                    .await?;
                info!(claim_id, "claim rejected");
                Ok(ResolveOutcome::Updated {
                    claim_id: claim_id.to_string(),
                    status: ClaimStatus::Rejected,
                })
            }
            Decision::Approve => {
                if !claim.verified && !self.quorum_reached(claim_id).await? {
                    return Ok(ResolveOutcome::Skipped {
                        claim_id: claim_id.to_string(),
                        reason: "document not verified and no completed validation task".into(),
                    });
                }
                self.store
                    .update_claim(claim_id, ClaimStatus::Approved, true)
                    .await?;
                info!(claim_id, "claim approved");
                Ok(ResolveOutcome::Updated {
                    claim_id: claim_id.to_string(),
                    status: ClaimStatus::Approved,
                })
            }
        }
    }

    /// Whether the claim's task has reached quorum, preferring chain state
    /// over the mirror and catching the mirror up when they disagree.
    async fn quorum_reached(&self, claim_id: &str) -> Result<bool, EngineError> {
        let Some(task) = self.store.task_for_claim(claim_id).await? else {
            return Ok(false);
        };
        let info = self
            .chain
            .task_info(&task.contract_address, task.task_id)
            .await?;
        let reached = info.finalized || info.submission_count >= info.required_validators;

        if info.finalized && task.status != TaskStatus::Finalized {
            // The contract already paid out; mirror lagged.
            self.store
                .set_task_status(task.task_id, TaskStatus::Finalized)
                .await?;
        } else if reached && task.status == TaskStatus::Pending {
            self.store
                .set_task_status(task.task_id, TaskStatus::Completed)
                .await?;
        }
        Ok(reached)
    }

    /// Who submitted what, when, at which transaction, for a claim's task.
    pub async fn audit_trail(
        &self,
        claim_id: &str,
    ) -> Result<Vec<SubmissionRecord>, EngineError> {
        let Some(task) = self.store.task_for_claim(claim_id).await? else {
            return Ok(Vec::new());
        };
        Ok(self.store.submissions_by_task(task.task_id).await?)
    }
}
