//! Shared domain records for the claim verification workflow.
//!
//! These are the wire-facing shapes exchanged with the backend persistence
//! API and mirrored from on-chain state. Reward amounts are `u128` token
//! base units (see [`crate::amount`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An EVM-style account address, stored lowercased.
///
/// Parsing enforces the `0x` + 40 hex digits shape only. Checksum casing is
/// not validated; the chain is the authority on whether an account exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Parse and normalise an address string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| CoreError::MalformedAddress(s.to_string()))?;
        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::MalformedAddress(s.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routing decision derived from a claim's trust score.
///
/// Ordered `Unscored < Reject < Manual < Auto` so that classifier
/// monotonicity can be stated as `score1 < score2 implies bucket1 <= bucket2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// No scoring record exists yet. Never produced by the classifier.
    Unscored,
    Reject,
    Manual,
    Auto,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unscored => "unscored",
            Self::Reject => "reject",
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

/// Per-insurer thresholds controlling bucket routing.
///
/// Each field is optional on the wire; unset fields fall back to the
/// platform defaults 30/60/80. The resolved values must satisfy
/// `reject <= manual <= auto`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Scores strictly below this are rejected.
    pub rejection_threshold: Option<f64>,
    /// Lower bound of the manual-review band.
    pub manual_review_threshold: Option<f64>,
    /// Scores at or above this are auto-approved.
    pub auto_approval_threshold: Option<f64>,
}

impl ThresholdConfig {
    pub const DEFAULT_REJECT: f64 = 30.0;
    pub const DEFAULT_MANUAL: f64 = 60.0;
    pub const DEFAULT_AUTO: f64 = 80.0;

    /// Build a config from explicit values, validating the ordering.
    pub fn new(reject: f64, manual: f64, auto: f64) -> Result<Self, CoreError> {
        if !(reject <= manual && manual <= auto) {
            return Err(CoreError::InvalidThresholds {
                reject,
                manual,
                auto,
            });
        }
        Ok(Self {
            rejection_threshold: Some(reject),
            manual_review_threshold: Some(manual),
            auto_approval_threshold: Some(auto),
        })
    }

    pub fn reject(&self) -> f64 {
        self.rejection_threshold.unwrap_or(Self::DEFAULT_REJECT)
    }

    pub fn manual(&self) -> f64 {
        self.manual_review_threshold.unwrap_or(Self::DEFAULT_MANUAL)
    }

    pub fn auto(&self) -> f64 {
        self.auto_approval_threshold.unwrap_or(Self::DEFAULT_AUTO)
    }

    /// Check the resolved values for ordering violations.
    ///
    /// Partially-set configs read from the backend may combine a custom
    /// threshold with defaults in an inconsistent order; callers should
    /// validate before classifying.
    pub fn validate(&self) -> Result<(), CoreError> {
        let (r, m, a) = (self.reject(), self.manual(), self.auto());
        if r <= m && m <= a {
            Ok(())
        } else {
            Err(CoreError::InvalidThresholds {
                reject: r,
                manual: m,
                auto: a,
            })
        }
    }
}

/// Lifecycle status of an insurance claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    /// Terminal statuses are final; no further task creation or resolution
    /// is permitted for the claim.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// An insurance claim document awaiting adjudication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,
    pub patient_id: String,
    pub insurance_id: String,
    /// Raw client-supplied locator; normalise via [`crate::cid`] before
    /// putting it on chain.
    pub document_locator: String,
    /// Set true only by automated approval or a completed validator quorum.
    pub verified: bool,
    pub status: ClaimStatus,
    pub issuer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One authoritative AI trust score per claim.
///
/// Re-evaluation overwrites the previous record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRecord {
    pub claim_id: String,
    /// Trust score in [0, 100].
    pub score: f64,
    pub evaluated_at: DateTime<Utc>,
}

/// One validation-bounty contract per wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    pub user_id: String,
    pub wallet: Address,
    pub contract_address: Address,
    pub created_at: DateTime<Utc>,
}

/// Status of an on-chain validation task's off-chain mirror record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Escrowed and awaiting validator submissions.
    Pending,
    /// Quorum reached; reward distribution pending or in flight.
    Completed,
    /// Rewards distributed on chain.
    Finalized,
    /// Lapsed past the SLA deadline without reaching quorum. Set by an
    /// external reconciliation pass, never by this workflow.
    Expired,
}

impl TaskStatus {
    /// Once a task leaves `Pending`, the claim may open a new one.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Off-chain mirror of an on-chain validation task.
///
/// Eventually consistent with chain state. Readers gating irreversible
/// actions must re-read the chain rather than trust this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// On-chain task identifier within the owning contract.
    pub task_id: u64,
    pub contract_address: Address,
    pub claim_id: String,
    pub content_id: String,
    pub required_validators: u32,
    /// Validator reward pool in token base units, excluding the issuer bonus.
    pub reward_amount: u128,
    pub issuer_wallet: Address,
    pub creation_tx: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

/// One validator's recorded result for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submission_id: u64,
    pub task_id: u64,
    pub validator_id: String,
    pub result_cid: String,
    pub tx_hash: String,
    pub wallet: Address,
    pub submitted_at: DateTime<Utc>,
}
