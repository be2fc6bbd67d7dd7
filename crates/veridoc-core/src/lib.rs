pub mod amount;
pub mod cid;
pub mod classify;
pub mod error;
pub mod types;

pub use amount::{escrow_total, format_amount, parse_amount, payout_split, PayoutSplit};
pub use cid::{looks_like_cid, normalize_cid};
pub use classify::classify;
pub use error::CoreError;
pub use types::{
    Address, Bucket, Claim, ClaimStatus, ContractRecord, ScoringRecord, SubmissionRecord,
    TaskRecord, TaskStatus, ThresholdConfig,
};
