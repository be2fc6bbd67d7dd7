use thiserror::Error;
use veridoc_chain::ChainError;
use veridoc_core::{Address, CoreError};
use veridoc_store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad input caught before any network call; no side effects.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("no validation contract configured for wallet {0}")]
    NoContractConfigured(Address),

    /// The dry run predicts the creation call would revert on chain; the
    /// transaction was never broadcast.
    #[error("task creation would revert: {reason}")]
    TaskCreationWouldRevert { reason: String },

    /// The dry run predicts the submission call would revert on chain; the
    /// transaction was never broadcast.
    #[error("submission would revert: {reason}")]
    SubmissionWouldRevert { reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
