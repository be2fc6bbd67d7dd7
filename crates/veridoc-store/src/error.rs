use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("claim {0} already has an active validation task")]
    TaskAlreadyActive(String),

    #[error("validator {validator_id} already submitted for task {task_id}")]
    DuplicateSubmission { task_id: u64, validator_id: String },

    #[error("unknown task {0}")]
    UnknownTask(u64),

    #[error("unknown claim {0}")]
    UnknownClaim(String),

    #[error("{0}")]
    Other(String),
}
