use thiserror::Error;
use veridoc_core::Address;

/// Chain-side failures, split so callers can tell logical rejection from
/// infrastructure trouble.
///
/// [`Reverted`](ChainError::Reverted) means the VM would refuse (or did
/// refuse) the call and carries the decoded reason; everything else is the
/// environment: wrong network, unfunded wallet, missing bytecode, or the
/// RPC endpoint itself. The distinction drives user-facing messaging,
/// which must prompt corrective action rather than blind retry.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("wrong network: connected to chain {actual}, expected {expected}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("wallet {wallet} cannot cover the transaction (balance {balance})")]
    InsufficientFunds { wallet: Address, balance: u128 },

    #[error("no contract bytecode at {0}")]
    NoCode(Address),

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("rpc failure: {0}")]
    Rpc(String),

    #[error("unknown task {task_id} on contract {contract}")]
    UnknownTask { contract: Address, task_id: u64 },

    #[error("could not correlate the new task id from receipt events or the task counter")]
    TaskIdUnavailable,
}
