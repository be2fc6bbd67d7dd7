//! Chain seam for the validation-bounty contract.
//!
//! [`ChainClient`] abstracts the EVM test network the workflow writes to:
//! identity and balance reads, call simulation, transaction submission,
//! and the read-only task views. The engine never talks to a provider
//! directly, which keeps every on-chain path testable against
//! [`SimChain`], the in-process deterministic implementation.
//!
//! Writes require a [`SigningContext`], an explicit capability carrying
//! the actor's wallet and expected network, passed into every operation
//! instead of living in ambient state.

mod error;
mod sim;

pub use error::ChainError;
pub use sim::SimChain;

use async_trait::async_trait;
use veridoc_core::Address;

/// Explicit signing capability for on-chain writes.
///
/// Wraps what the browser wallet provider supplies: an account that can
/// sign and send, plus the chain it believes it is connected to. A
/// mismatch with the client's actual chain id must surface as
/// [`ChainError::WrongNetwork`] before any write.
#[derive(Debug, Clone)]
pub struct SigningContext {
    pub wallet: Address,
    pub chain_id: u64,
}

impl SigningContext {
    pub fn new(wallet: Address, chain_id: u64) -> Self {
        Self { wallet, chain_id }
    }
}

/// Parameters of a `createTask` call. `value` is the full escrow,
/// reward pool plus issuer bonus.
#[derive(Debug, Clone)]
pub struct CreateTaskCall {
    pub contract: Address,
    pub content_id: String,
    pub required_validators: u32,
    pub issuer_wallet: Address,
    pub value: u128,
}

/// Parameters of a `submitResult` call.
#[derive(Debug, Clone)]
pub struct SubmitResultCall {
    pub contract: Address,
    pub task_id: u64,
    pub result_cid: String,
}

/// The creation event emitted by `createTask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCreated {
    pub task_id: u64,
    pub escrowed: u128,
}

/// Receipt for a confirmed transaction.
///
/// `task_created` is present when the creation event was observed in the
/// receipt logs. Its absence is not proof the task was not created, since
/// some RPC providers drop logs, which is why task-id recovery has a
/// counter fallback.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub task_created: Option<TaskCreated>,
}

/// On-chain view of a task, read without gas.
#[derive(Debug, Clone, Copy)]
pub struct TaskInfo {
    pub required_validators: u32,
    pub submission_count: u32,
    pub finalized: bool,
    /// Validator reward pool, net of the issuer bonus.
    pub reward_pool: u128,
}

/// Client for the validation-bounty contract on one EVM network.
///
/// Simulation methods perform the same checks as their `send_` twins
/// without changing state; a simulated revert means the broadcast would
/// burn gas for nothing and must abort the operation. No method retries:
/// once broadcast, a transaction either confirms or must be superseded
/// externally, so transient failures surface to the actor instead.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    async fn balance(&self, wallet: &Address) -> Result<u128, ChainError>;

    /// Whether deployed bytecode exists at the address.
    async fn has_code(&self, contract: &Address) -> Result<bool, ChainError>;

    async fn simulate_create_task(
        &self,
        ctx: &SigningContext,
        call: &CreateTaskCall,
    ) -> Result<(), ChainError>;

    async fn send_create_task(
        &self,
        ctx: &SigningContext,
        call: &CreateTaskCall,
    ) -> Result<TxReceipt, ChainError>;

    async fn simulate_submit_result(
        &self,
        ctx: &SigningContext,
        call: &SubmitResultCall,
    ) -> Result<(), ChainError>;

    async fn send_submit_result(
        &self,
        ctx: &SigningContext,
        call: &SubmitResultCall,
    ) -> Result<TxReceipt, ChainError>;

    /// `getSubmissionCount(taskId)`.
    async fn submission_count(&self, contract: &Address, task_id: u64) -> Result<u32, ChainError>;

    /// `getTaskInfo(taskId)`.
    async fn task_info(&self, contract: &Address, task_id: u64) -> Result<TaskInfo, ChainError>;

    /// The contract's monotonically increasing task counter; the most
    /// recently assigned id is `counter - 1`.
    async fn task_counter(&self, contract: &Address) -> Result<u64, ChainError>;
}
