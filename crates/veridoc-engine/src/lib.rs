//! Claim verification workflow engine.
//!
//! Takes a claim's document from scoring through bucket routing, on-chain
//! task creation, validator submission collection, quorum completion, and
//! claim settlement. Generic over the mirror store and chain seams so the
//! whole pipeline runs unchanged against the in-process test doubles and
//! the real backend/provider pair.

mod error;
pub mod registry;
pub mod scoring;
pub mod settlement;
pub mod submissions;
pub mod tasks;

pub use error::EngineError;
pub use registry::ContractRegistry;
pub use scoring::ScoringService;
pub use settlement::{Decision, ResolveOutcome, SettlementResolver};
pub use submissions::SubmissionCollector;
pub use tasks::{CreateTaskRequest, TaskLifecycleManager};
