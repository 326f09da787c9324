//! Review domain: data model, orchestration, aggregation, and the pipeline

pub mod aggregate;
pub mod orchestrator;
pub mod pipeline;
mod types;

pub use orchestrator::{DispatchOutcome, Orchestrator, PairFailure, ReviewMode};
pub use pipeline::{AgentInfo, Health, Pipeline, Stats};
pub use types::{Category, Review, ReviewComment, ReviewStage, Severity};
