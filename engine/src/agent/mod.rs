//! Recommendation agent
//!
//! This module runs user queries through the two-model pipeline: a
//! classifier that decides whether to search the catalog, and a generator
//! that writes the ranked recommendation. Conversation state lives in an
//! explicit [`Session`] owned by the caller.

pub mod orchestrator;
pub mod prompts;
pub mod recommendations;
pub mod session;

pub use orchestrator::{
    Decision, Orchestrator, OrchestratorSettings, PipelineTrace, QueryOutcome, Stage,
};
pub use recommendations::{parse_recommendations, resolve_picks, RankedPick};
pub use session::{Session, Transcript};
