//! Dispatch layer for taskrelay.
//!
//! An instruction flows through three stages:
//!
//! 1. **Classify**: an [`IntentClassifier`](taskrelay_core::IntentClassifier)
//!    maps free text to a capability name and parameters, or to nothing
//! 2. **Execute**: the [`Executor`] looks the capability up, validates the
//!    parameters, runs the handler under a timeout and audits the outcome
//! 3. **Reply**: the [`Orchestrator`] turns the envelope into user-facing text

pub mod classifier;
pub mod executor;
pub mod orchestrator;
pub mod reply;

pub use classifier::KeywordClassifier;
pub use executor::Executor;
pub use orchestrator::{CALLER_PARAMETER, Orchestrator, OrchestratorReply};
