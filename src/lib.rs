//! Foundry: an AI software-factory orchestrator.
//!
//! Projects move through a fixed phase workflow (discovery through
//! complete). Reasoning phases are decided by a lead agent backed by
//! specialist agents; code generation is routed between a local and a
//! remote backend by a deterministic complexity score, then verified by a
//! three-stage build/runtime/test pipeline before the project is declared
//! hand-off ready.

pub mod agents;
pub mod artifact;
pub mod completion;
pub mod config;
pub mod errors;
pub mod history;
pub mod llm;
pub mod notify;
pub mod orchestrator;
pub mod phase;
pub mod project;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod store;
pub mod supervisor;
pub mod tasks;
pub mod verify;

pub use config::Config;
pub use errors::{PhaseError, StoreError, SupervisorError};
pub use orchestrator::ProjectOrchestrator;
pub use phase::Phase;
pub use project::{Project, ProjectStatus};
