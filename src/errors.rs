//! Typed error hierarchy for the foundry orchestrator.
//!
//! Three top-level enums cover the three subsystems:
//! - `StoreError` — project persistence failures
//! - `PhaseError` — transition, approval, and revert failures
//! - `SupervisorError` — gated generation and routing failures

use crate::phase::Phase;
use thiserror::Error;
use uuid::Uuid;

/// Errors from the project store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Project {id} not found")]
    ProjectNotFound { id: Uuid },

    #[error("Failed to write project file at {path}: {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read project file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize project {id}: {source}")]
    SerializeFailed {
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },

    #[error("Project store lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from phase transitions and approval flow.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("Cannot revert from {from} to {to}: target does not precede current phase")]
    InvalidRevert { from: Phase, to: Phase },

    #[error("Cannot revert to {phase}: no completed execution in history")]
    RevertTargetNotCompleted { phase: Phase },

    #[error("Project is awaiting human approval; approve or reject the plan to continue")]
    AwaitingApproval,

    #[error("Project has no plan document to approve")]
    NoPlanDocument,

    #[error("Phase {phase} gated on verification: {reason}")]
    VerificationGate { phase: Phase, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the task supervisor and generation dispatch.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Gate agent '{agent}' failed: {reason}")]
    GateFailed { agent: String, reason: String },

    #[error("Generation failed after {attempts} attempts: {message}")]
    GenerationFailed { attempts: u32, message: String },

    #[error("Backend '{backend}' is unreachable: {message}")]
    BackendUnreachable { backend: String, message: String },

    #[error("No model configured for task type '{task_type}'")]
    NoModelForTask { task_type: String },

    #[error("Generated output contained no parseable files")]
    NoFilesParsed,

    #[error("Failed to write artifact at {path}: {source}")]
    ArtifactWriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
