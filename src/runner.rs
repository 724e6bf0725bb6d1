//! Capability interface between the CLI front end and the execution cores.
//!
//! Both the supervised task manager and the project orchestrator can run
//! tasks; only the orchestrator exposes project operations. Callers probe
//! with `project_ops()` instead of downcasting, so a runner without project
//! support answers `None` and the front end degrades gracefully.

use crate::errors::PhaseError;
use crate::phase::Phase;
use crate::project::Project;
use async_trait::async_trait;
use uuid::Uuid;

/// Project lifecycle operations, exposed by runners that manage projects.
#[async_trait]
pub trait ProjectOps: Send + Sync {
    fn create_project(&self, name: &str, description: &str) -> Result<Project, PhaseError>;
    fn get_project(&self, id: Uuid) -> Result<Project, PhaseError>;
    fn list_projects(&self) -> Result<Vec<Project>, PhaseError>;
    fn delete_project(&self, id: Uuid) -> Result<(), PhaseError>;
    async fn run_phase(&self, id: Uuid) -> Result<Project, PhaseError>;
    async fn approve(&self, id: Uuid) -> Result<Project, PhaseError>;
    async fn reject(&self, id: Uuid, feedback: &str) -> Result<Project, PhaseError>;
    fn revert(&self, id: Uuid, target: Phase, reason: &str) -> Result<Project, PhaseError>;
}

/// A task execution backend the CLI can drive.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Execute a one-off task outside any project.
    async fn execute(&self, task_type: &str, input: &str) -> anyhow::Result<String>;

    /// Backend reachability.
    async fn ping(&self) -> anyhow::Result<()>;

    /// Project operations, if this runner manages projects.
    fn project_ops(&self) -> Option<&dyn ProjectOps> {
        None
    }
}
