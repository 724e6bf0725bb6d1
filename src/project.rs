//! Project aggregate and its persisted sub-records.
//!
//! A `Project` is the root record of the workflow: current phase, the
//! append-only phase-execution history, task executions, artifact
//! references, and the latest verification outcome. It is owned exclusively
//! by the `ProjectStore` and mutated only through orchestrator operations
//! that immediately persist.

use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Overall project status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Blocked,
    Complete,
    Archived,
}

/// Status of a single phase execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    InProgress,
    Blocked,
    Complete,
}

/// One row per phase attempt. History entries are appended, never deleted;
/// a revert re-opens an entry and annotates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseExecution {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Raw text from each agent that contributed to this phase.
    #[serde(default)]
    pub agent_outputs: HashMap<String, String>,
    /// Decision the lead agent recorded for this phase (PROCEED/REFINE/BLOCK).
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub human_approval: bool,
    /// Free text; revert and reject reasons are appended here, never
    /// overwritten.
    #[serde(default)]
    pub notes: String,
}

impl PhaseExecution {
    pub fn new(phase: Phase, status: PhaseStatus) -> Self {
        Self {
            phase,
            status,
            started_at: Utc::now(),
            completed_at: None,
            agent_outputs: HashMap::new(),
            decision: String::new(),
            human_approval: false,
            notes: String::new(),
        }
    }

    /// Append a note on its own line, preserving anything already recorded.
    pub fn append_note(&mut self, note: &str) {
        if self.notes.is_empty() {
            self.notes = note.to_string();
        } else {
            self.notes.push('\n');
            self.notes.push_str(note);
        }
    }
}

/// One generation attempt within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecution {
    pub task_id: Uuid,
    pub phase: Phase,
    pub task_type: String,
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub artifact_path: String,
    pub complexity_score: u8,
    /// Backend the generation was routed to ("local" or "remote").
    pub execution_route: String,
    pub created_at: DateTime<Utc>,
}

/// Planning output held for human approval during `waiting_approval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDocument {
    pub content: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_feedback: String,
}

impl PlanDocument {
    pub fn new(content: String) -> Self {
        Self {
            content,
            generated_at: Utc::now(),
            is_approved: false,
            approved_at: None,
            rejected_at: None,
            user_feedback: String::new(),
        }
    }
}

/// Latest triple-guarantee outcome (build + runtime + test). Overwritten on
/// re-generation, persisted with the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResults {
    // Build verification
    pub build_verified: bool,
    pub syntax_valid: bool,
    pub dependencies_ok: bool,
    pub entry_point_valid: bool,
    #[serde(default)]
    pub build_errors: Vec<String>,

    // Runtime verification
    pub runtime_verified: bool,
    pub application_starts: bool,
    pub health_check_passed: bool,
    #[serde(default)]
    pub runtime_errors: Vec<String>,
    #[serde(default)]
    pub runtime_warnings: Vec<String>,

    // Test execution
    pub tests_executed: bool,
    pub tests_passed: u32,
    pub tests_failed: u32,
    pub tests_skipped: u32,
    pub total_tests: u32,
    #[serde(default)]
    pub test_framework: String,
    #[serde(default)]
    pub test_errors: Vec<String>,

    pub last_validated: DateTime<Utc>,
}

/// Root aggregate for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub current_phase: Phase,
    #[serde(default)]
    pub phases: Vec<PhaseExecution>,
    #[serde(default)]
    pub tasks: Vec<TaskExecution>,
    #[serde(default)]
    pub artifact_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_document: Option<PlanDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_results: Option<ValidationResults>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Set when the record loaded from disk but failed schema validation.
    /// Kept in the cache for operator inspection.
    #[serde(skip)]
    pub schema_flagged: bool,
}

impl Project {
    /// Create a fresh project with a single pending discovery execution.
    pub fn new(name: &str, description: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            current_phase: Phase::Discovery,
            phases: vec![PhaseExecution::new(Phase::Discovery, PhaseStatus::Pending)],
            tasks: Vec::new(),
            artifact_paths: Vec::new(),
            plan_document: None,
            validation_results: None,
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
            completed_at: None,
            schema_flagged: false,
        }
    }

    /// Mutable access to the most recent execution of `phase`, if any.
    pub fn phase_execution_mut(&mut self, phase: Phase) -> Option<&mut PhaseExecution> {
        self.phases.iter_mut().rev().find(|pe| pe.phase == phase)
    }

    /// The most recent execution of `phase`, if any.
    pub fn phase_execution(&self, phase: Phase) -> Option<&PhaseExecution> {
        self.phases.iter().rev().find(|pe| pe.phase == phase)
    }

    /// True iff `phase` has at least one completed execution in history.
    pub fn phase_completed(&self, phase: Phase) -> bool {
        self.phases
            .iter()
            .any(|pe| pe.phase == phase && pe.status == PhaseStatus::Complete)
    }

    /// Basic schema validation performed after loading from disk.
    pub fn validate_schema(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("project name cannot be empty");
        }
        if self.phases.is_empty() {
            anyhow::bail!("project has no phase history");
        }
        let in_progress = self
            .phases
            .iter()
            .filter(|pe| pe.status == PhaseStatus::InProgress)
            .count();
        if in_progress > 1 {
            anyhow::bail!("more than one phase execution is in_progress");
        }
        Ok(())
    }
}
