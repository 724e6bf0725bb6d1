//! Top-level project orchestrator.
//!
//! Drives a project through the phase workflow: reasoning phases go to the
//! lead agent, codegen goes through the supervised task pipeline followed by
//! build/runtime/test verification, and the complete phase produces the
//! hand-off metrics and quality report. Every mutation persists through the
//! project store before it is returned; notification events are
//! fire-and-forget and never fail a transition.

pub mod lead;

pub use lead::{LeadAgent, PhaseOutcome};

use crate::agents::Decision;
use crate::completion;
use crate::config::Config;
use crate::errors::{PhaseError, StoreError};
use crate::llm::GenerationBackend;
use crate::notify::{Event, EventSink};
use crate::phase::Phase;
use crate::project::{PhaseExecution, PhaseStatus, PlanDocument, Project, ProjectStatus};
use crate::report::QualityGuarantee;
use crate::runner::{ProjectOps, TaskRunner};
use crate::store::ProjectStore;
use crate::supervisor::TaskSupervisor;
use crate::verify::{self, Verdict};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ProjectOrchestrator {
    store: ProjectStore,
    supervisor: TaskSupervisor,
    lead: LeadAgent,
    sink: Arc<dyn EventSink>,
}

impl ProjectOrchestrator {
    pub fn new(
        config: Config,
        local: Arc<dyn GenerationBackend>,
        remote: Option<Arc<dyn GenerationBackend>>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, StoreError> {
        let store = ProjectStore::open(config.projects_dir.clone())?;
        let lead = LeadAgent::new(local.clone(), config.model_for("review").to_string());
        let supervisor = TaskSupervisor::new(config, local, remote);
        Ok(Self {
            store,
            supervisor,
            lead,
            sink,
        })
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn supervisor(&self) -> &TaskSupervisor {
        &self.supervisor
    }

    pub fn create_project(&self, name: &str, description: &str) -> Result<Project, PhaseError> {
        let project = Project::new(name, description);
        self.store.save(&project)?;
        info!(id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub fn get_project(&self, id: Uuid) -> Result<Project, PhaseError> {
        Ok(self.store.get(id)?)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, PhaseError> {
        Ok(self.store.list()?)
    }

    pub fn delete_project(&self, id: Uuid) -> Result<(), PhaseError> {
        Ok(self.store.delete(id)?)
    }

    /// Execute the project's current phase and persist the outcome. The
    /// phase execution is marked in-progress for the duration; on error it
    /// returns to pending so the phase can be re-run.
    pub async fn run_phase(&self, id: Uuid) -> Result<Project, PhaseError> {
        let mut project = self.store.get(id)?;
        let phase = project.current_phase;
        if phase == Phase::WaitingApproval {
            return Err(PhaseError::AwaitingApproval);
        }

        // Reuse a pending execution of this phase; after a revert the latest
        // one is complete, so a fresh attempt gets its own history entry.
        let reuse = project
            .phase_execution(phase)
            .is_some_and(|pe| pe.status != PhaseStatus::Complete);
        if reuse {
            if let Some(pe) = project.phase_execution_mut(phase) {
                pe.status = PhaseStatus::InProgress;
            }
        } else {
            project
                .phases
                .push(PhaseExecution::new(phase, PhaseStatus::InProgress));
        }
        self.sink
            .publish(Event::PhaseStarted {
                project_id: id,
                phase,
            })
            .await;

        let outcome = match phase {
            Phase::Codegen => self.execute_codegen(&mut project).await,
            Phase::Complete => self.execute_complete(&mut project).await,
            _ => self
                .lead
                .execute_phase(&project, phase)
                .await
                .map_err(PhaseError::from),
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(pe) = project.phase_execution_mut(phase) {
                    pe.status = PhaseStatus::Pending;
                }
                self.store.save(&project)?;
                return Err(e);
            }
        };

        if let Some(pe) = project.phase_execution_mut(phase) {
            pe.decision = outcome.decision.as_str().to_string();
            pe.agent_outputs.extend(outcome.agent_outputs.clone());
            if !outcome.reasoning.is_empty() {
                pe.agent_outputs
                    .insert("reasoning".to_string(), outcome.reasoning.clone());
            }
            pe.completed_at = Some(Utc::now());
            pe.status = if outcome.decision == Decision::Block {
                PhaseStatus::Blocked
            } else {
                PhaseStatus::Complete
            };
        }

        if phase == Phase::Codegen && outcome.decision == Decision::Block {
            project.status = ProjectStatus::Blocked;
            self.sink
                .publish(Event::ProjectBlocked {
                    project_id: id,
                    reason: outcome.reasoning.clone(),
                })
                .await;
        }

        // A finished plan goes straight to the human approval checkpoint.
        if phase == Phase::Planning && outcome.decision == Decision::Proceed {
            if let Some(plan) = outcome.agent_outputs.get("plan") {
                project.plan_document = Some(PlanDocument::new(plan.clone()));
            }
            apply_transition(&mut project, Phase::WaitingApproval, false)?;
            self.sink
                .publish(Event::ApprovalRequested { project_id: id })
                .await;
        }

        project.updated_at = Utc::now();
        self.store.save(&project)?;
        self.sink
            .publish(Event::PhaseCompleted {
                project_id: id,
                phase,
                decision: outcome.decision.as_str().to_string(),
            })
            .await;
        info!(id = %id, phase = %phase, decision = %outcome.decision, "phase finished");
        Ok(project)
    }

    async fn execute_codegen(&self, project: &mut Project) -> Result<PhaseOutcome, PhaseError> {
        let mut input = format!(
            "Project: {}\nDescription: {}",
            project.name, project.description
        );
        if let Some(plan) = &project.plan_document {
            input.push_str("\n\nImplementation plan:\n");
            input.push_str(&plan.content);
        }

        let result = self
            .supervisor
            .execute("code_generation", &input, &project.name)
            .await?;

        let execution = self.supervisor.manager().record(
            &result.task,
            Phase::Codegen,
            &input,
            result.complexity.score,
            result.complexity.route.as_str(),
        );
        project.tasks.push(execution);

        let mut outputs = HashMap::new();
        for agent in result.gate_outputs.iter().chain(result.advisor_outputs.iter()) {
            outputs.insert(agent.agent.clone(), agent.output.clone());
        }

        let mut reasoning = format!(
            "Code generated via {} (complexity: {})",
            result.complexity.route.as_str(),
            result.complexity.score
        );
        let decision;
        if let Some(dir) = &result.task.project_dir {
            project.artifact_paths.push(dir.display().to_string());

            let verification = verify::run_pipeline(dir).await;
            project.validation_results = Some(verification.to_validation_results());
            match verification.verdict {
                Verdict::Block => {
                    decision = Decision::Block;
                    reasoning = format!(
                        "Build verification failed: {}",
                        verification.build.errors.join("; ")
                    );
                }
                Verdict::Refine => {
                    decision = Decision::Refine;
                    reasoning = format!(
                        "Code generated but dependencies missing: {}",
                        verification.build.errors.join("; ")
                    );
                }
                Verdict::Proceed => {
                    decision = Decision::Proceed;
                    reasoning.push_str(" | build passed");
                    if let Some(rt) = &verification.runtime {
                        if rt.application_starts {
                            reasoning.push_str(" | runtime passed");
                            if rt.health_check_passed {
                                reasoning.push_str(" (health check passed)");
                            }
                        } else {
                            reasoning.push_str(" | runtime startup failed");
                        }
                    }
                    if let Some(tests) = &verification.tests {
                        if tests.tests_executed {
                            reasoning.push_str(&format!(
                                " | tests {}/{} passed",
                                tests.passed, tests.total
                            ));
                        }
                    }
                }
            }
            if !verification.warnings.is_empty() {
                outputs.insert("verification".to_string(), verification.warnings.join("\n"));
            }
        } else {
            // Nothing to verify is a warning, not a failure: the output is
            // still recorded for review.
            decision = Decision::Proceed;
            reasoning.push_str(" | no file sections parsed, verification skipped");
            outputs.insert(
                "verification".to_string(),
                "skipped: no artifact directory was produced".to_string(),
            );
        }

        Ok(PhaseOutcome {
            phase: Phase::Codegen,
            decision,
            reasoning,
            next_steps: "Proceed to the review phase".to_string(),
            agent_outputs: outputs,
            requires_approval: decision != Decision::Proceed,
            recommended_action: decision.recommended_action().to_string(),
        })
    }

    async fn execute_complete(&self, project: &mut Project) -> Result<PhaseOutcome, PhaseError> {
        let metrics = completion::validate_handoff(project);
        let summary = match self.lead.generate_summary(project).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "summary generation failed");
                "Summary generation unavailable".to_string()
            }
        };

        let report = QualityGuarantee::from_project(project, metrics.clone());
        if let Some(dir) = project
            .artifact_paths
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_dir())
        {
            match report.write_to(&dir) {
                Ok(()) => info!(
                    score = report.score,
                    status = report.status.as_str(),
                    "quality report written"
                ),
                Err(e) => warn!(error = %e, "failed to write quality report"),
            }
        }

        project.status = ProjectStatus::Complete;
        project.completed_at = Some(Utc::now());
        self.sink
            .publish(Event::ProjectCompleted {
                project_id: project.id,
                quality_score: report.score,
            })
            .await;

        let mut outputs = HashMap::new();
        outputs.insert(
            "completion_metrics".to_string(),
            format!(
                "Completion: {:.1}%\nBuild: {}\nTests: {}\nREADME: {}\nBlocking issues: {:?}",
                metrics.completion_pct,
                metrics.has_runnable_build,
                metrics.has_tests,
                metrics.has_readme,
                metrics.blocking_issues
            ),
        );

        Ok(PhaseOutcome {
            phase: Phase::Complete,
            decision: Decision::Proceed,
            reasoning: format!(
                "Project complete: {:.1}% completion, quality score {}/100",
                metrics.completion_pct, report.score
            ),
            next_steps: summary,
            agent_outputs: outputs,
            requires_approval: false,
            recommended_action: "Project ready for hand-off".to_string(),
        })
    }

    /// Move the project to `to`, recording `approved` on the phase being
    /// left. Rejected when the phase graph forbids the move.
    pub fn transition(&self, id: Uuid, to: Phase, approved: bool) -> Result<Project, PhaseError> {
        let mut project = self.store.get(id)?;
        apply_transition(&mut project, to, approved)?;
        self.store.save(&project)?;
        Ok(project)
    }

    /// Approve the current phase and advance to its primary successor. From
    /// `waiting_approval` this also stamps the plan document approved.
    pub fn approve(&self, id: Uuid) -> Result<Project, PhaseError> {
        let mut project = self.store.get(id)?;
        if project.status == ProjectStatus::Blocked {
            return Err(PhaseError::VerificationGate {
                phase: project.current_phase,
                reason: "project is blocked; revert to an earlier phase first".to_string(),
            });
        }

        if project.current_phase == Phase::WaitingApproval {
            let plan = project
                .plan_document
                .as_mut()
                .ok_or(PhaseError::NoPlanDocument)?;
            plan.is_approved = true;
            plan.approved_at = Some(Utc::now());
            info!(id = %id, "plan approved");
        }

        let next = project
            .current_phase
            .next()
            .ok_or(PhaseError::InvalidTransition {
                from: project.current_phase,
                to: project.current_phase,
            })?;
        apply_transition(&mut project, next, true)?;
        self.store.save(&project)?;
        Ok(project)
    }

    /// Reject the current phase. From `waiting_approval` the plan is stamped
    /// rejected and the project reverts to planning for another pass;
    /// anywhere else the phase and project are marked blocked.
    pub async fn reject(&self, id: Uuid, feedback: &str) -> Result<Project, PhaseError> {
        let mut project = self.store.get(id)?;

        if project.current_phase == Phase::WaitingApproval {
            if let Some(plan) = project.plan_document.as_mut() {
                plan.rejected_at = Some(Utc::now());
                plan.user_feedback = feedback.to_string();
            }
            apply_revert(&mut project, Phase::Planning, feedback)?;
            self.store.save(&project)?;
            info!(id = %id, "plan rejected, reverted to planning");
            return Ok(project);
        }

        let phase = project.current_phase;
        if let Some(pe) = project.phase_execution_mut(phase) {
            pe.status = PhaseStatus::Blocked;
            pe.append_note(feedback);
        }
        project.status = ProjectStatus::Blocked;
        project.updated_at = Utc::now();
        self.store.save(&project)?;
        self.sink
            .publish(Event::ProjectBlocked {
                project_id: id,
                reason: feedback.to_string(),
            })
            .await;
        Ok(project)
    }

    /// Rewind the project to a previously completed phase. Later phase
    /// executions keep their data but lose human approval and gain a
    /// timestamped note.
    pub fn revert(&self, id: Uuid, target: Phase, reason: &str) -> Result<Project, PhaseError> {
        let mut project = self.store.get(id)?;
        apply_revert(&mut project, target, reason)?;
        self.store.save(&project)?;
        info!(id = %id, target = %target, "project reverted");
        Ok(project)
    }
}

fn apply_transition(project: &mut Project, to: Phase, approved: bool) -> Result<(), PhaseError> {
    let from = project.current_phase;
    if !from.can_transition(to) {
        return Err(PhaseError::InvalidTransition { from, to });
    }

    if let Some(pe) = project.phase_execution_mut(from) {
        pe.human_approval = approved;
        if approved {
            pe.completed_at = Some(Utc::now());
            pe.status = PhaseStatus::Complete;
        }
    }

    project
        .phases
        .push(PhaseExecution::new(to, PhaseStatus::Pending));
    project.current_phase = to;
    project.updated_at = Utc::now();
    Ok(())
}

fn apply_revert(project: &mut Project, target: Phase, reason: &str) -> Result<(), PhaseError> {
    if !project
        .phases
        .iter()
        .any(|pe| pe.phase == target && pe.status == PhaseStatus::Complete)
    {
        return Err(PhaseError::RevertTargetNotCompleted { phase: target });
    }
    if !project.current_phase.can_revert_to(target) {
        return Err(PhaseError::InvalidRevert {
            from: project.current_phase,
            to: target,
        });
    }

    let note = format!(
        "[reverted {}: {}]",
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        reason
    );
    for pe in project.phases.iter_mut() {
        if pe.phase != target && pe.phase.is_after(target) {
            pe.human_approval = false;
            pe.append_note(&note);
        }
    }

    project.current_phase = target;
    if project.status == ProjectStatus::Blocked {
        project.status = ProjectStatus::Active;
    }
    project.updated_at = Utc::now();
    Ok(())
}

#[async_trait]
impl TaskRunner for ProjectOrchestrator {
    async fn execute(&self, task_type: &str, input: &str) -> anyhow::Result<String> {
        let result = self.supervisor.execute(task_type, input, "adhoc").await?;
        Ok(result.task.output)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.supervisor.ping().await
    }

    fn project_ops(&self) -> Option<&dyn ProjectOps> {
        Some(self)
    }
}

#[async_trait]
impl ProjectOps for ProjectOrchestrator {
    fn create_project(&self, name: &str, description: &str) -> Result<Project, PhaseError> {
        ProjectOrchestrator::create_project(self, name, description)
    }

    fn get_project(&self, id: Uuid) -> Result<Project, PhaseError> {
        ProjectOrchestrator::get_project(self, id)
    }

    fn list_projects(&self) -> Result<Vec<Project>, PhaseError> {
        ProjectOrchestrator::list_projects(self)
    }

    fn delete_project(&self, id: Uuid) -> Result<(), PhaseError> {
        ProjectOrchestrator::delete_project(self, id)
    }

    async fn run_phase(&self, id: Uuid) -> Result<Project, PhaseError> {
        ProjectOrchestrator::run_phase(self, id).await
    }

    async fn approve(&self, id: Uuid) -> Result<Project, PhaseError> {
        ProjectOrchestrator::approve(self, id)
    }

    async fn reject(&self, id: Uuid, feedback: &str) -> Result<Project, PhaseError> {
        ProjectOrchestrator::reject(self, id, feedback).await
    }

    fn revert(&self, id: Uuid, target: Phase, reason: &str) -> Result<Project, PhaseError> {
        ProjectOrchestrator::revert(self, id, target, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationContext;
    use crate::notify::NoopSink;
    use crate::scoring::ReasoningDepth;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ScriptedBackend {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _depth: ReasoningDepth,
        ) -> anyhow::Result<String> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "DECISION: PROCEED\nREASONING: ok\nNEXT_STEPS: continue".to_string()))
        }

        async fn generate_with_context(
            &self,
            model: &str,
            prompt: &str,
            _context: GenerationContext,
            depth: ReasoningDepth,
        ) -> anyhow::Result<(String, GenerationContext)> {
            Ok((self.generate(model, prompt, depth).await?, Vec::new()))
        }

        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        orchestrator: ProjectOrchestrator,
        _dir: TempDir,
    }

    fn fixture(responses: Vec<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.projects_dir = dir.path().join("projects");
        config.artifacts_dir = dir.path().join("artifacts");
        let orchestrator = ProjectOrchestrator::new(
            config,
            ScriptedBackend::new(responses),
            None,
            Arc::new(NoopSink),
        )
        .unwrap();
        Fixture {
            orchestrator,
            _dir: dir,
        }
    }

    const STATIC_SITE: &str = "### index.html\n```html\n<html><head><title>t</title></head><body>hi</body></html>\n```\n";

    const PROCEED: &str = "DECISION: PROCEED\nREASONING: fine\nNEXT_STEPS: continue";

    #[test]
    fn test_create_list_delete() {
        let f = fixture(vec![]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();
        assert_eq!(f.orchestrator.list_projects().unwrap().len(), 1);
        f.orchestrator.delete_project(project.id).unwrap();
        assert!(f.orchestrator.list_projects().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discovery_phase_records_decision() {
        let f = fixture(vec!["Status: COMPLETE", PROCEED]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();

        let updated = f.orchestrator.run_phase(project.id).await.unwrap();
        let exec = updated.phase_execution(Phase::Discovery).unwrap();
        assert_eq!(exec.status, PhaseStatus::Complete);
        assert_eq!(exec.decision, "PROCEED");
        assert!(exec.agent_outputs.contains_key("requirements"));
        // persisted
        let reloaded = f.orchestrator.get_project(project.id).unwrap();
        assert_eq!(reloaded.phase_execution(Phase::Discovery).unwrap().decision, "PROCEED");
    }

    #[tokio::test]
    async fn test_planning_moves_to_waiting_approval() {
        let f = fixture(vec!["## Plan\n1. scaffold"]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases[0].status = PhaseStatus::Complete;
        stored.phases.push(PhaseExecution::new(Phase::Validation, PhaseStatus::Complete));
        stored.phases.push(PhaseExecution::new(Phase::Planning, PhaseStatus::Pending));
        stored.current_phase = Phase::Planning;
        f.orchestrator.store().save(&stored).unwrap();

        let updated = f.orchestrator.run_phase(project.id).await.unwrap();
        assert_eq!(updated.current_phase, Phase::WaitingApproval);
        let plan = updated.plan_document.unwrap();
        assert!(plan.content.contains("scaffold"));
        assert!(!plan.is_approved);

        // the checkpoint itself is not runnable
        let err = f.orchestrator.run_phase(project.id).await.unwrap_err();
        assert!(matches!(err, PhaseError::AwaitingApproval));
    }

    #[tokio::test]
    async fn test_approve_plan_advances_to_codegen() {
        let f = fixture(vec!["## Plan"]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases[0].status = PhaseStatus::Complete;
        stored.phases.push(PhaseExecution::new(Phase::Validation, PhaseStatus::Complete));
        stored.phases.push(PhaseExecution::new(Phase::Planning, PhaseStatus::Pending));
        stored.current_phase = Phase::Planning;
        f.orchestrator.store().save(&stored).unwrap();
        f.orchestrator.run_phase(project.id).await.unwrap();

        let approved = f.orchestrator.approve(project.id).unwrap();
        assert_eq!(approved.current_phase, Phase::Codegen);
        let plan = approved.plan_document.unwrap();
        assert!(plan.is_approved);
        assert!(plan.approved_at.is_some());
    }

    #[tokio::test]
    async fn test_reject_plan_reverts_to_planning_with_feedback() {
        let f = fixture(vec!["## Plan"]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases[0].status = PhaseStatus::Complete;
        stored.phases.push(PhaseExecution::new(Phase::Validation, PhaseStatus::Complete));
        stored.phases.push(PhaseExecution::new(Phase::Planning, PhaseStatus::Pending));
        stored.current_phase = Phase::Planning;
        f.orchestrator.store().save(&stored).unwrap();
        f.orchestrator.run_phase(project.id).await.unwrap();

        let rejected = f
            .orchestrator
            .reject(project.id, "too ambitious")
            .await
            .unwrap();
        assert_eq!(rejected.current_phase, Phase::Planning);
        let plan = rejected.plan_document.unwrap();
        assert!(plan.rejected_at.is_some());
        assert_eq!(plan.user_feedback, "too ambitious");
        assert!(!plan.is_approved);
    }

    #[tokio::test]
    async fn test_codegen_static_site_proceeds_with_verification() {
        // gates: requirements, techstack, scope; then generation; then advisors
        let f = fixture(vec![
            "Status: COMPLETE",
            "Verdict: APPROVED",
            "Scope: APPROPRIATE",
            STATIC_SITE,
            "qa notes",
            "test plan",
            "readme",
        ]);
        let project = f.orchestrator.create_project("Landing Page", "static landing page").unwrap();
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases.push(PhaseExecution::new(Phase::Codegen, PhaseStatus::Pending));
        stored.current_phase = Phase::Codegen;
        f.orchestrator.store().save(&stored).unwrap();

        let updated = f.orchestrator.run_phase(project.id).await.unwrap();
        let exec = updated.phase_execution(Phase::Codegen).unwrap();
        assert_eq!(exec.decision, "PROCEED");
        assert_eq!(exec.status, PhaseStatus::Complete);
        assert_eq!(updated.tasks.len(), 1);
        assert_eq!(updated.artifact_paths.len(), 1);
        let results = updated.validation_results.unwrap();
        assert!(results.syntax_valid);
        assert!(results.application_starts);
    }

    #[tokio::test]
    async fn test_codegen_without_files_skips_verification() {
        let f = fixture(vec![
            "Status: COMPLETE",
            "Verdict: APPROVED",
            "Scope: APPROPRIATE",
            "Here is a description instead of code.",
            "qa notes",
            "test plan",
            "readme",
        ]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases.push(PhaseExecution::new(Phase::Codegen, PhaseStatus::Pending));
        stored.current_phase = Phase::Codegen;
        f.orchestrator.store().save(&stored).unwrap();

        let updated = f.orchestrator.run_phase(project.id).await.unwrap();
        let exec = updated.phase_execution(Phase::Codegen).unwrap();
        assert_eq!(exec.decision, "PROCEED");
        assert!(exec.agent_outputs["verification"].contains("skipped"));
        assert!(updated.artifact_paths.is_empty());
        assert!(updated.validation_results.is_none());
    }

    #[tokio::test]
    async fn test_gate_failure_returns_phase_to_pending() {
        let f = fixture(vec!["Status: INCOMPLETE"]);
        let project = f.orchestrator.create_project("Todo App", "vague").unwrap();
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases.push(PhaseExecution::new(Phase::Codegen, PhaseStatus::Pending));
        stored.current_phase = Phase::Codegen;
        f.orchestrator.store().save(&stored).unwrap();

        let err = f.orchestrator.run_phase(project.id).await.unwrap_err();
        assert!(matches!(err, PhaseError::Supervisor(_)));
        let reloaded = f.orchestrator.get_project(project.id).unwrap();
        assert_eq!(
            reloaded.phase_execution(Phase::Codegen).unwrap().status,
            PhaseStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_revert_clears_approvals_and_appends_notes() {
        let f = fixture(vec![]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases[0].status = PhaseStatus::Complete;
        for phase in [
            Phase::Validation,
            Phase::Planning,
            Phase::WaitingApproval,
            Phase::Codegen,
            Phase::Review,
            Phase::Qa,
        ] {
            let mut pe = PhaseExecution::new(phase, PhaseStatus::Complete);
            pe.human_approval = true;
            stored.phases.push(pe);
        }
        stored.current_phase = Phase::Qa;
        f.orchestrator.store().save(&stored).unwrap();

        let reverted = f
            .orchestrator
            .revert(project.id, Phase::Planning, "scope changed")
            .unwrap();
        assert_eq!(reverted.current_phase, Phase::Planning);
        assert_eq!(reverted.phases.len(), 7); // history preserved
        for phase in [Phase::Codegen, Phase::Review, Phase::Qa] {
            let pe = reverted.phase_execution(phase).unwrap();
            assert!(!pe.human_approval);
            assert!(pe.notes.contains("scope changed"));
        }
        // planning entry untouched
        assert!(reverted.phase_execution(Phase::Planning).unwrap().notes.is_empty());
    }

    #[tokio::test]
    async fn test_revert_to_uncompleted_phase_fails_without_change() {
        let f = fixture(vec![]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();

        let err = f
            .orchestrator
            .revert(project.id, Phase::Planning, "nope")
            .unwrap_err();
        assert!(matches!(err, PhaseError::RevertTargetNotCompleted { .. }));
        let reloaded = f.orchestrator.get_project(project.id).unwrap();
        assert_eq!(reloaded.current_phase, Phase::Discovery);
    }

    #[tokio::test]
    async fn test_illegal_transition_rejected() {
        let f = fixture(vec![]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();
        let err = f
            .orchestrator
            .transition(project.id, Phase::Codegen, true)
            .unwrap_err();
        assert!(matches!(err, PhaseError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_reject_blocks_non_approval_phase() {
        let f = fixture(vec![]);
        let project = f.orchestrator.create_project("Todo App", "a todo app").unwrap();

        let rejected = f.orchestrator.reject(project.id, "bad idea").await.unwrap();
        assert_eq!(rejected.status, ProjectStatus::Blocked);
        let exec = rejected.phase_execution(Phase::Discovery).unwrap();
        assert_eq!(exec.status, PhaseStatus::Blocked);
        assert!(exec.notes.contains("bad idea"));

        // revert restores active status
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases[0].status = PhaseStatus::Complete;
        stored.phases.push(PhaseExecution::new(Phase::Validation, PhaseStatus::Pending));
        stored.current_phase = Phase::Validation;
        f.orchestrator.store().save(&stored).unwrap();
        let reverted = f
            .orchestrator
            .revert(project.id, Phase::Discovery, "retry")
            .unwrap();
        assert_eq!(reverted.status, ProjectStatus::Active);
    }

    #[tokio::test]
    async fn test_complete_phase_finalizes_and_writes_report() {
        let f = fixture(vec!["## Summary\nAll done."]);
        let artifacts = tempfile::tempdir().unwrap();
        std::fs::write(
            artifacts.path().join("index.html"),
            "<html><head></head><body>hi</body></html>",
        )
        .unwrap();
        std::fs::write(
            artifacts.path().join("README.md"),
            "# Landing Page\n## Setup\nopen it\n## Usage\nbrowse",
        )
        .unwrap();

        let project = f.orchestrator.create_project("Landing Page", "a page").unwrap();
        let mut stored = f.orchestrator.get_project(project.id).unwrap();
        stored.phases[0].status = PhaseStatus::Complete;
        for phase in [
            Phase::Validation,
            Phase::Planning,
            Phase::Codegen,
            Phase::Review,
            Phase::Qa,
            Phase::Docs,
        ] {
            stored.phases.push(PhaseExecution::new(phase, PhaseStatus::Complete));
        }
        stored.phases.push(PhaseExecution::new(Phase::Complete, PhaseStatus::Pending));
        stored.current_phase = Phase::Complete;
        stored
            .artifact_paths
            .push(artifacts.path().display().to_string());
        f.orchestrator.store().save(&stored).unwrap();

        let finished = f.orchestrator.run_phase(project.id).await.unwrap();
        assert_eq!(finished.status, ProjectStatus::Complete);
        assert!(finished.completed_at.is_some());
        assert!(artifacts.path().join("QUALITY_REPORT.md").exists());
        let exec = finished.phase_execution(Phase::Complete).unwrap();
        assert!(exec.agent_outputs.contains_key("completion_metrics"));
    }

    #[tokio::test]
    async fn test_runner_capability_probe() {
        let f = fixture(vec!["a one-off answer"]);
        let runner: &dyn TaskRunner = &f.orchestrator;
        assert!(runner.project_ops().is_some());
        runner.ping().await.unwrap();
    }
}
