//! Lead agent: per-phase reasoning and decisions.
//!
//! The lead agent drives the phases that are decided by reasoning rather
//! than by generation: it invokes the relevant specialist agents, folds
//! their outputs into a decision prompt, and parses the response into a
//! PROCEED/REFINE/BLOCK decision. Specialist failures during review and
//! docs degrade to warning outputs; only a dead backend fails the phase.

use crate::agents::{
    Agent, AgentContext, AgentOutput, AgentStatus, Decision, DocumentationAgent, QaAgent,
    RequirementsAgent, ScopeAgent, TechStackAgent, TestPlanAgent, parse_decision,
};
use crate::llm::GenerationBackend;
use crate::phase::Phase;
use crate::project::Project;
use crate::scoring::ReasoningDepth;
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

const BASE_PROMPT: &str = "You are the lead agent of an automated software factory, \
acting as product producer and tech lead.

Core principles:
1. Shipping matters: prefer working code over perfection.
2. Scope control: guard against feature creep aggressively.
3. Quality gates: block on critical issues, warn on concerns.
4. Delegation: use specialist agents, do not redo their work.
5. Conservative: proven patterns over experimental approaches.

Decision framework:
- PROCEED: all criteria met, safe to continue
- REFINE: concerns present, needs clarification
- BLOCK: critical issues, cannot proceed safely

Always explain your reasoning, cite specific agent outputs, and give
actionable next steps.";

/// Result of running one phase: the decision plus everything recorded into
/// the phase execution.
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub decision: Decision,
    pub reasoning: String,
    pub next_steps: String,
    pub agent_outputs: HashMap<String, String>,
    pub requires_approval: bool,
    pub recommended_action: String,
}

impl PhaseOutcome {
    fn decided(phase: Phase, response: &str, agent_outputs: HashMap<String, String>) -> Self {
        let parsed = parse_decision(response);
        Self {
            phase,
            decision: parsed.decision,
            reasoning: parsed.reasoning,
            next_steps: parsed.next_steps,
            agent_outputs,
            requires_approval: parsed.decision != Decision::Proceed,
            recommended_action: parsed.decision.recommended_action().to_string(),
        }
    }
}

pub struct LeadAgent {
    backend: Arc<dyn GenerationBackend>,
    model: String,
    requirements: RequirementsAgent,
    techstack: TechStackAgent,
    scope: ScopeAgent,
    qa: QaAgent,
    testing: TestPlanAgent,
    docs: DocumentationAgent,
}

impl LeadAgent {
    pub fn new(backend: Arc<dyn GenerationBackend>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            requirements: RequirementsAgent::new(backend.clone(), model.clone()),
            techstack: TechStackAgent::new(backend.clone(), model.clone()),
            scope: ScopeAgent::new(backend.clone(), model.clone()),
            qa: QaAgent::new(backend.clone(), model.clone()),
            testing: TestPlanAgent::new(backend.clone(), model.clone()),
            docs: DocumentationAgent::new(backend.clone(), model.clone()),
            backend,
            model,
        }
    }

    /// Run one reasoning-driven phase. Codegen and complete are handled by
    /// the orchestrator itself, not here.
    pub async fn execute_phase(&self, project: &Project, phase: Phase) -> Result<PhaseOutcome> {
        info!(project = %project.name, phase = %phase, "lead agent executing phase");
        match phase {
            Phase::Discovery => self.discovery(project).await,
            Phase::Validation => self.validation(project).await,
            Phase::Planning => self.planning(project).await,
            Phase::Review => self.review(project).await,
            Phase::Qa => Ok(self.qa_checkpoint()),
            Phase::Docs => self.docs(project).await,
            other => bail!("phase {other} is not driven by the lead agent"),
        }
    }

    async fn decide(&self, prompt: &str) -> Result<String> {
        self.backend
            .generate(&self.model, prompt, ReasoningDepth::Balanced)
            .await
    }

    async fn discovery(&self, project: &Project) -> Result<PhaseOutcome> {
        let ctx = AgentContext::default();
        let req = self
            .requirements
            .execute("discovery", &project.description, &ctx)
            .await?;

        let prompt = format!(
            "{BASE_PROMPT}\n\n\
             Analyze this new project request in the discovery phase.\n\n\
             Project: {}\nDescription: {}\n\n\
             Requirements agent output:\n{}\n\n\
             Decide: PROCEED, REFINE, or BLOCK.\n\
             - PROCEED: requirements are clear and complete\n\
             - REFINE: requirements need clarification\n\
             - BLOCK: requirements incomplete or contradictory\n\n\
             Respond in this format:\n\
             DECISION: [PROCEED|REFINE|BLOCK]\n\
             REASONING: [2-3 sentences]\n\
             NEXT_STEPS: [what needs to happen next]",
            project.name, project.description, req.output
        );
        let response = self.decide(&prompt).await?;

        let mut outputs = HashMap::new();
        outputs.insert("requirements".to_string(), req.output);
        Ok(PhaseOutcome::decided(Phase::Discovery, &response, outputs))
    }

    async fn validation(&self, project: &Project) -> Result<PhaseOutcome> {
        let ctx = AgentContext::default();
        let stack = self
            .techstack
            .execute("code_generation", &project.description, &ctx)
            .await?;
        let scope = self
            .scope
            .execute("code_generation", &project.description, &ctx)
            .await?;

        let prompt = format!(
            "{BASE_PROMPT}\n\n\
             Validate project feasibility in the validation phase.\n\n\
             Project: {}\n\n\
             Tech stack agent output:\n{}\n\n\
             Scope agent output:\n{}\n\n\
             Decide: PROCEED, REFINE, or BLOCK.\n\
             - PROCEED: both agents approved, no major concerns\n\
             - REFINE: warnings present but addressable\n\
             - BLOCK: tech stack rejected or scope too broad\n\n\
             Respond in this format:\n\
             DECISION: [PROCEED|REFINE|BLOCK]\n\
             REASONING: [why this decision]\n\
             NEXT_STEPS: [required actions]",
            project.name, stack.output, scope.output
        );
        let response = self.decide(&prompt).await?;

        let mut outputs = HashMap::new();
        outputs.insert("techstack".to_string(), stack.output);
        outputs.insert("scope".to_string(), scope.output);
        Ok(PhaseOutcome::decided(Phase::Validation, &response, outputs))
    }

    async fn planning(&self, project: &Project) -> Result<PhaseOutcome> {
        let prompt = format!(
            "{BASE_PROMPT}\n\n\
             Create an implementation roadmap for this project.\n\n\
             Project: {}\nDescription: {}\n\n\
             Generate a concise implementation plan covering:\n\
             1. Key milestones (3-5 major deliverables)\n\
             2. Technical approach (architecture, patterns)\n\
             3. Estimated complexity (simple, medium, complex)\n\
             4. Potential risks\n\
             5. Success criteria\n\n\
             Keep it practical and shipping-focused. Format as markdown.",
            project.name, project.description
        );
        let plan = self.decide(&prompt).await?;

        let mut outputs = HashMap::new();
        outputs.insert("plan".to_string(), plan);
        Ok(PhaseOutcome {
            phase: Phase::Planning,
            decision: Decision::Proceed,
            reasoning: "Implementation roadmap created".to_string(),
            next_steps: "Review the plan and approve to proceed to code generation".to_string(),
            agent_outputs: outputs,
            requires_approval: true,
            recommended_action: "Human should review the plan before proceeding".to_string(),
        })
    }

    async fn review(&self, project: &Project) -> Result<PhaseOutcome> {
        if project.artifact_paths.is_empty() {
            bail!("no artifacts available for review");
        }
        let generated = project
            .tasks
            .iter()
            .rev()
            .find(|t| t.task_type == "code_generation")
            .map(|t| t.output.clone())
            .unwrap_or_else(|| project.artifact_paths.join("\n"));
        let ctx = AgentContext {
            generated_output: Some(generated),
        };

        let qa = self
            .run_advisory(&self.qa, project, &ctx, "QA review unavailable")
            .await;
        let testing = self
            .run_advisory(&self.testing, project, &ctx, "Test plan unavailable")
            .await;

        let prompt = format!(
            "{BASE_PROMPT}\n\n\
             Review code quality for this project in the review phase.\n\n\
             Project: {}\n\n\
             QA agent output:\n{}\n\n\
             Testing agent output:\n{}\n\n\
             Decide: PROCEED, REFINE, or BLOCK.\n\
             - PROCEED: no critical bugs, tests exist\n\
             - REFINE: some issues present but addressable\n\
             - BLOCK: critical bugs detected\n\n\
             Respond in this format:\n\
             DECISION: [PROCEED|REFINE|BLOCK]\n\
             REASONING: [assessment of code quality]\n\
             NEXT_STEPS: [what to do next]",
            project.name, qa.output, testing.output
        );
        let response = self.decide(&prompt).await?;

        let mut outputs = HashMap::new();
        outputs.insert("qa".to_string(), qa.output);
        outputs.insert("testing".to_string(), testing.output);
        Ok(PhaseOutcome::decided(Phase::Review, &response, outputs))
    }

    /// QA phase: the verification checks already ran during codegen, so this
    /// is a human checkpoint over the recorded results.
    fn qa_checkpoint(&self) -> PhaseOutcome {
        PhaseOutcome {
            phase: Phase::Qa,
            decision: Decision::Proceed,
            reasoning: "Verification results recorded; hand-off criteria ready for review"
                .to_string(),
            next_steps: "Review hand-off readiness criteria".to_string(),
            agent_outputs: HashMap::new(),
            requires_approval: true,
            recommended_action: "Human should verify hand-off readiness".to_string(),
        }
    }

    async fn docs(&self, project: &Project) -> Result<PhaseOutcome> {
        let generated = project
            .tasks
            .iter()
            .rev()
            .find(|t| t.task_type == "code_generation")
            .map(|t| t.output.clone())
            .unwrap_or_else(|| project.description.clone());
        let ctx = AgentContext {
            generated_output: Some(generated),
        };
        let docs = self
            .run_advisory(&self.docs, project, &ctx, "Documentation agent unavailable")
            .await;

        let mut outputs = HashMap::new();
        outputs.insert("documentation".to_string(), docs.output);
        Ok(PhaseOutcome {
            phase: Phase::Docs,
            decision: Decision::Proceed,
            reasoning: "Documentation generated".to_string(),
            next_steps: "Proceed to project completion".to_string(),
            agent_outputs: outputs,
            requires_approval: false,
            recommended_action: "Automated transition to the complete phase".to_string(),
        })
    }

    /// Advisory agents never fail a phase; a failure becomes a warning output.
    async fn run_advisory(
        &self,
        agent: &dyn Agent,
        project: &Project,
        ctx: &AgentContext,
        fallback: &str,
    ) -> AgentOutput {
        match agent.execute("code_generation", &project.description, ctx).await {
            Ok(output) => output,
            Err(e) => {
                warn!(agent = agent.name(), error = %e, "advisory agent failed");
                AgentOutput::new(agent.name(), AgentStatus::Warning, fallback.to_string(), 0.0)
            }
        }
    }

    /// Markdown completion summary for the final report.
    pub async fn generate_summary(&self, project: &Project) -> Result<String> {
        let prompt = format!(
            "Generate a project completion summary for:\n\n\
             Project: {}\nDescription: {}\nPhases executed: {}\n\n\
             Include: project overview, phase execution summary, artifacts \
             generated, and next steps for deployment. Format as markdown.",
            project.name,
            project.description,
            project.phases.len()
        );
        self.decide(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationContext;
    use crate::phase::Phase;
    use crate::project::TaskExecution;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

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
        ) -> Result<String> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "DECISION: PROCEED".to_string()))
        }

        async fn generate_with_context(
            &self,
            model: &str,
            prompt: &str,
            _context: GenerationContext,
            depth: ReasoningDepth,
        ) -> Result<(String, GenerationContext)> {
            Ok((self.generate(model, prompt, depth).await?, Vec::new()))
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn lead(responses: Vec<&str>) -> LeadAgent {
        LeadAgent::new(ScriptedBackend::new(responses), "test-model")
    }

    fn project_with_code() -> Project {
        let mut project = Project::new("Todo App", "React todo app");
        project.artifact_paths.push("data/artifacts/todo".to_string());
        project.tasks.push(TaskExecution {
            task_id: Uuid::new_v4(),
            phase: Phase::Codegen,
            task_type: "code_generation".to_string(),
            input: String::new(),
            output: "### index.js\n```js\nconsole.log('hi');\n```".to_string(),
            artifact_path: "data/artifacts/todo".to_string(),
            complexity_score: 1,
            execution_route: "local".to_string(),
            created_at: Utc::now(),
        });
        project
    }

    #[tokio::test]
    async fn test_discovery_parses_lead_decision() {
        let agent = lead(vec![
            "Status: COMPLETE",
            "DECISION: PROCEED\nREASONING: clear request\nNEXT_STEPS: validate stack",
        ]);
        let project = Project::new("Todo App", "React todo app");

        let outcome = agent.execute_phase(&project, Phase::Discovery).await.unwrap();
        assert_eq!(outcome.decision, Decision::Proceed);
        assert_eq!(outcome.reasoning, "clear request");
        assert!(outcome.agent_outputs.contains_key("requirements"));
        assert!(!outcome.requires_approval);
    }

    #[tokio::test]
    async fn test_validation_records_both_specialists() {
        let agent = lead(vec![
            "Verdict: APPROVED",
            "Scope: APPROPRIATE",
            "DECISION: PROCEED\nREASONING: stack fits\nNEXT_STEPS: plan it",
        ]);
        let project = Project::new("Todo App", "React todo app");

        let outcome = agent.execute_phase(&project, Phase::Validation).await.unwrap();
        assert!(outcome.agent_outputs.contains_key("techstack"));
        assert!(outcome.agent_outputs.contains_key("scope"));
    }

    #[tokio::test]
    async fn test_planning_carries_plan_and_needs_approval() {
        let agent = lead(vec!["## Plan\n1. scaffold\n2. build"]);
        let project = Project::new("Todo App", "React todo app");

        let outcome = agent.execute_phase(&project, Phase::Planning).await.unwrap();
        assert_eq!(outcome.decision, Decision::Proceed);
        assert!(outcome.requires_approval);
        assert!(outcome.agent_outputs["plan"].contains("scaffold"));
    }

    #[tokio::test]
    async fn test_review_requires_artifacts() {
        let agent = lead(vec![]);
        let project = Project::new("Todo App", "React todo app");
        assert!(agent.execute_phase(&project, Phase::Review).await.is_err());
    }

    #[tokio::test]
    async fn test_review_block_decision_requires_approval() {
        let agent = lead(vec![
            "qa: injection vulnerability found",
            "tests: none present",
            "DECISION: BLOCK\nREASONING: critical bug\nNEXT_STEPS: regenerate",
        ]);
        let outcome = agent
            .execute_phase(&project_with_code(), Phase::Review)
            .await
            .unwrap();
        assert_eq!(outcome.decision, Decision::Block);
        assert!(outcome.requires_approval);
    }

    #[tokio::test]
    async fn test_unparseable_lead_response_defaults_to_refine() {
        let agent = lead(vec!["Status: COMPLETE", "looks good to me"]);
        let project = Project::new("Todo App", "React todo app");

        let outcome = agent.execute_phase(&project, Phase::Discovery).await.unwrap();
        assert_eq!(outcome.decision, Decision::Refine);
    }

    #[tokio::test]
    async fn test_qa_checkpoint_is_static() {
        let agent = lead(vec![]);
        let project = Project::new("Todo App", "React todo app");
        let outcome = agent.execute_phase(&project, Phase::Qa).await.unwrap();
        assert_eq!(outcome.decision, Decision::Proceed);
        assert!(outcome.requires_approval);
    }

    #[tokio::test]
    async fn test_codegen_is_not_a_lead_phase() {
        let agent = lead(vec![]);
        let project = Project::new("Todo App", "React todo app");
        assert!(agent.execute_phase(&project, Phase::Codegen).await.is_err());
    }
}
