//! Supervised task execution.
//!
//! The supervisor wraps the base task manager with quality gates before
//! generation, deterministic complexity routing, and advisory agents after.
//! A gate whose agent reports `failed` aborts the whole execution; a
//! `warning` passes through with the output attached. Post agents never
//! block: their failures are logged and the result ships without them.

use crate::agents::{
    Agent, AgentContext, AgentOutput, AgentStatus, DocumentationAgent, QaAgent, RequirementsAgent,
    ScopeAgent, TechStackAgent, TestPlanAgent,
};
use crate::config::Config;
use crate::errors::SupervisorError;
use crate::llm::GenerationBackend;
use crate::scoring::{ComplexityAnalysis, ComplexityScorer, Route};
use crate::tasks::{TaskManager, TaskResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Full record of one supervised execution.
#[derive(Debug)]
pub struct SupervisedResult {
    pub task: TaskResult,
    pub complexity: ComplexityAnalysis,
    pub gate_outputs: Vec<AgentOutput>,
    pub advisor_outputs: Vec<AgentOutput>,
    pub agent_durations: HashMap<String, f64>,
    pub total_duration_secs: f64,
}

impl SupervisedResult {
    pub fn advisor(&self, name: &str) -> Option<&AgentOutput> {
        self.advisor_outputs.iter().find(|o| o.agent == name)
    }
}

pub struct TaskSupervisor {
    manager: TaskManager,
    scorer: ComplexityScorer,
    local: Arc<dyn GenerationBackend>,
    remote: Option<Arc<dyn GenerationBackend>>,
    gates: Vec<Box<dyn Agent>>,
    advisors: Vec<Box<dyn Agent>>,
    gates_enabled: bool,
    advisors_enabled: bool,
}

impl TaskSupervisor {
    pub fn new(
        config: Config,
        local: Arc<dyn GenerationBackend>,
        remote: Option<Arc<dyn GenerationBackend>>,
    ) -> Self {
        let threshold = config.supervisor.complexity_threshold;
        let gates_enabled = config.supervisor.enable_gates;
        let advisors_enabled = config.supervisor.enable_post_agents;
        let gate_model = config.model_for("review").to_string();

        let gates: Vec<Box<dyn Agent>> = vec![
            Box::new(RequirementsAgent::new(local.clone(), gate_model.clone())),
            Box::new(TechStackAgent::new(local.clone(), gate_model.clone())),
            Box::new(ScopeAgent::new(local.clone(), gate_model.clone())),
        ];
        let advisors: Vec<Box<dyn Agent>> = vec![
            Box::new(QaAgent::new(local.clone(), gate_model.clone())),
            Box::new(TestPlanAgent::new(local.clone(), gate_model.clone())),
            Box::new(DocumentationAgent::new(local.clone(), gate_model)),
        ];

        Self {
            manager: TaskManager::new(config),
            scorer: ComplexityScorer::new(threshold),
            local,
            remote,
            gates,
            advisors,
            gates_enabled,
            advisors_enabled,
        }
    }

    /// Run gates, score, dispatch, and advise. `project_name` scopes the
    /// artifact directory for code-generation outputs.
    pub async fn execute(
        &self,
        task_type: &str,
        input: &str,
        project_name: &str,
    ) -> Result<SupervisedResult, SupervisorError> {
        let start = std::time::Instant::now();
        let mut gate_outputs = Vec::new();
        let mut agent_durations = HashMap::new();

        if self.gates_enabled {
            let ctx = AgentContext::default();
            for gate in &self.gates {
                // Tech-stack approval only makes sense for code tasks.
                if gate.name() == "techstack" && task_type != "code_generation" {
                    continue;
                }
                let output = gate
                    .execute(task_type, input, &ctx)
                    .await
                    .map_err(|e| SupervisorError::GateFailed {
                        agent: gate.name().to_string(),
                        reason: e.to_string(),
                    })?;
                agent_durations.insert(gate.name().to_string(), output.duration_secs);
                let failed = output.status == AgentStatus::Failed;
                info!(gate = gate.name(), status = ?output.status, "quality gate finished");
                gate_outputs.push(output);
                if failed {
                    return Err(SupervisorError::GateFailed {
                        agent: gate.name().to_string(),
                        reason: "gate reported failure - cannot proceed".to_string(),
                    });
                }
            }
        }

        let complexity = self.scorer.score(task_type, input);
        info!(
            score = complexity.score,
            route = ?complexity.route,
            "complexity scored"
        );

        // Remote routing needs a configured remote backend; without one the
        // task degrades to the local backend.
        let backend: &dyn GenerationBackend = match (complexity.route, &self.remote) {
            (Route::Remote, Some(remote)) => remote.as_ref(),
            (Route::Remote, None) => {
                warn!("remote route recommended but no remote backend configured");
                self.local.as_ref()
            }
            (Route::Local, _) => self.local.as_ref(),
        };

        let task = self
            .manager
            .execute(backend, task_type, input, complexity.depth, project_name)
            .await?;

        let mut advisor_outputs = Vec::new();
        if self.advisors_enabled {
            let ctx = AgentContext {
                generated_output: Some(task.output.clone()),
            };
            for advisor in &self.advisors {
                if advisor.name() == "testing" && task_type != "code_generation" {
                    continue;
                }
                match advisor.execute(task_type, input, &ctx).await {
                    Ok(output) => {
                        agent_durations.insert(advisor.name().to_string(), output.duration_secs);
                        advisor_outputs.push(output);
                    }
                    Err(e) => {
                        // Advisory only; execution already succeeded.
                        warn!(advisor = advisor.name(), error = %e, "post agent failed");
                    }
                }
            }
        }

        Ok(SupervisedResult {
            task,
            complexity,
            gate_outputs,
            advisor_outputs,
            agent_durations,
            total_duration_secs: start.elapsed().as_secs_f64(),
        })
    }

    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.local.ping().await
    }
}
