//! Advisory agents.
//!
//! Agents are thin prompt builders around a reasoning backend. Pre-execution
//! gates (requirements, tech stack, scope) can fail and abort generation;
//! post-execution advisors (QA, test plan, documentation) only annotate. The
//! three-valued decision parser lives in `decision`.

mod decision;
mod specialists;

pub use decision::{Decision, ParsedDecision, parse_decision};
pub use specialists::{
    DocumentationAgent, QaAgent, RequirementsAgent, ScopeAgent, TechStackAgent, TestPlanAgent,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Passed,
    Warning,
    Failed,
}

/// Result of one agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub agent: String,
    pub status: AgentStatus,
    pub output: String,
    pub duration_secs: f64,
    pub timestamp: DateTime<Utc>,
}

impl AgentOutput {
    pub fn new(agent: &str, status: AgentStatus, output: String, duration_secs: f64) -> Self {
        Self {
            agent: agent.to_string(),
            status,
            output,
            duration_secs,
            timestamp: Utc::now(),
        }
    }
}

/// Context handed to post-execution agents: the original request plus the
/// generated output they are reviewing.
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    pub generated_output: Option<String>,
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// True for gates that run before generation; false for post advisors.
    fn runs_before_generation(&self) -> bool;

    async fn execute(
        &self,
        task_type: &str,
        input: &str,
        ctx: &AgentContext,
    ) -> anyhow::Result<AgentOutput>;
}
