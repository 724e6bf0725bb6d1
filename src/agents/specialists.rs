//! The six advisory agents.
//!
//! Gates (requirements, tech stack, scope) run before generation and derive
//! a pass/warn/fail status from a verdict keyword in the response. Post
//! advisors (QA, test plan, documentation) review the generated output and
//! always report `passed`; their value is the annotation, not the verdict.

use super::{Agent, AgentContext, AgentOutput, AgentStatus};
use crate::llm::GenerationBackend;
use crate::scoring::ReasoningDepth;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

type Backend = Arc<dyn GenerationBackend>;

async fn run(backend: &Backend, model: &str, prompt: &str) -> Result<(String, f64)> {
    let start = Instant::now();
    let response = backend
        .generate(model, prompt, ReasoningDepth::Balanced)
        .await?;
    Ok((response, start.elapsed().as_secs_f64()))
}

/// Validates requirement completeness before anything is generated.
pub struct RequirementsAgent {
    backend: Backend,
    model: String,
}

impl RequirementsAgent {
    pub fn new(backend: Backend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    fn parse_status(response: &str) -> AgentStatus {
        if response.contains("COMPLETE") && !response.contains("INCOMPLETE") {
            AgentStatus::Passed
        } else if response.contains("INCOMPLETE") {
            AgentStatus::Failed
        } else {
            // NEEDS_CLARIFICATION
            AgentStatus::Warning
        }
    }
}

#[async_trait]
impl Agent for RequirementsAgent {
    fn name(&self) -> &str {
        "requirements"
    }

    fn runs_before_generation(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        task_type: &str,
        input: &str,
        _ctx: &AgentContext,
    ) -> Result<AgentOutput> {
        let prompt = format!(
            "You are a senior requirements analyst validating a request before \
             an automated build starts.\n\
             Task type: {task_type}\n\
             Request:\n{input}\n\n\
             Assess whether the request carries enough information to build a \
             working MVP. List the essential feature set, the blockers that \
             genuinely cannot be assumed, and the assumptions that are safe.\n\
             End with a single line:\n\
             Status: COMPLETE | INCOMPLETE | NEEDS_CLARIFICATION"
        );
        let (response, duration) = run(&self.backend, &self.model, &prompt).await?;
        let status = Self::parse_status(&response);
        Ok(AgentOutput::new(self.name(), status, response, duration))
    }
}

/// Approves or rejects the implied technology stack.
pub struct TechStackAgent {
    backend: Backend,
    model: String,
}

impl TechStackAgent {
    pub fn new(backend: Backend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    fn parse_status(response: &str) -> AgentStatus {
        if response.contains("APPROVED") {
            AgentStatus::Passed
        } else if response.contains("REJECTED") {
            AgentStatus::Failed
        } else {
            // NEEDS_REVISION
            AgentStatus::Warning
        }
    }
}

#[async_trait]
impl Agent for TechStackAgent {
    fn name(&self) -> &str {
        "techstack"
    }

    fn runs_before_generation(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        _task_type: &str,
        input: &str,
        _ctx: &AgentContext,
    ) -> Result<AgentOutput> {
        let prompt = format!(
            "You are a pragmatic tech lead reviewing the technology choices \
             implied by this request:\n{input}\n\n\
             Recommend a lightweight stack that a generated MVP can actually \
             run on, flag anything enterprise-heavy, and end with a single \
             line:\n\
             Verdict: APPROVED | REJECTED | NEEDS_REVISION"
        );
        let (response, duration) = run(&self.backend, &self.model, &prompt).await?;
        let status = Self::parse_status(&response);
        Ok(AgentOutput::new(self.name(), status, response, duration))
    }
}

/// Checks the request is sized for a single generated project.
pub struct ScopeAgent {
    backend: Backend,
    model: String,
}

impl ScopeAgent {
    pub fn new(backend: Backend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    fn parse_status(response: &str) -> AgentStatus {
        if response.contains("APPROPRIATE") {
            AgentStatus::Passed
        } else if response.contains("TOO_BROAD") {
            AgentStatus::Failed
        } else {
            // TOO_NARROW
            AgentStatus::Warning
        }
    }
}

#[async_trait]
impl Agent for ScopeAgent {
    fn name(&self) -> &str {
        "scope"
    }

    fn runs_before_generation(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        task_type: &str,
        input: &str,
        _ctx: &AgentContext,
    ) -> Result<AgentOutput> {
        let prompt = format!(
            "You are validating the scope of a {task_type} request:\n{input}\n\n\
             Decide whether this fits a single buildable project. Name any \
             scope-creep features to defer. End with a single line:\n\
             Scope: APPROPRIATE | TOO_BROAD | TOO_NARROW"
        );
        let (response, duration) = run(&self.backend, &self.model, &prompt).await?;
        let status = Self::parse_status(&response);
        Ok(AgentOutput::new(self.name(), status, response, duration))
    }
}

fn generated_output(ctx: &AgentContext) -> Result<&str> {
    match &ctx.generated_output {
        Some(output) => Ok(output),
        None => bail!("no generated output in agent context"),
    }
}

/// Reviews generated code for bugs and security issues. Advisory only.
pub struct QaAgent {
    backend: Backend,
    model: String,
}

impl QaAgent {
    pub fn new(backend: Backend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Agent for QaAgent {
    fn name(&self) -> &str {
        "qa"
    }

    fn runs_before_generation(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _task_type: &str,
        input: &str,
        ctx: &AgentContext,
    ) -> Result<AgentOutput> {
        let output = generated_output(ctx)?;
        let prompt = format!(
            "You are a senior QA engineer and security reviewer.\n\
             Original request:\n{input}\n\nGenerated output:\n{output}\n\n\
             Identify bugs, security issues and production risks, ordered by \
             severity."
        );
        let (response, duration) = run(&self.backend, &self.model, &prompt).await?;
        Ok(AgentOutput::new(
            self.name(),
            AgentStatus::Passed,
            response,
            duration,
        ))
    }
}

/// Drafts a test plan for the generated code. Advisory only.
pub struct TestPlanAgent {
    backend: Backend,
    model: String,
}

impl TestPlanAgent {
    pub fn new(backend: Backend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Agent for TestPlanAgent {
    fn name(&self) -> &str {
        "testing"
    }

    fn runs_before_generation(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _task_type: &str,
        input: &str,
        ctx: &AgentContext,
    ) -> Result<AgentOutput> {
        let output = generated_output(ctx)?;
        let prompt = format!(
            "You are a test engineer. Given the request:\n{input}\n\n\
             and the generated code:\n{output}\n\n\
             Produce a prioritized test plan: the critical paths to cover, \
             suggested unit and integration tests, and edge cases worth \
             guarding."
        );
        let (response, duration) = run(&self.backend, &self.model, &prompt).await?;
        Ok(AgentOutput::new(
            self.name(),
            AgentStatus::Passed,
            response,
            duration,
        ))
    }
}

/// Writes usage documentation for the generated code. Advisory only.
pub struct DocumentationAgent {
    backend: Backend,
    model: String,
}

impl DocumentationAgent {
    pub fn new(backend: Backend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Agent for DocumentationAgent {
    fn name(&self) -> &str {
        "documentation"
    }

    fn runs_before_generation(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _task_type: &str,
        input: &str,
        ctx: &AgentContext,
    ) -> Result<AgentOutput> {
        let output = generated_output(ctx)?;
        let prompt = format!(
            "You are a technical writer. For the project requested as:\n{input}\n\n\
             with generated code:\n{output}\n\n\
             Write a concise README: what it does, setup steps, how to run it, \
             and how to run its tests."
        );
        let (response, duration) = run(&self.backend, &self.model, &prompt).await?;
        Ok(AgentOutput::new(
            self.name(),
            AgentStatus::Passed,
            response,
            duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements_status_parsing() {
        assert_eq!(
            RequirementsAgent::parse_status("Status: COMPLETE"),
            AgentStatus::Passed
        );
        assert_eq!(
            RequirementsAgent::parse_status("Status: INCOMPLETE"),
            AgentStatus::Failed
        );
        assert_eq!(
            RequirementsAgent::parse_status("Status: NEEDS_CLARIFICATION"),
            AgentStatus::Warning
        );
    }

    #[test]
    fn test_techstack_status_parsing() {
        assert_eq!(
            TechStackAgent::parse_status("Verdict: APPROVED"),
            AgentStatus::Passed
        );
        assert_eq!(
            TechStackAgent::parse_status("Verdict: REJECTED - too heavy"),
            AgentStatus::Failed
        );
        assert_eq!(
            TechStackAgent::parse_status("Verdict: NEEDS_REVISION"),
            AgentStatus::Warning
        );
    }

    #[test]
    fn test_scope_status_parsing() {
        assert_eq!(
            ScopeAgent::parse_status("Scope: APPROPRIATE"),
            AgentStatus::Passed
        );
        assert_eq!(
            ScopeAgent::parse_status("Scope: TOO_BROAD"),
            AgentStatus::Failed
        );
        assert_eq!(
            ScopeAgent::parse_status("Scope: TOO_NARROW"),
            AgentStatus::Warning
        );
    }

    #[test]
    fn test_missing_verdict_is_warning_not_failure() {
        assert_eq!(
            RequirementsAgent::parse_status("looks fine to me"),
            AgentStatus::Warning
        );
    }
}
