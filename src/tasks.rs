//! Base task manager.
//!
//! Owns the retry loop around generation dispatch (the only retrying stage
//! in the system), artifact persistence, and the bounded execution history.
//! Routing decisions are made above it by the supervisor, which hands in the
//! backend to use.

use crate::artifact;
use crate::config::Config;
use crate::errors::SupervisorError;
use crate::history::TaskHistory;
use crate::llm::GenerationBackend;
use crate::phase::Phase;
use crate::project::TaskExecution;
use crate::scoring::ReasoningDepth;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of one dispatched task.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task_id: Uuid,
    pub task_type: String,
    pub model: String,
    pub output: String,
    /// Set when the output parsed into a runnable project directory.
    pub project_dir: Option<PathBuf>,
    pub duration_secs: f64,
    pub attempts: u32,
}

pub struct TaskManager {
    config: Config,
    history: Mutex<TaskHistory>,
}

impl TaskManager {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            history: Mutex::new(TaskHistory::default()),
        }
    }

    /// Dispatch a generation to `backend`, retrying with linear backoff
    /// (1s, 2s, ...) up to the configured retry count. Code-generation
    /// outputs are additionally parsed into a project directory; output with
    /// no parseable file sections yields a result without a directory so the
    /// caller can skip verification instead of failing the task.
    pub async fn execute(
        &self,
        backend: &dyn GenerationBackend,
        task_type: &str,
        input: &str,
        depth: ReasoningDepth,
        project_name: &str,
    ) -> Result<TaskResult, SupervisorError> {
        let start = std::time::Instant::now();
        let model = self.config.model_for(task_type).to_string();
        let max_retries = self.config.backends.max_retries;

        let mut output = None;
        let mut attempts = 0;
        let mut last_err = String::new();
        for attempt in 0..=max_retries {
            attempts = attempt + 1;
            match backend.generate(&model, input, depth).await {
                Ok(text) => {
                    output = Some(text);
                    break;
                }
                Err(e) => {
                    last_err = e.to_string();
                    warn!(
                        backend = backend.name(),
                        attempt = attempts,
                        error = %last_err,
                        "generation attempt failed"
                    );
                    if attempt < max_retries {
                        tokio::time::sleep(Duration::from_secs(u64::from(attempt) + 1)).await;
                    }
                }
            }
        }

        let output = output.ok_or(SupervisorError::GenerationFailed {
            attempts,
            message: last_err,
        })?;

        let project_dir = if task_type == "code_generation" {
            match artifact::write_project(&self.config.artifacts_dir, project_name, &output) {
                Ok(dir) => {
                    info!(dir = %dir.display(), "generated project written");
                    Some(dir)
                }
                Err(SupervisorError::NoFilesParsed) => {
                    warn!("generated output contained no parseable file sections");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        Ok(TaskResult {
            task_id: Uuid::new_v4(),
            task_type: task_type.to_string(),
            model,
            output,
            project_dir,
            duration_secs: start.elapsed().as_secs_f64(),
            attempts,
        })
    }

    /// Record an execution in the bounded history.
    pub fn record(
        &self,
        result: &TaskResult,
        phase: Phase,
        input: &str,
        complexity_score: u8,
        route: &str,
    ) -> TaskExecution {
        let execution = TaskExecution {
            task_id: result.task_id,
            phase,
            task_type: result.task_type.clone(),
            input: input.to_string(),
            output: result.output.clone(),
            artifact_path: result
                .project_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            complexity_score,
            execution_route: route.to_string(),
            created_at: Utc::now(),
        };
        if let Ok(mut history) = self.history.lock() {
            history.record(execution.clone());
        }
        execution
    }

    /// Most recent executions, optionally filtered by task type.
    pub fn recent_history(&self, task_type: Option<&str>, limit: usize) -> Vec<TaskExecution> {
        match self.history.lock() {
            Ok(history) => match task_type {
                Some(t) => history.recent_of_type(t, limit).into_iter().cloned().collect(),
                None => history.recent(limit).into_iter().cloned().collect(),
            },
            Err(_) => Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

pub type SharedBackend = Arc<dyn GenerationBackend>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationContext;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend that fails a fixed number of times before succeeding.
    struct FlakyBackend {
        failures: AtomicU32,
        response: String,
    }

    #[async_trait]
    impl GenerationBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _depth: ReasoningDepth,
        ) -> anyhow::Result<String> {
            if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n > 0 { Some(n - 1) } else { None }
            }).is_ok()
            {
                anyhow::bail!("transient failure")
            }
            Ok(self.response.clone())
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

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.artifacts_dir = dir.to_path_buf();
        config
    }

    const CODE_OUTPUT: &str = "### index.js\n```js\nconsole.log('ok');\n```\n";

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = TaskManager::new(test_config(tmp.path()));
        let backend = FlakyBackend {
            failures: AtomicU32::new(2),
            response: CODE_OUTPUT.to_string(),
        };

        let result = manager
            .execute(&backend, "code_generation", "make it", ReasoningDepth::Shallow, "p1")
            .await
            .unwrap();
        assert_eq!(result.attempts, 3);
        assert!(result.project_dir.is_some());
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = TaskManager::new(test_config(tmp.path()));
        let backend = FlakyBackend {
            failures: AtomicU32::new(99),
            response: String::new(),
        };

        let err = manager
            .execute(&backend, "code_generation", "make it", ReasoningDepth::Shallow, "p1")
            .await
            .unwrap_err();
        match err {
            SupervisorError::GenerationFailed { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_prose_only_code_output_has_no_project_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = TaskManager::new(test_config(tmp.path()));
        let backend = FlakyBackend {
            failures: AtomicU32::new(0),
            response: "Sure! Here is a description of the app.".to_string(),
        };

        let result = manager
            .execute(&backend, "code_generation", "make it", ReasoningDepth::Shallow, "p1")
            .await
            .unwrap();
        assert!(result.project_dir.is_none());
        assert!(!result.output.is_empty());
    }

    #[tokio::test]
    async fn test_non_code_task_skips_artifact_parse() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = TaskManager::new(test_config(tmp.path()));
        let backend = FlakyBackend {
            failures: AtomicU32::new(0),
            response: "A plan in prose.".to_string(),
        };

        let result = manager
            .execute(&backend, "planning", "plan it", ReasoningDepth::Shallow, "p1")
            .await
            .unwrap();
        assert!(result.project_dir.is_none());
    }

    #[tokio::test]
    async fn test_history_records_and_filters() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = TaskManager::new(test_config(tmp.path()));
        let backend = FlakyBackend {
            failures: AtomicU32::new(0),
            response: "output".to_string(),
        };
        let result = manager
            .execute(&backend, "planning", "plan it", ReasoningDepth::Shallow, "p1")
            .await
            .unwrap();
        manager.record(&result, Phase::Planning, "plan it", 1, "local");

        let all = manager.recent_history(None, 10);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].execution_route, "local");
        assert!(manager.recent_history(Some("code_generation"), 10).is_empty());
    }
}
