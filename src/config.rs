//! Configuration for the foundry orchestrator.
//!
//! Loaded from `foundry.toml` when present, otherwise every field falls back
//! to a default that works against a local Ollama-compatible backend. All
//! sections are optional in the file; missing keys take their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding persisted project records.
    pub projects_dir: PathBuf,
    /// Directory generated artifacts are written under.
    pub artifacts_dir: PathBuf,
    pub backends: BackendConfig,
    pub supervisor: SupervisorConfig,
    /// Per-task-type model names for the local backend.
    pub models: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Local reasoning backend (Ollama-compatible generate API).
    pub local_endpoint: String,
    /// Remote delegated-coder endpoint for deep tasks.
    pub remote_endpoint: String,
    /// Model used when a task type has no entry in `models`.
    pub default_model: String,
    /// Retries around generation dispatch, with linear backoff.
    pub max_retries: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Complexity score at or above which generation routes remote.
    pub complexity_threshold: u8,
    /// Run the requirements/tech-stack/scope gates before generation.
    pub enable_gates: bool,
    /// Run the QA/test-plan/docs advisors after generation.
    pub enable_post_agents: bool,
}

impl Default for Config {
    fn default() -> Self {
        let mut models = HashMap::new();
        models.insert("code_generation".to_string(), "qwen2.5-coder:7b".to_string());
        models.insert("planning".to_string(), "llama3.1:8b".to_string());
        models.insert("review".to_string(), "llama3.1:8b".to_string());
        Self {
            projects_dir: PathBuf::from("data/projects"),
            artifacts_dir: PathBuf::from("data/artifacts"),
            backends: BackendConfig::default(),
            supervisor: SupervisorConfig::default(),
            models,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            local_endpoint: "http://localhost:11434".to_string(),
            remote_endpoint: String::new(),
            default_model: "llama3.1:8b".to_string(),
            max_retries: 2,
            request_timeout_secs: 300,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            complexity_threshold: 7,
            enable_gates: true,
            enable_post_agents: true,
        }
    }
}

impl Config {
    /// Load `foundry.toml` from `path` if it exists, otherwise defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Model for a task type, falling back to the backend default.
    pub fn model_for(&self, task_type: &str) -> &str {
        self.models
            .get(task_type)
            .map(String::as_str)
            .unwrap_or(&self.backends.default_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("foundry.toml")).unwrap();
        assert_eq!(config.supervisor.complexity_threshold, 7);
        assert_eq!(config.backends.max_retries, 2);
        assert!(config.supervisor.enable_gates);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foundry.toml");
        std::fs::write(
            &path,
            "[supervisor]\ncomplexity_threshold = 5\n\n[backends]\nlocal_endpoint = \"http://127.0.0.1:9999\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.supervisor.complexity_threshold, 5);
        assert_eq!(config.backends.local_endpoint, "http://127.0.0.1:9999");
        // untouched keys still defaulted
        assert_eq!(config.backends.max_retries, 2);
        assert!(config.supervisor.enable_post_agents);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foundry.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_model_lookup_falls_back_to_default() {
        let config = Config::default();
        assert_eq!(config.model_for("code_generation"), "qwen2.5-coder:7b");
        assert_eq!(config.model_for("unknown_type"), "llama3.1:8b");
    }
}
