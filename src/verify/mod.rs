//! Three-stage verification pipeline for generated projects.
//!
//! Stage A (`build`) checks entry point, dependency installation, and
//! per-file syntax. Stage B (`runtime`) starts the application and probes
//! it over HTTP. Stage C (`testrun`) runs the project's own tests and
//! parses the counts. Stages B and C run only when stage A passed; a
//! syntax or entry-point failure is final.
//!
//! Aggregate verdict:
//! - syntax or entry point invalid → `Block`
//! - only dependency installation failed → `Refine`
//! - stage A clean → `Proceed`, with stage B/C findings carried as warnings

pub mod build;
pub mod runtime;
pub mod testrun;

pub use build::{BuildReport, verify_build};
pub use runtime::{RuntimeReport, verify_runtime};
pub use testrun::{TestReport, run_tests};

use crate::project::ValidationResults;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Detected project ecosystem. Detection probes the project root and the
/// `backend/` subdirectory, in a fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    Node,
    Python,
    Go,
    Static,
    Unknown,
}

impl Ecosystem {
    pub fn detect(project: &Path) -> Self {
        let at = |rel: &str| project.join(rel).exists();
        if at("package.json") || at("backend/package.json") {
            Ecosystem::Node
        } else if at("requirements.txt") || at("setup.py") || at("backend/requirements.txt") {
            Ecosystem::Python
        } else if at("go.mod") || at("backend/go.mod") {
            Ecosystem::Go
        } else if at("index.html") {
            Ecosystem::Static
        } else {
            Ecosystem::Unknown
        }
    }

    /// Entry-point candidates, relative to the project root, probed in order.
    pub fn entry_points(self) -> &'static [&'static str] {
        match self {
            Ecosystem::Node => &[
                "server.js",
                "backend/server.js",
                "index.js",
                "app.js",
                "main.js",
            ],
            Ecosystem::Python => &["main.py", "backend/main.py", "app.py", "server.py"],
            Ecosystem::Go => &["main.go", "backend/main.go"],
            Ecosystem::Static => &["index.html"],
            Ecosystem::Unknown => &[],
        }
    }

    /// Port the generated application is expected to listen on.
    pub fn default_port(self) -> u16 {
        match self {
            Ecosystem::Node => 3000,
            Ecosystem::Python => 8000,
            Ecosystem::Go => 8080,
            Ecosystem::Static | Ecosystem::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ecosystem::Node => "node",
            Ecosystem::Python => "python",
            Ecosystem::Go => "go",
            Ecosystem::Static => "static",
            Ecosystem::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final pipeline decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Proceed,
    Refine,
    Block,
}

/// Everything the pipeline learned about one project.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub ecosystem: Ecosystem,
    pub build: BuildReport,
    pub runtime: Option<RuntimeReport>,
    pub tests: Option<TestReport>,
    pub verdict: Verdict,
    pub warnings: Vec<String>,
}

impl PipelineOutcome {
    /// Fold the outcome into the persisted record shape.
    pub fn to_validation_results(&self) -> ValidationResults {
        let mut results = ValidationResults {
            build_verified: self.build.passed(),
            syntax_valid: self.build.syntax_valid,
            dependencies_ok: self.build.dependencies_ok,
            entry_point_valid: self.build.entry_point_valid,
            build_errors: self.build.errors.clone(),
            last_validated: Utc::now(),
            ..ValidationResults::default()
        };
        if let Some(rt) = &self.runtime {
            results.runtime_verified = rt.application_starts && rt.health_check_passed;
            results.application_starts = rt.application_starts;
            results.health_check_passed = rt.health_check_passed;
            results.runtime_errors = rt.errors.clone();
            results.runtime_warnings = rt.warnings.clone();
        }
        if let Some(t) = &self.tests {
            results.tests_executed = t.tests_executed;
            results.tests_passed = t.passed;
            results.tests_failed = t.failed;
            results.tests_skipped = t.skipped;
            results.total_tests = t.total;
            results.test_framework = t.framework.clone();
            results.test_errors = t.errors.clone();
        }
        results
    }
}

/// Run the full pipeline against a generated project directory.
pub async fn run_pipeline(project: &Path) -> PipelineOutcome {
    let ecosystem = Ecosystem::detect(project);
    info!(project = %project.display(), ecosystem = %ecosystem, "verification pipeline starting");

    let build = verify_build(project, ecosystem).await;
    let mut warnings = build.warnings.clone();

    // Syntax or entry-point failure is final. Unknown ecosystems never ran
    // a hard check, so they fall through to Proceed with a warning.
    if ecosystem != Ecosystem::Unknown && (!build.syntax_valid || !build.entry_point_valid) {
        return PipelineOutcome {
            ecosystem,
            build,
            runtime: None,
            tests: None,
            verdict: Verdict::Block,
            warnings,
        };
    }

    if ecosystem != Ecosystem::Unknown && !build.dependencies_ok {
        return PipelineOutcome {
            ecosystem,
            build,
            runtime: None,
            tests: None,
            verdict: Verdict::Refine,
            warnings,
        };
    }

    let runtime = verify_runtime(project, ecosystem).await;
    if !runtime.application_starts {
        warnings.push("application failed to start".to_string());
    } else if !runtime.health_check_passed {
        warnings.push("application started but health check failed".to_string());
    }
    warnings.extend(runtime.warnings.clone());

    let tests = run_tests(project, ecosystem).await;
    if tests.tests_executed && tests.failed > 0 {
        warnings.push(format!("{} of {} tests failed", tests.failed, tests.total));
    } else if !tests.tests_executed {
        warnings.push("no tests were executed".to_string());
    }
    warnings.extend(tests.warnings.clone());

    PipelineOutcome {
        ecosystem,
        build,
        runtime: Some(runtime),
        tests: Some(tests),
        verdict: Verdict::Proceed,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_prefers_node_over_static() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        fs::write(tmp.path().join("index.html"), "<html></html>").unwrap();
        assert_eq!(Ecosystem::detect(tmp.path()), Ecosystem::Node);
    }

    #[test]
    fn test_detect_probes_backend_subdir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("backend")).unwrap();
        fs::write(tmp.path().join("backend/requirements.txt"), "flask").unwrap();
        assert_eq!(Ecosystem::detect(tmp.path()), Ecosystem::Python);
    }

    #[test]
    fn test_detect_empty_dir_is_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(Ecosystem::detect(tmp.path()), Ecosystem::Unknown);
    }

    #[test]
    fn test_detection_priority_order() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("go.mod"), "module x").unwrap();
        fs::write(tmp.path().join("index.html"), "<html></html>").unwrap();
        assert_eq!(Ecosystem::detect(tmp.path()), Ecosystem::Go);

        fs::write(tmp.path().join("requirements.txt"), "").unwrap();
        assert_eq!(Ecosystem::detect(tmp.path()), Ecosystem::Python);

        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        assert_eq!(Ecosystem::detect(tmp.path()), Ecosystem::Node);
    }

    #[tokio::test]
    async fn test_missing_entry_point_blocks() {
        let tmp = tempfile::tempdir().unwrap();
        // Node project with no entry point candidate at all
        fs::write(tmp.path().join("package.json"), "{\"name\":\"x\"}").unwrap();
        let outcome = run_pipeline(tmp.path()).await;
        assert_eq!(outcome.verdict, Verdict::Block);
        assert!(outcome.runtime.is_none());
        assert!(outcome.tests.is_none());
    }

    #[tokio::test]
    async fn test_unknown_ecosystem_proceeds_with_warning() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.txt"), "nothing runnable").unwrap();
        let outcome = run_pipeline(tmp.path()).await;
        assert_eq!(outcome.ecosystem, Ecosystem::Unknown);
        assert_eq!(outcome.verdict, Verdict::Proceed);
        assert!(!outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_static_site_proceeds() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("index.html"),
            "<html><head></head><body>hi</body></html>",
        )
        .unwrap();
        let outcome = run_pipeline(tmp.path()).await;
        assert_eq!(outcome.ecosystem, Ecosystem::Static);
        assert_eq!(outcome.verdict, Verdict::Proceed);
        let results = outcome.to_validation_results();
        assert!(results.syntax_valid);
        assert!(results.application_starts);
    }
}
