//! Hand-off readiness metrics.
//!
//! When a generated project directory exists on disk the checks run against
//! it live; otherwise detection falls back to scanning the recorded task
//! outputs for language markers (entry points, test constructs, README
//! sections). Completion percentage combines phase weights with a criteria
//! bonus; the quality score grades the verified build, runtime, tests, docs
//! and deployment readiness on a 0-100 scale.

use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENTRY_POINT_MARKERS: &[&str] = &[
    "func main()",
    "package main",
    "if __name__ == \"__main__\":",
    "if __name__ == '__main__':",
    "function main()",
    "export default",
    "module.exports",
    "public static void main(",
    "fn main()",
    "int main(",
];

const TEST_MARKERS: &[&str] = &[
    "func Test",
    "testing.T",
    "def test_",
    "class Test",
    "import unittest",
    "import pytest",
    "it(\"",
    "it('",
    "describe(\"",
    "describe('",
    "test(\"",
    "test('",
    "@Test",
    "#[test]",
];

const README_MARKERS: &[&str] = &[
    "# Setup",
    "## Setup",
    "# Installation",
    "## Installation",
    "# Usage",
    "## Usage",
    "# Getting Started",
    "## Getting Started",
    "### Prerequisites",
    "How to run",
    "How to use",
    "Quick Start",
];

const DEPLOY_CONFIG_FILES: &[&str] = &["Dockerfile", "Procfile", "vercel.json", "fly.toml"];

/// Snapshot of a project's hand-off readiness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionMetrics {
    pub has_runnable_build: bool,
    pub has_tests: bool,
    pub has_readme: bool,
    pub syntax_valid: bool,
    pub dependencies_ok: bool,
    pub application_starts: bool,
    pub health_check_passed: bool,
    pub tests_executed: bool,
    pub tests_passed: u32,
    pub tests_failed: u32,
    pub has_setup_section: bool,
    pub has_deploy_config: bool,
    pub has_env_example: bool,
    pub completion_pct: f64,
    pub quality_score: u8,
    pub blocking_issues: Vec<String>,
}

/// Locate the generated project directory recorded in artifact paths.
fn project_directory(project: &Project) -> Option<PathBuf> {
    project
        .artifact_paths
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_dir())
}

fn any_artifact_contains(dir: Option<&Path>, project: &Project, markers: &[&str]) -> bool {
    // Live files first, then recorded outputs.
    if let Some(dir) = dir {
        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            if let Ok(content) = std::fs::read_to_string(entry.path()) {
                if markers.iter().any(|m| content.contains(m)) {
                    return true;
                }
            }
        }
    }
    project
        .tasks
        .iter()
        .any(|t| markers.iter().any(|m| t.output.contains(m)))
}

fn readme_marker_count(dir: Option<&Path>, project: &Project) -> usize {
    let mut count = 0;
    let mut scan = |content: &str| {
        count += README_MARKERS.iter().filter(|m| content.contains(*m)).count();
    };
    if let Some(dir) = dir {
        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            if let Ok(content) = std::fs::read_to_string(entry.path()) {
                scan(&content);
            }
        }
    }
    for task in &project.tasks {
        scan(&task.output);
    }
    count
}

/// Evaluate hand-off readiness for `project`.
pub fn validate_handoff(project: &Project) -> CompletionMetrics {
    let mut metrics = CompletionMetrics::default();
    let dir = project_directory(project);
    let dir_ref = dir.as_deref();

    metrics.has_runnable_build =
        any_artifact_contains(dir_ref, project, ENTRY_POINT_MARKERS);
    metrics.has_tests = any_artifact_contains(dir_ref, project, TEST_MARKERS);
    // A README needs at least two recognizable sections.
    metrics.has_readme = readme_marker_count(dir_ref, project) >= 2;
    metrics.has_setup_section =
        any_artifact_contains(dir_ref, project, &["# Setup", "## Setup", "# Installation", "## Installation"]);

    if let Some(dir) = dir_ref {
        metrics.has_deploy_config = DEPLOY_CONFIG_FILES.iter().any(|f| dir.join(f).exists());
        metrics.has_env_example = dir.join(".env.example").exists();
    }

    if let Some(vr) = &project.validation_results {
        metrics.syntax_valid = vr.syntax_valid;
        metrics.dependencies_ok = vr.dependencies_ok;
        metrics.application_starts = vr.application_starts;
        metrics.health_check_passed = vr.health_check_passed;
        metrics.tests_executed = vr.tests_executed;
        metrics.tests_passed = vr.tests_passed;
        metrics.tests_failed = vr.tests_failed;
        // Live verification supersedes marker detection.
        if vr.entry_point_valid && vr.syntax_valid {
            metrics.has_runnable_build = true;
        }
    }

    metrics.completion_pct = completion_percentage(project, &metrics);
    metrics.quality_score = quality_score(&metrics);

    if !metrics.has_runnable_build {
        metrics
            .blocking_issues
            .push("No runnable build detected".to_string());
    }
    if !metrics.has_tests {
        metrics.blocking_issues.push("No tests detected".to_string());
    }
    if !metrics.has_readme {
        metrics
            .blocking_issues
            .push("No README documentation detected".to_string());
    }

    metrics
}

/// Phase weights plus criteria bonus (+7 build, +7 tests, +6 README),
/// capped at 100.
pub fn completion_percentage(project: &Project, metrics: &CompletionMetrics) -> f64 {
    let mut total: f64 = crate::phase::PHASE_ORDER
        .iter()
        .filter(|p| project.phase_completed(**p))
        .map(|p| p.weight())
        .sum();

    if metrics.has_runnable_build {
        total += 7.0;
    }
    if metrics.has_tests {
        total += 7.0;
    }
    if metrics.has_readme {
        total += 6.0;
    }

    total.min(100.0)
}

/// 0-100 quality score over the verified guarantees.
pub fn quality_score(metrics: &CompletionMetrics) -> u8 {
    let mut score = 0u32;

    // Build (35)
    if metrics.syntax_valid {
        score += 15;
    }
    if metrics.dependencies_ok {
        score += 10;
    }
    if metrics.has_runnable_build {
        score += 10;
    }

    // Runtime (25)
    if metrics.application_starts {
        score += 15;
    }
    if metrics.health_check_passed {
        score += 10;
    }

    // Tests (20): presence plus pass rate
    let test_total = metrics.tests_passed + metrics.tests_failed;
    if metrics.tests_executed && test_total > 0 {
        score += 5;
        let pass_rate = f64::from(metrics.tests_passed) / f64::from(test_total);
        score += (pass_rate * 15.0) as u32;
    }

    // Documentation (10)
    if metrics.has_readme {
        score += 5;
    }
    if metrics.has_setup_section {
        score += 5;
    }

    // Deployment readiness (10)
    if metrics.has_deploy_config {
        score += 5;
    }
    if metrics.has_env_example {
        score += 5;
    }

    score.min(100) as u8
}
