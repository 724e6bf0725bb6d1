//! Quality guarantee report.
//!
//! Rendered as QUALITY_REPORT.md into the artifact directory when a project
//! reaches the complete phase. Status rules: any build failure is BLOCKED;
//! build passing but runtime failing, or every test failing, is NEEDS_WORK;
//! otherwise a quality score of 70 or more is READY.

use crate::completion::CompletionMetrics;
use crate::project::Project;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandoffStatus {
    Ready,
    NeedsWork,
    Blocked,
}

impl HandoffStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HandoffStatus::Ready => "READY",
            HandoffStatus::NeedsWork => "NEEDS_WORK",
            HandoffStatus::Blocked => "BLOCKED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QualityGuarantee {
    pub project_name: String,
    pub generated_at: DateTime<Utc>,
    pub score: u8,
    pub status: HandoffStatus,
    pub metrics: CompletionMetrics,
    pub test_framework: String,
    pub tests_skipped: u32,
}

fn mark(ok: bool) -> &'static str {
    if ok { "[x]" } else { "[ ]" }
}

impl QualityGuarantee {
    pub fn from_project(project: &Project, metrics: CompletionMetrics) -> Self {
        let build_passed =
            metrics.syntax_valid && metrics.dependencies_ok && metrics.has_runnable_build;
        let runtime_passed = metrics.application_starts;
        let total_tests = metrics.tests_passed + metrics.tests_failed;

        let status = if !build_passed {
            HandoffStatus::Blocked
        } else if !runtime_passed || (total_tests > 0 && metrics.tests_passed == 0) {
            HandoffStatus::NeedsWork
        } else if metrics.quality_score >= 70 {
            HandoffStatus::Ready
        } else {
            HandoffStatus::NeedsWork
        };

        let (framework, skipped) = project
            .validation_results
            .as_ref()
            .map(|vr| (vr.test_framework.clone(), vr.tests_skipped))
            .unwrap_or_default();

        Self {
            project_name: project.name.clone(),
            generated_at: Utc::now(),
            score: metrics.quality_score,
            status,
            metrics,
            test_framework: framework,
            tests_skipped: skipped,
        }
    }

    pub fn to_markdown(&self) -> String {
        let m = &self.metrics;
        let mut out = String::new();

        let _ = writeln!(out, "# Quality Guarantee Report\n");
        let _ = writeln!(out, "**Project:** {}  ", self.project_name);
        let _ = writeln!(
            out,
            "**Generated:** {}  ",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "**Overall Score:** {}/100  ", self.score);
        let _ = writeln!(out, "**Status:** **{}**\n", self.status.as_str());
        let _ = writeln!(out, "---\n");

        let build_passed = m.syntax_valid && m.dependencies_ok && m.has_runnable_build;
        let _ = writeln!(
            out,
            "## Build Status: {}\n",
            if build_passed { "PASSED" } else { "FAILED" }
        );
        let _ = writeln!(out, "- {} Syntax validation", mark(m.syntax_valid));
        let _ = writeln!(out, "- {} Dependencies resolved", mark(m.dependencies_ok));
        let _ = writeln!(out, "- {} Entry point verified\n", mark(m.has_runnable_build));

        let _ = writeln!(
            out,
            "## Runtime Status: {}\n",
            if m.application_starts { "PASSED" } else { "FAILED" }
        );
        let _ = writeln!(out, "- {} Application starts", mark(m.application_starts));
        let _ = writeln!(out, "- {} Health check\n", mark(m.health_check_passed));

        let total_tests = m.tests_passed + m.tests_failed;
        if total_tests == 0 {
            let _ = writeln!(out, "## Test Status: NO TESTS\n");
            let _ = writeln!(out, "No tests were found or executed.\n");
        } else {
            let label = if m.tests_failed == 0 {
                "ALL PASSED".to_string()
            } else {
                let pass_rate = m.tests_passed * 100 / total_tests;
                format!("PARTIAL ({}/{} passed, {pass_rate}%)", m.tests_passed, total_tests)
            };
            let _ = writeln!(out, "## Test Status: {label}\n");
            let _ = writeln!(out, "- Tests executed: {total_tests}");
            let _ = writeln!(out, "- Tests passed: {}", m.tests_passed);
            let _ = writeln!(out, "- Tests failed: {}", m.tests_failed);
            if self.tests_skipped > 0 {
                let _ = writeln!(out, "- Tests skipped: {}", self.tests_skipped);
            }
            if !self.test_framework.is_empty() {
                let _ = writeln!(out, "- Framework: {}", self.test_framework);
            }
            out.push('\n');
        }

        let _ = writeln!(
            out,
            "## Documentation: {}\n",
            if m.has_readme { "COMPLETE" } else { "MISSING" }
        );
        let _ = writeln!(out, "- {} README present", mark(m.has_readme));
        let _ = writeln!(out, "- {} Setup instructions\n", mark(m.has_setup_section));

        let _ = writeln!(out, "## Deployment Readiness\n");
        let _ = writeln!(out, "- {} Deployment configuration", mark(m.has_deploy_config));
        let _ = writeln!(out, "- {} Environment documented\n", mark(m.has_env_example));

        if !m.blocking_issues.is_empty() {
            let _ = writeln!(out, "## Blocking Issues\n");
            for issue in &m.blocking_issues {
                let _ = writeln!(out, "- {issue}");
            }
            out.push('\n');
        }

        let _ = writeln!(out, "---\n");
        let _ = writeln!(out, "## Summary\n");
        match self.status {
            HandoffStatus::Ready => {
                let _ = writeln!(
                    out,
                    "**This project is READY for hand-off.** All critical checks passed: the code builds, runs, and its quality score clears the bar."
                );
            }
            HandoffStatus::NeedsWork => {
                let _ = writeln!(
                    out,
                    "**This project NEEDS WORK before hand-off.** Review the failed checks above before delivering."
                );
            }
            HandoffStatus::Blocked => {
                let _ = writeln!(
                    out,
                    "**This project is BLOCKED.** The build does not pass; hand-off is not possible until the blocking issues are resolved."
                );
            }
        }

        out
    }

    /// Write QUALITY_REPORT.md into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join("QUALITY_REPORT.md");
        std::fs::write(&path, self.to_markdown())
            .with_context(|| format!("Failed to write quality report at {}", path.display()))
    }
}
