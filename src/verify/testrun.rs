//! Stage C: test execution.
//!
//! Runs the project's own test suite (30 s budget) and parses the counts
//! out of the runner's output. Framework detection for Node comes from
//! package.json dependencies; Python tries pytest first and falls back to
//! unittest discovery. A timeout is its own error kind, and a non-zero
//! exit only becomes an error when no counts were parsed, because failing
//! tests exit non-zero too.

use super::Ecosystem;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;

const TEST_TIMEOUT: Duration = Duration::from_secs(30);

static JEST_COUNTS: LazyLock<Regex> = LazyLock::new(|| {
    // "Tests: 2 failed, 3 passed, 5 total"
    Regex::new(r"Tests:\s+(?:(\d+)\s+failed,\s*)?(?:(\d+)\s+passed,\s*)?(\d+)\s+total").unwrap()
});
static MOCHA_PASSING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+passing").unwrap());
static MOCHA_FAILING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+failing").unwrap());
static COUNT_PASSED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+passed").unwrap());
static COUNT_FAILED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+failed").unwrap());
static COUNT_SKIPPED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+skipped").unwrap());
static PAREN_TOTAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)\)").unwrap());
static UNITTEST_RAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Ran\s+(\d+)\s+test").unwrap());
static UNITTEST_FAILURES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"failures=(\d+)").unwrap());

#[derive(Debug, Clone, Default)]
pub struct TestReport {
    pub tests_executed: bool,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total: u32,
    pub framework: String,
    pub output: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

enum RunOutcome {
    Completed { success: bool, output: String },
    TimedOut,
    SpawnFailed(String),
}

async fn run(program: &str, args: &[&str], dir: &Path) -> RunOutcome {
    let child = match Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(c) => c,
        Err(e) => return RunOutcome::SpawnFailed(e.to_string()),
    };

    match tokio::time::timeout(TEST_TIMEOUT, child.wait_with_output()).await {
        Err(_) => RunOutcome::TimedOut,
        Ok(Err(e)) => RunOutcome::SpawnFailed(e.to_string()),
        Ok(Ok(out)) => RunOutcome::Completed {
            success: out.status.success(),
            output: format!(
                "{}{}",
                String::from_utf8_lossy(&out.stdout),
                String::from_utf8_lossy(&out.stderr)
            ),
        },
    }
}

fn capture_u32(re: &Regex, text: &str, group: usize) -> Option<u32> {
    re.captures(text)
        .and_then(|c| c.get(group))
        .and_then(|m| m.as_str().parse().ok())
}

fn parse_jest(output: &str, report: &mut TestReport) {
    if let Some(caps) = JEST_COUNTS.captures(output) {
        report.failed = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        report.passed = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        report.total = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    }
}

fn parse_mocha(output: &str, report: &mut TestReport) {
    report.passed = capture_u32(&MOCHA_PASSING, output, 1).unwrap_or(0);
    report.failed = capture_u32(&MOCHA_FAILING, output, 1).unwrap_or(0);
    report.total = report.passed + report.failed;
}

fn parse_vitest(output: &str, report: &mut TestReport) {
    // "Tests  3 passed | 2 failed (5)"
    for line in output.lines() {
        let line = line.trim();
        if !line.starts_with("Tests ") && !line.starts_with("Test Files ") {
            continue;
        }
        if let Some(n) = capture_u32(&COUNT_PASSED, line, 1) {
            report.passed = n;
        }
        if let Some(n) = capture_u32(&COUNT_FAILED, line, 1) {
            report.failed = n;
        }
        if let Some(n) = capture_u32(&COUNT_SKIPPED, line, 1) {
            report.skipped = n;
        }
        if let Some(n) = capture_u32(&PAREN_TOTAL, line, 1) {
            report.total = n;
        }
    }
    if report.total == 0 {
        report.total = report.passed + report.failed + report.skipped;
    }
}

/// Fallback for unrecognized Node runners: count result glyphs.
fn parse_glyphs(output: &str, report: &mut TestReport) {
    let passed = output.matches('✓').count() + output.matches('✔').count();
    let failed = output.matches('✗').count() + output.matches('×').count();
    if passed > 0 || failed > 0 {
        report.passed = passed as u32;
        report.failed = failed as u32;
        report.total = report.passed + report.failed;
    }
}

fn parse_pytest(output: &str, report: &mut TestReport) {
    // "2 failed, 5 passed, 1 skipped in 1.23s"
    report.failed = capture_u32(&COUNT_FAILED, output, 1).unwrap_or(0);
    report.passed = capture_u32(&COUNT_PASSED, output, 1).unwrap_or(0);
    report.skipped = capture_u32(&COUNT_SKIPPED, output, 1).unwrap_or(0);
    report.total = report.failed + report.passed + report.skipped;
}

fn parse_unittest(output: &str, report: &mut TestReport) {
    report.total = capture_u32(&UNITTEST_RAN, output, 1).unwrap_or(0);
    if output.contains("FAILED") {
        report.failed = capture_u32(&UNITTEST_FAILURES, output, 1).unwrap_or(0);
        report.passed = report.total.saturating_sub(report.failed);
    } else if output.contains("OK") {
        report.passed = report.total;
    }
}

fn parse_go_test(output: &str, report: &mut TestReport) {
    for line in output.lines() {
        let line = line.trim_start();
        if line.starts_with("--- PASS:") {
            report.passed += 1;
        } else if line.starts_with("--- FAIL:") {
            report.failed += 1;
        } else if line.starts_with("--- SKIP:") {
            report.skipped += 1;
        }
    }
    report.total = report.passed + report.failed + report.skipped;
}

fn node_framework(project: &Path) -> (String, Option<PathBuf>) {
    let package_path = ["package.json", "backend/package.json"]
        .iter()
        .map(|p| project.join(p))
        .find(|p| p.exists());
    let Some(package_path) = package_path else {
        return ("unknown".to_string(), None);
    };
    let dir = package_path.parent().map(Path::to_path_buf);

    let parsed: Option<serde_json::Value> = std::fs::read_to_string(&package_path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok());
    let Some(json) = parsed else {
        return ("unknown".to_string(), dir);
    };

    let has_dep = |name: &str| {
        ["dependencies", "devDependencies"]
            .iter()
            .any(|key| json.get(key).and_then(|d| d.get(name)).is_some())
    };
    let framework = if has_dep("jest") {
        "jest"
    } else if has_dep("mocha") {
        "mocha"
    } else if has_dep("vitest") {
        "vitest"
    } else {
        "unknown"
    };

    let has_test_script = json
        .get("scripts")
        .and_then(|s| s.get("test"))
        .is_some();
    if !has_test_script {
        return (format!("{framework}:no-script"), dir);
    }
    (framework.to_string(), dir)
}

fn finish(report: &mut TestReport, outcome: RunOutcome) {
    match outcome {
        RunOutcome::TimedOut => {
            report
                .errors
                .push("test execution timed out after 30 seconds".to_string());
        }
        RunOutcome::SpawnFailed(e) => {
            report.errors.push(format!("test execution failed: {e}"));
        }
        RunOutcome::Completed { success, output } => {
            report.output = output;
            if report.total > 0 {
                report.tests_executed = true;
            } else if success {
                report
                    .warnings
                    .push("tests ran but no test results detected in output".to_string());
            } else {
                report
                    .errors
                    .push("test command failed and no results were parsed".to_string());
            }
        }
    }
}

/// Run stage C against a project directory.
pub async fn run_tests(project: &Path, ecosystem: Ecosystem) -> TestReport {
    let mut report = TestReport::default();

    match ecosystem {
        Ecosystem::Node => {
            let (framework, dir) = node_framework(project);
            let Some(dir) = dir else {
                report.errors.push("no package.json found".to_string());
                return report;
            };
            if let Some(fw) = framework.strip_suffix(":no-script") {
                report.framework = fw.to_string();
                report
                    .warnings
                    .push("no test script found in package.json".to_string());
                return report;
            }
            report.framework = framework.clone();

            let outcome = run("npm", &["test"], &dir).await;
            if let RunOutcome::Completed { output, .. } = &outcome {
                match framework.as_str() {
                    "jest" => parse_jest(output, &mut report),
                    "mocha" => parse_mocha(output, &mut report),
                    "vitest" => parse_vitest(output, &mut report),
                    _ => parse_glyphs(output, &mut report),
                }
            }
            finish(&mut report, outcome);
        }
        Ecosystem::Python => {
            let outcome = run("pytest", &["--tb=short", "-v"], project).await;
            let pytest_found_nothing = matches!(
                &outcome,
                RunOutcome::Completed { success: false, output } if output.contains("no tests ran")
            ) || matches!(&outcome, RunOutcome::SpawnFailed(_));

            if pytest_found_nothing {
                report.framework = "unittest".to_string();
                let outcome = run("python", &["-m", "unittest", "discover", "-v"], project).await;
                if let RunOutcome::Completed { output, .. } = &outcome {
                    parse_unittest(output, &mut report);
                }
                finish(&mut report, outcome);
            } else {
                report.framework = "pytest".to_string();
                if let RunOutcome::Completed { output, .. } = &outcome {
                    parse_pytest(output, &mut report);
                }
                finish(&mut report, outcome);
            }
        }
        Ecosystem::Go => {
            report.framework = "go test".to_string();
            let dir = if project.join("go.mod").exists() {
                project.to_path_buf()
            } else if project.join("backend/go.mod").exists() {
                project.join("backend")
            } else {
                report.errors.push("no go.mod found".to_string());
                return report;
            };
            let outcome = run("go", &["test", "-v", "./..."], &dir).await;
            if let RunOutcome::Completed { output, .. } = &outcome {
                parse_go_test(output, &mut report);
            }
            finish(&mut report, outcome);
        }
        Ecosystem::Static => {
            report
                .warnings
                .push("static sites have no test suite to run".to_string());
        }
        Ecosystem::Unknown => {
            report
                .warnings
                .push("unknown ecosystem - skipping test execution".to_string());
        }
    }

    report
}
