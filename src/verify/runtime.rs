//! Stage B: runtime verification.
//!
//! Spawns the detected entry point, waits 3 s for it to settle, checks the
//! process is still alive, then probes the expected port over HTTP with a
//! 2 s per-request budget. Any status below 500 counts as a healthy
//! response. The child is killed unconditionally before returning; the
//! probe ports are the ecosystem defaults and currently not configurable.

use super::Ecosystem;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const SETTLE: Duration = Duration::from_secs(3);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default)]
pub struct RuntimeReport {
    pub application_starts: bool,
    pub health_check_passed: bool,
    pub port: u16,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Entry point to launch and the directory to launch it from.
fn launch_plan(project: &Path, ecosystem: Ecosystem) -> Option<(String, Vec<String>, PathBuf)> {
    let entry = ecosystem
        .entry_points()
        .iter()
        .find(|ep| project.join(ep).exists())?;
    let full = project.join(entry);
    let dir = full.parent().unwrap_or(project).to_path_buf();
    let file = full.file_name()?.to_string_lossy().to_string();

    match ecosystem {
        Ecosystem::Node => Some(("node".to_string(), vec![file], dir)),
        Ecosystem::Python => Some(("python".to_string(), vec![file], dir)),
        Ecosystem::Go => Some(("go".to_string(), vec!["run".to_string(), ".".to_string()], dir)),
        Ecosystem::Static | Ecosystem::Unknown => None,
    }
}

fn probe_paths(ecosystem: Ecosystem) -> &'static [&'static str] {
    match ecosystem {
        Ecosystem::Node => &["/", "/health", "/api"],
        Ecosystem::Python => &["/", "/docs"],
        Ecosystem::Go => &["/", "/health"],
        Ecosystem::Static | Ecosystem::Unknown => &[],
    }
}

async fn probe(port: u16, paths: &[&str]) -> bool {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(c) => c,
        Err(_) => return false,
    };
    for path in paths {
        let url = format!("http://localhost:{port}{path}");
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().as_u16() < 500 {
                debug!(%url, status = %resp.status(), "liveness probe succeeded");
                return true;
            }
        }
    }
    false
}

/// Run stage B against a project directory.
pub async fn verify_runtime(project: &Path, ecosystem: Ecosystem) -> RuntimeReport {
    let mut report = RuntimeReport {
        port: ecosystem.default_port(),
        ..RuntimeReport::default()
    };

    match ecosystem {
        Ecosystem::Static => {
            // No server to start; readable index.html is the whole check.
            let ok = std::fs::read_to_string(project.join("index.html")).is_ok();
            report.application_starts = ok;
            report.health_check_passed = ok;
            if !ok {
                report.errors.push("index.html not found".to_string());
            }
            return report;
        }
        Ecosystem::Unknown => {
            report
                .warnings
                .push("unknown ecosystem - skipping runtime verification".to_string());
            return report;
        }
        _ => {}
    }

    let Some((program, args, dir)) = launch_plan(project, ecosystem) else {
        report.errors.push("no entry point to launch".to_string());
        return report;
    };

    let mut child = match Command::new(&program)
        .args(&args)
        .current_dir(&dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            report.errors.push(format!("failed to start application: {e}"));
            return report;
        }
    };

    report.application_starts = true;
    tokio::time::sleep(SETTLE).await;

    match child.try_wait() {
        Ok(Some(status)) => {
            report.application_starts = false;
            report
                .errors
                .push(format!("application exited immediately ({status})"));
            return report;
        }
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, "could not poll child process");
        }
    }

    report.health_check_passed = probe(report.port, probe_paths(ecosystem)).await;
    if !report.health_check_passed {
        report
            .warnings
            .push("application started but health check failed".to_string());
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill verified application");
    }

    report
}
