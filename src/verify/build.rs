//! Stage A: build verification.
//!
//! Entry-point presence, dependency installation (120 s budget) and
//! per-file syntax checks. Every check appends to the build log; the first
//! syntax failure per file is reported with its location in the tool's own
//! output.

use super::Ecosystem;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

const INSTALL_TIMEOUT: Duration = Duration::from_secs(120);
const SYNTAX_TIMEOUT: Duration = Duration::from_secs(10);
const GO_BUILD_TIMEOUT: Duration = Duration::from_secs(30);

const SKIP_DIRS: &[&str] = &["node_modules", "venv", "__pycache__", ".git"];

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub syntax_valid: bool,
    pub dependencies_ok: bool,
    pub entry_point_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub build_log: String,
}

impl BuildReport {
    pub fn passed(&self) -> bool {
        self.syntax_valid && self.dependencies_ok && self.entry_point_valid
    }
}

/// Run stage A against a project directory.
pub async fn verify_build(project: &Path, ecosystem: Ecosystem) -> BuildReport {
    let mut report = BuildReport::default();

    if ecosystem == Ecosystem::Unknown {
        report.warnings.push(
            "could not determine project ecosystem - skipping build verification".to_string(),
        );
        return report;
    }

    report.entry_point_valid = ecosystem
        .entry_points()
        .iter()
        .any(|ep| project.join(ep).exists());
    if !report.entry_point_valid {
        report.errors.push(format!(
            "no {ecosystem} entry point found (expected one of: {})",
            ecosystem.entry_points().join(", ")
        ));
    }

    match install_dependencies(project, ecosystem).await {
        Ok(log) => {
            report.dependencies_ok = true;
            report.build_log.push_str(&log);
        }
        Err(e) => {
            report.errors.push(format!("dependency installation failed: {e}"));
        }
    }

    match validate_syntax(project, ecosystem).await {
        Ok(log) => {
            report.syntax_valid = true;
            report.build_log.push_str(&log);
        }
        Err(e) => {
            report.errors.push(format!("syntax validation failed: {e}"));
        }
    }

    report
}

/// Root or `backend/` subdirectory, whichever holds `marker`.
fn work_dir(project: &Path, marker: &str) -> Option<PathBuf> {
    if project.join(marker).exists() {
        Some(project.to_path_buf())
    } else if project.join("backend").join(marker).exists() {
        Some(project.join("backend"))
    } else {
        None
    }
}

async fn run_command(
    program: &str,
    args: &[&str],
    dir: &Path,
    timeout: Duration,
) -> anyhow::Result<String> {
    debug!(program, ?args, dir = %dir.display(), "running build command");
    let child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| anyhow::anyhow!("command timed out after {}s", timeout.as_secs()))??;

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    if !output.status.success() {
        anyhow::bail!("{program} exited with {}: {combined}", output.status);
    }
    Ok(combined)
}

async fn install_dependencies(project: &Path, ecosystem: Ecosystem) -> anyhow::Result<String> {
    match ecosystem {
        Ecosystem::Node => {
            let dir = work_dir(project, "package.json")
                .ok_or_else(|| anyhow::anyhow!("no package.json found"))?;
            run_command("npm", &["install"], &dir, INSTALL_TIMEOUT).await
        }
        Ecosystem::Python => match work_dir(project, "requirements.txt") {
            Some(dir) => {
                run_command(
                    "pip",
                    &["install", "-r", "requirements.txt"],
                    &dir,
                    INSTALL_TIMEOUT,
                )
                .await
            }
            // Plain scripts without requirements.txt are fine.
            None => Ok("no requirements.txt found - assuming no dependencies\n".to_string()),
        },
        Ecosystem::Go => {
            let dir = work_dir(project, "go.mod")
                .ok_or_else(|| anyhow::anyhow!("no go.mod found"))?;
            run_command("go", &["mod", "download"], &dir, INSTALL_TIMEOUT).await
        }
        Ecosystem::Static => Ok("static site - no dependencies to install\n".to_string()),
        Ecosystem::Unknown => anyhow::bail!("unknown ecosystem"),
    }
}

fn find_files(root: &Path, ext: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            !e.file_type().is_dir()
                || !SKIP_DIRS.contains(&e.file_name().to_string_lossy().as_ref())
        })
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && e.path().extension().is_some_and(|x| x == ext)
        })
        .map(|e| e.into_path())
        .collect()
}

async fn check_each_file(
    files: &[PathBuf],
    program: &str,
    args: &[&str],
) -> anyhow::Result<String> {
    let mut log = String::new();
    for file in files {
        let file_str = file.to_string_lossy();
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push(file_str.as_ref());
        let dir = file.parent().unwrap_or(Path::new("."));
        if let Err(e) = run_command(program, &full_args, dir, SYNTAX_TIMEOUT).await {
            anyhow::bail!("syntax error in {}: {e}", file.display());
        }
        log.push_str(&format!("{} ok\n", file.display()));
    }
    Ok(log)
}

async fn validate_syntax(project: &Path, ecosystem: Ecosystem) -> anyhow::Result<String> {
    match ecosystem {
        Ecosystem::Node => {
            let files = find_files(project, "js");
            if files.is_empty() {
                anyhow::bail!("no JavaScript files found");
            }
            check_each_file(&files, "node", &["--check"]).await
        }
        Ecosystem::Python => {
            let files = find_files(project, "py");
            if files.is_empty() {
                anyhow::bail!("no Python files found");
            }
            check_each_file(&files, "python", &["-m", "py_compile"]).await
        }
        Ecosystem::Go => {
            let dir = work_dir(project, "go.mod")
                .ok_or_else(|| anyhow::anyhow!("no go.mod found"))?;
            let log = run_command(
                "go",
                &["build", "-o", "/dev/null", "./..."],
                &dir,
                GO_BUILD_TIMEOUT,
            )
            .await?;
            Ok(log + "go code builds successfully\n")
        }
        Ecosystem::Static => {
            let html = std::fs::read_to_string(project.join("index.html"))?;
            let mut missing = Vec::new();
            for tag in ["<html", "<head", "<body"] {
                if !html.contains(tag) {
                    missing.push(format!("missing {tag}> tag"));
                }
            }
            if missing.is_empty() {
                Ok("HTML structure is valid\n".to_string())
            } else {
                anyhow::bail!(missing.join("; "))
            }
        }
        Ecosystem::Unknown => anyhow::bail!("unknown ecosystem"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_static_site_passes_without_tooling() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("index.html"),
            "<html><head><title>t</title></head><body>hi</body></html>",
        )
        .unwrap();
        let report = verify_build(tmp.path(), Ecosystem::Static).await;
        assert!(report.passed(), "errors: {:?}", report.errors);
    }

    #[tokio::test]
    async fn test_static_site_missing_tags_fails_syntax() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("index.html"), "<div>just a fragment</div>").unwrap();
        let report = verify_build(tmp.path(), Ecosystem::Static).await;
        assert!(report.entry_point_valid);
        assert!(!report.syntax_valid);
    }

    #[tokio::test]
    async fn test_missing_entry_point_reported() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        fs::write(tmp.path().join("util.js"), "let x = 1;").unwrap();
        let report = verify_build(tmp.path(), Ecosystem::Node).await;
        assert!(!report.entry_point_valid);
        assert!(report.errors.iter().any(|e| e.contains("entry point")));
    }

    #[tokio::test]
    async fn test_unknown_ecosystem_skips_with_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let report = verify_build(tmp.path(), Ecosystem::Unknown).await;
        assert!(!report.passed());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_find_files_skips_vendored_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("node_modules/pkg")).unwrap();
        fs::write(tmp.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(tmp.path().join("app.js"), "x").unwrap();
        let files = find_files(tmp.path(), "js");
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("app.js"));
    }

    #[test]
    fn test_work_dir_prefers_root_over_backend() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("backend")).unwrap();
        fs::write(tmp.path().join("go.mod"), "module a").unwrap();
        fs::write(tmp.path().join("backend/go.mod"), "module b").unwrap();
        assert_eq!(work_dir(tmp.path(), "go.mod").unwrap(), tmp.path());
    }
}
