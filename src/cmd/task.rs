//! One-off task execution, history, verification, and liveness commands.

use crate::Cli;
use anyhow::Result;
use console::style;
use foundry::verify;
use std::path::Path;

pub async fn cmd_task(cli: &Cli, task_type: &str, input: &str) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let supervisor = orchestrator.supervisor();

    println!();
    println!("Executing {} task...", style(task_type).bold());
    let result = supervisor.execute(task_type, input, "adhoc").await?;

    println!();
    println!(
        "Complexity {} ({:?} route, {} depth), {} attempt(s), {:.1}s total",
        result.complexity.score,
        result.complexity.route,
        result.complexity.depth.as_str(),
        result.task.attempts,
        result.total_duration_secs
    );
    if let Some(dir) = &result.task.project_dir {
        println!("Project written to {}", style(dir.display()).bold());
    }
    println!();
    println!("{}", result.task.output);
    println!();

    for advisor in &result.advisor_outputs {
        println!("--- {} ---", style(&advisor.agent).bold());
        println!("{}", advisor.output);
        println!();
    }
    Ok(())
}

pub fn cmd_history(cli: &Cli, task_type: Option<&str>, limit: usize) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let history = orchestrator
        .supervisor()
        .manager()
        .recent_history(task_type, limit);

    if history.is_empty() {
        println!();
        println!("No task executions recorded in this session.");
        println!();
        return Ok(());
    }

    println!();
    println!(
        "{:<38} {:<16} {:<8} {:<8} Created",
        "Task", "Type", "Score", "Route"
    );
    for task in &history {
        println!(
            "{:<38} {:<16} {:<8} {:<8} {}",
            task.task_id,
            task.task_type,
            task.complexity_score,
            task.execution_route,
            task.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();
    Ok(())
}

pub async fn cmd_verify(path: &Path) -> Result<()> {
    println!();
    println!("Verifying {}...", style(path.display()).bold());
    let outcome = verify::run_pipeline(path).await;

    println!();
    println!("Ecosystem: {}", outcome.ecosystem);
    println!(
        "Build:     syntax {}  deps {}  entry point {}",
        pass_fail(outcome.build.syntax_valid),
        pass_fail(outcome.build.dependencies_ok),
        pass_fail(outcome.build.entry_point_valid)
    );
    for error in &outcome.build.errors {
        println!("  {}", style(error).red());
    }
    if let Some(runtime) = &outcome.runtime {
        println!(
            "Runtime:   starts {}  health check {}",
            pass_fail(runtime.application_starts),
            pass_fail(runtime.health_check_passed)
        );
    }
    if let Some(tests) = &outcome.tests {
        if tests.tests_executed {
            println!(
                "Tests:     {}/{} passed ({} skipped, framework: {})",
                tests.passed, tests.total, tests.skipped, tests.framework
            );
        } else {
            println!("Tests:     not executed");
        }
    }
    for warning in &outcome.warnings {
        println!("  {}", style(warning).yellow());
    }
    println!();
    println!("Verdict: {}", style(format!("{:?}", outcome.verdict)).bold());
    println!();
    Ok(())
}

pub async fn cmd_ping(cli: &Cli) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    match orchestrator.supervisor().ping().await {
        Ok(()) => {
            println!("{}", style("Backend reachable.").green());
            Ok(())
        }
        Err(e) => {
            println!("{}: {e}", style("Backend unreachable").red());
            Err(e)
        }
    }
}

fn pass_fail(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("pass").green()
    } else {
        style("fail").red()
    }
}
