//! Project creation, listing, status, and deletion.

use crate::Cli;
use anyhow::Result;
use console::style;
use foundry::project::{PhaseStatus, Project, ProjectStatus};
use uuid::Uuid;

fn status_label(status: ProjectStatus) -> console::StyledObject<&'static str> {
    match status {
        ProjectStatus::Active => style("active").green(),
        ProjectStatus::Blocked => style("blocked").red(),
        ProjectStatus::Complete => style("complete").cyan(),
        ProjectStatus::Archived => style("archived").dim(),
    }
}

pub fn cmd_create(cli: &Cli, name: &str, description: &str) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let project = orchestrator.create_project(name, description)?;

    println!();
    println!("Created project {}", style(&project.name).bold());
    println!("  id:    {}", project.id);
    println!("  phase: {}", project.current_phase);
    println!();
    println!("Run 'foundry run {}' to start discovery.", project.id);
    Ok(())
}

pub fn cmd_list(cli: &Cli) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let projects = orchestrator.list_projects()?;

    if projects.is_empty() {
        println!();
        println!("No projects yet. Run 'foundry create <name> <description>' to start one.");
        println!();
        return Ok(());
    }

    println!();
    println!(
        "{:<38} {:<20} {:<18} {:<10}",
        "ID", "Name", "Phase", "Status"
    );
    for project in &projects {
        println!(
            "{:<38} {:<20} {:<18} {}",
            project.id,
            project.name,
            project.current_phase.as_str(),
            status_label(project.status)
        );
    }
    println!();
    Ok(())
}

pub fn cmd_status(cli: &Cli, id: Uuid) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let project = orchestrator.get_project(id)?;
    print_project(&project);
    Ok(())
}

pub fn cmd_delete(cli: &Cli, id: Uuid) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    orchestrator.delete_project(id)?;
    println!("Deleted project {id}");
    Ok(())
}

fn print_project(project: &Project) {
    println!();
    println!("{} ({})", style(&project.name).bold(), project.id);
    println!("  {}", project.description);
    println!(
        "  status: {}   current phase: {}",
        status_label(project.status),
        style(project.current_phase.as_str()).bold()
    );
    if project.schema_flagged {
        println!("  {}", style("warning: record failed schema validation").yellow());
    }

    println!();
    println!("  Phase history:");
    for exec in &project.phases {
        let mark = match exec.status {
            PhaseStatus::Complete => style("done").green(),
            PhaseStatus::InProgress => style("running").yellow(),
            PhaseStatus::Blocked => style("blocked").red(),
            PhaseStatus::Pending => style("pending").dim(),
        };
        let decision = if exec.decision.is_empty() {
            String::new()
        } else {
            format!("  decision: {}", exec.decision)
        };
        let approval = if exec.human_approval { "  [approved]" } else { "" };
        println!(
            "    {:<18} {}{}{}",
            exec.phase.as_str(),
            mark,
            decision,
            approval
        );
        if !exec.notes.is_empty() {
            for line in exec.notes.lines() {
                println!("      {}", style(line).dim());
            }
        }
    }

    if let Some(plan) = &project.plan_document {
        println!();
        let state = if plan.is_approved {
            style("approved").green()
        } else if plan.rejected_at.is_some() {
            style("rejected").red()
        } else {
            style("awaiting approval").yellow()
        };
        println!("  Plan: {state}");
    }

    if let Some(results) = &project.validation_results {
        println!();
        println!("  Verification (as of {}):", results.last_validated.format("%Y-%m-%d %H:%M"));
        println!(
            "    build:   syntax {}  deps {}  entry point {}",
            yes_no(results.syntax_valid),
            yes_no(results.dependencies_ok),
            yes_no(results.entry_point_valid)
        );
        println!(
            "    runtime: starts {}  health check {}",
            yes_no(results.application_starts),
            yes_no(results.health_check_passed)
        );
        if results.tests_executed {
            println!(
                "    tests:   {}/{} passed ({} skipped, framework: {})",
                results.tests_passed,
                results.total_tests,
                results.tests_skipped,
                if results.test_framework.is_empty() {
                    "unknown"
                } else {
                    &results.test_framework
                }
            );
        } else {
            println!("    tests:   not executed");
        }
    }

    if !project.artifact_paths.is_empty() {
        println!();
        println!("  Artifacts:");
        for path in &project.artifact_paths {
            println!("    {path}");
        }
    }
    println!();
}

fn yes_no(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("ok").green()
    } else {
        style("failed").red()
    }
}
