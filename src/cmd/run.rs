//! Phase execution and approval-flow commands.

use crate::Cli;
use anyhow::Result;
use console::style;
use foundry::Phase;
use foundry::project::Project;
use uuid::Uuid;

pub async fn cmd_run(cli: &Cli, id: Uuid) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let before = orchestrator.get_project(id)?;
    let phase = before.current_phase;

    println!();
    println!(
        "Running {} phase for {}...",
        style(phase.as_str()).bold(),
        before.name
    );

    let project = orchestrator.run_phase(id).await?;
    print_phase_result(&project, phase);

    if project.current_phase == Phase::WaitingApproval {
        println!(
            "Plan generated. Review it with 'foundry status {id}' then 'foundry approve {id}' or 'foundry reject {id} <feedback>'."
        );
        println!();
    }
    Ok(())
}

pub fn cmd_approve(cli: &Cli, id: Uuid) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let project = orchestrator.approve(id)?;
    println!(
        "Approved. {} is now in the {} phase.",
        project.name,
        style(project.current_phase.as_str()).bold()
    );
    Ok(())
}

pub async fn cmd_reject(cli: &Cli, id: Uuid, feedback: &str) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let project = orchestrator.reject(id, feedback).await?;
    if project.current_phase == Phase::Planning {
        println!("Plan rejected; {} is back in planning.", project.name);
    } else {
        println!(
            "{} is now {}: {feedback}",
            project.name,
            style("blocked").red()
        );
    }
    Ok(())
}

pub fn cmd_revert(cli: &Cli, id: Uuid, phase: Phase, reason: &str) -> Result<()> {
    let orchestrator = super::build_orchestrator(cli)?;
    let project = orchestrator.revert(id, phase, reason)?;
    println!(
        "Reverted {} to the {} phase.",
        project.name,
        style(project.current_phase.as_str()).bold()
    );
    Ok(())
}

fn print_phase_result(project: &Project, phase: Phase) {
    println!();
    if let Some(exec) = project.phase_execution(phase) {
        println!(
            "Phase {} finished with decision {}",
            phase.as_str(),
            style(&exec.decision).bold()
        );
        if let Some(reasoning) = exec.agent_outputs.get("reasoning") {
            println!("  {reasoning}");
        }
        let agents: Vec<&str> = exec
            .agent_outputs
            .keys()
            .filter(|k| *k != "reasoning")
            .map(String::as_str)
            .collect();
        if !agents.is_empty() {
            println!("  agent outputs recorded: {}", agents.join(", "));
        }
    }
    println!();
}
