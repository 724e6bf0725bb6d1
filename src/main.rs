use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

mod cmd;

#[derive(Parser)]
#[command(name = "foundry")]
#[command(version, about = "AI software factory: phased project generation with verification")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "foundry.toml", global = true)]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project
    Create {
        name: String,
        /// What to build, in plain language
        description: String,
    },
    /// List all projects
    List,
    /// Show a project's phase history and verification results
    Status { id: Uuid },
    /// Execute the project's current phase
    Run { id: Uuid },
    /// Approve the current phase and advance
    Approve { id: Uuid },
    /// Reject the current phase with feedback
    Reject { id: Uuid, feedback: String },
    /// Revert the project to an earlier completed phase
    Revert {
        id: Uuid,
        phase: foundry::Phase,
        reason: String,
    },
    /// Delete a project record
    Delete { id: Uuid },
    /// Run a one-off supervised task outside any project
    Task {
        /// Task type: code_generation, planning, or review
        #[arg(long, default_value = "code_generation")]
        task_type: String,
        input: String,
    },
    /// Show recent task executions
    History {
        /// Filter by task type
        #[arg(long)]
        task_type: Option<String>,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Run the verification pipeline against a project directory
    Verify { path: PathBuf },
    /// Check backend reachability
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cmd::init_tracing(cli.verbose);

    match &cli.command {
        Commands::Create { name, description } => cmd::cmd_create(&cli, name, description),
        Commands::List => cmd::cmd_list(&cli),
        Commands::Status { id } => cmd::cmd_status(&cli, *id),
        Commands::Run { id } => cmd::cmd_run(&cli, *id).await,
        Commands::Approve { id } => cmd::cmd_approve(&cli, *id),
        Commands::Reject { id, feedback } => cmd::cmd_reject(&cli, *id, feedback).await,
        Commands::Revert { id, phase, reason } => cmd::cmd_revert(&cli, *id, *phase, reason),
        Commands::Delete { id } => cmd::cmd_delete(&cli, *id),
        Commands::Task { task_type, input } => cmd::cmd_task(&cli, task_type, input).await,
        Commands::History { task_type, limit } => {
            cmd::cmd_history(&cli, task_type.as_deref(), *limit)
        }
        Commands::Verify { path } => cmd::cmd_verify(path).await,
        Commands::Ping => cmd::cmd_ping(&cli).await,
    }
}
