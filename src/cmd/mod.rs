//! CLI command implementations.
//!
//! | Module    | Commands handled                          |
//! |-----------|-------------------------------------------|
//! | `project` | `Create`, `List`, `Status`, `Delete`      |
//! | `run`     | `Run`, `Approve`, `Reject`, `Revert`      |
//! | `task`    | `Task`, `History`, `Verify`, `Ping`       |

pub mod project;
pub mod run;
pub mod task;

pub use project::{cmd_create, cmd_delete, cmd_list, cmd_status};
pub use run::{cmd_approve, cmd_reject, cmd_revert, cmd_run};
pub use task::{cmd_history, cmd_ping, cmd_task, cmd_verify};

use crate::Cli;
use anyhow::Result;
use foundry::config::Config;
use foundry::llm::{GenerationBackend, LocalClient, RemoteClient};
use foundry::notify::NoopSink;
use foundry::orchestrator::ProjectOrchestrator;
use std::sync::Arc;

pub fn init_tracing(verbose: bool) {
    let default = if verbose { "foundry=debug" } else { "foundry=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Build the orchestrator from the configured backends. The remote backend
/// is optional; without one, deep tasks degrade to the local backend.
pub(crate) fn build_orchestrator(cli: &Cli) -> Result<ProjectOrchestrator> {
    let config = Config::load(&cli.config)?;
    let timeout = config.backends.request_timeout_secs;

    let local: Arc<dyn GenerationBackend> =
        Arc::new(LocalClient::new(config.backends.local_endpoint.clone(), timeout)?);
    let remote: Option<Arc<dyn GenerationBackend>> =
        if config.backends.remote_endpoint.is_empty() {
            None
        } else {
            Some(Arc::new(RemoteClient::new(
                config.backends.remote_endpoint.clone(),
                timeout,
            )?))
        };

    Ok(ProjectOrchestrator::new(config, local, remote, Arc::new(NoopSink))?)
}
