//! Reasoning-backend clients.
//!
//! `GenerationBackend` is the seam every generation call goes through: the
//! local Ollama-compatible client handles routine tasks and the remote
//! delegated-coder client handles deep ones. Both are plain HTTP clients;
//! retry policy lives in the task manager, not here.

mod local;
mod remote;

pub use local::LocalClient;
pub use remote::RemoteClient;

use crate::scoring::ReasoningDepth;
use async_trait::async_trait;

/// Opaque conversation state returned by context-carrying generations.
pub type GenerationContext = Vec<i64>;

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name for routing records and logs.
    fn name(&self) -> &str;

    /// Single-shot generation.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        depth: ReasoningDepth,
    ) -> anyhow::Result<String>;

    /// Generation carrying prior conversation context; returns the response
    /// and the updated context.
    async fn generate_with_context(
        &self,
        model: &str,
        prompt: &str,
        context: GenerationContext,
        depth: ReasoningDepth,
    ) -> anyhow::Result<(String, GenerationContext)>;

    /// Cheap reachability check.
    async fn ping(&self) -> anyhow::Result<()>;
}
