//! Ollama-compatible local backend client.

use super::{GenerationBackend, GenerationContext};
use crate::scoring::ReasoningDepth;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct LocalClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a GenerationContext>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    context: Option<GenerationContext>,
}

impl LocalClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build local backend HTTP client")?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Reasoning depth is expressed to the local model as a prompt prefix;
    /// the generate API has no depth parameter of its own.
    fn depth_prefix(depth: ReasoningDepth) -> &'static str {
        match depth {
            ReasoningDepth::Shallow => "",
            ReasoningDepth::Balanced => "Think through the requirements before answering.\n\n",
            ReasoningDepth::Deep => {
                "Reason step by step about structure and edge cases before answering.\n\n"
            }
        }
    }

    async fn call(
        &self,
        model: &str,
        prompt: &str,
        context: Option<&GenerationContext>,
    ) -> Result<GenerateResponse> {
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
            context,
        };
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&req)
            .send()
            .await
            .context("local backend request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("local backend returned status {status}: {body}");
        }
        resp.json::<GenerateResponse>()
            .await
            .context("failed to decode local backend response")
    }

    /// Models known to the backend, per its tags API.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct Tags {
            models: Vec<TagModel>,
        }
        #[derive(Deserialize)]
        struct TagModel {
            name: String,
        }
        let tags: Tags = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .context("failed to list local models")?
            .json()
            .await
            .context("failed to decode model list")?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl GenerationBackend for LocalClient {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        depth: ReasoningDepth,
    ) -> Result<String> {
        let prompt = format!("{}{prompt}", Self::depth_prefix(depth));
        let resp = self.call(model, &prompt, None).await?;
        Ok(resp.response)
    }

    async fn generate_with_context(
        &self,
        model: &str,
        prompt: &str,
        context: GenerationContext,
        depth: ReasoningDepth,
    ) -> Result<(String, GenerationContext)> {
        let prompt = format!("{}{prompt}", Self::depth_prefix(depth));
        let ctx = if context.is_empty() { None } else { Some(&context) };
        let resp = self.call(model, &prompt, ctx).await?;
        Ok((resp.response, resp.context.unwrap_or_default()))
    }

    async fn ping(&self) -> Result<()> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .context("local backend not accessible")?;
        if !resp.status().is_success() {
            bail!("local backend returned status {}", resp.status());
        }
        Ok(())
    }
}
