//! Remote delegated-coder backend client.
//!
//! Deep tasks post `{task, input, metadata}` to the configured endpoint and
//! receive `{output, error}` back. An in-body error field is treated as a
//! failure even on HTTP 200. The remote side runs its own agent loop, so
//! conversation context is not carried between calls.

use super::{GenerationBackend, GenerationContext};
use crate::scoring::ReasoningDepth;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub struct RemoteClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RemoteRequest<'a> {
    task: &'a str,
    input: &'a str,
    metadata: serde_json::Value,
}

#[derive(Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    output: String,
    #[serde(default)]
    error: String,
}

impl RemoteClient {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build remote backend HTTP client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl GenerationBackend for RemoteClient {
    fn name(&self) -> &str {
        "remote"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        depth: ReasoningDepth,
    ) -> Result<String> {
        let req = RemoteRequest {
            task: model,
            input: prompt,
            metadata: json!({ "reasoning_depth": depth.as_str() }),
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&req)
            .send()
            .await
            .context("remote backend request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("remote backend returned status {status}: {body}");
        }
        let body: RemoteResponse = resp
            .json()
            .await
            .context("failed to decode remote backend response")?;
        if !body.error.is_empty() {
            bail!("remote backend error: {}", body.error);
        }
        Ok(body.output)
    }

    async fn generate_with_context(
        &self,
        model: &str,
        prompt: &str,
        _context: GenerationContext,
        depth: ReasoningDepth,
    ) -> Result<(String, GenerationContext)> {
        let output = self.generate(model, prompt, depth).await?;
        Ok((output, GenerationContext::new()))
    }

    async fn ping(&self) -> Result<()> {
        let resp = self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
            .context("remote backend not accessible")?;
        if !resp.status().is_success() {
            bail!("remote backend returned status {}", resp.status());
        }
        Ok(())
    }
}
