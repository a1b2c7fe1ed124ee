//! LLM completion collaborator.
//!
//! `complete` never errors past this boundary: any transport, auth, or
//! shape problem is logged and comes back as an empty string, which the
//! orchestrator treats the same as an unparseable response.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::ScoutConfig;
use crate::error::{ScoutError, ScoutResult};

/// Seam for the orchestrator: a text-completion collaborator.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> String;
}

/// OpenAI-compatible chat-completions client.
pub struct HttpLlm {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpLlm {
    pub fn new(config: &ScoutConfig) -> ScoutResult<Self> {
        if config.llm.api_key.is_none() {
            warn!("no LLM API key configured; completions will fail");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.llm_timeout_secs))
            .build()
            .map_err(|e| ScoutError::upstream("building llm client", e))?;

        Ok(Self {
            client,
            endpoint: config.llm.endpoint.clone(),
            model: config.llm.model.clone(),
            api_key: config.llm.api_key.clone(),
        })
    }

    async fn try_complete(&self, system: &str, user: &str) -> ScoutResult<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ScoutError::format("no API key configured"))?;

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ScoutError::upstream("llm completion", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::UpstreamStatus {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScoutError::upstream("read llm response", e))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        debug!(chars = content.len(), "llm completion received");
        Ok(content)
    }
}

#[async_trait]
impl Completion for HttpLlm {
    async fn complete(&self, system: &str, user: &str) -> String {
        match self.try_complete(system, user).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "llm completion failed");
                String::new()
            }
        }
    }
}
