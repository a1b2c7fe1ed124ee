//! Web-fetch collaborator: pull one page of HTML for table extraction.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ScoutConfig;
use crate::error::{ScoutError, ScoutResult};

/// Seam for the orchestrator: anything that can turn a URL into HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ScoutResult<String>;
}

/// HTTP implementation. Transport failures and non-2xx statuses surface as
/// distinct error variants so callers can tell "unavailable" from "garbage".
pub struct HttpFetcher {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &ScoutConfig) -> ScoutResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .timeout(Duration::from_secs(config.http.fetch_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ScoutError::upstream("building http client", e))?;

        Ok(Self { client, max_response_bytes: config.http.max_response_bytes })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> ScoutResult<String> {
        info!(url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScoutError::upstream(format!("fetch {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::UpstreamStatus { url: url.to_string(), status: status.as_u16() });
        }

        let mut body = response
            .text()
            .await
            .map_err(|e| ScoutError::upstream(format!("read body of {url}"), e))?;

        if body.len() > self.max_response_bytes {
            warn!(url, bytes = body.len(), cap = self.max_response_bytes, "truncating oversized response");
            let mut cut = self.max_response_bytes;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        Ok(body)
    }
}
