use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide configuration, constructed once at startup and passed by
/// reference into every component. Nothing below this struct reads the
/// environment directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    pub http: HttpConfig,
    pub llm: LlmConfig,
    pub chart: ChartConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Client identifier sent with every outbound fetch
    pub user_agent: String,

    /// Timeout for one page fetch (seconds)
    pub fetch_timeout_secs: u64,

    /// Timeout for one LLM completion call (seconds)
    pub llm_timeout_secs: u64,

    /// Safety cap on fetched response bodies (bytes)
    pub max_response_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions endpoint
    pub endpoint: String,

    /// Model identifier passed through to the endpoint
    pub model: String,

    /// Bearer token; environment-only, never written to config files
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Hard cap on encoded chart bytes (before base64 expansion)
    pub max_image_bytes: usize,

    /// Initial raster size
    pub base_width: u32,
    pub base_height: u32,

    /// Per-step shrink applied while over budget
    pub shrink_factor: f64,

    /// Floor on the longest side; below this the encoder switches formats
    pub min_dimension: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Wall-clock budget for one whole request (seconds)
    pub hard_timeout_secs: u64,

    /// Rows of the working table included in the prompt
    pub table_head_rows: usize,

    /// Cells sampled per column when classifying it as numeric
    pub classify_sample_rows: usize,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                user_agent: "tablescout/0.1 (+https://example.com)".to_string(),
                fetch_timeout_secs: 30,
                llm_timeout_secs: 30,
                max_response_bytes: 800_000,
            },
            llm: LlmConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-4.1-nano".to_string(),
                api_key: None,
            },
            chart: ChartConfig {
                max_image_bytes: 100_000,
                base_width: 600,
                base_height: 480,
                shrink_factor: 0.9,
                min_dimension: 400,
            },
            limits: LimitsConfig {
                hard_timeout_secs: 170,
                table_head_rows: 20,
                classify_sample_rows: 10,
            },
        }
    }
}

impl ScoutConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read config file: {}", e))?;

        let config: ScoutConfig = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;

        Ok(config)
    }

    /// Defaults overridden by `TABLESCOUT_*` environment variables.
    /// The API key is environment-only (`OPENAI_API_KEY`).
    pub fn load_from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("TABLESCOUT_MAX_IMAGE_BYTES") {
            if let Ok(value) = v.parse::<usize>() {
                config.chart.max_image_bytes = value;
            }
        }

        if let Ok(v) = std::env::var("TABLESCOUT_HARD_TIMEOUT_SECS") {
            if let Ok(value) = v.parse::<u64>() {
                config.limits.hard_timeout_secs = value;
            }
        }

        if let Ok(v) = std::env::var("TABLESCOUT_USER_AGENT") {
            config.http.user_agent = v;
        }

        if let Ok(v) = std::env::var("TABLESCOUT_LLM_ENDPOINT") {
            config.llm.endpoint = v;
        }

        if let Ok(v) = std::env::var("TABLESCOUT_LLM_MODEL") {
            config.llm.model = v;
        }

        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            if !v.is_empty() {
                config.llm.api_key = Some(v);
            }
        }

        config
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| anyhow!("Failed to write config file: {}", e))?;

        Ok(())
    }
}
