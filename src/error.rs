use thiserror::Error;

/// Main error type for the tablescout pipeline.
///
/// The taxonomy matters more than the messages: input errors are fatal to a
/// request, upstream-transport errors are fatal to one sub-operation, and
/// upstream-format errors are recovered locally by the orchestrator.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("invalid input: {message}")]
    Input { message: String },

    #[error("upstream unavailable: {what}")]
    UpstreamUnavailable {
        what: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("upstream returned HTTP {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("upstream response not parseable: {message}")]
    UpstreamFormat { message: String },

    #[error("insufficient data: need at least {needed} paired points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("chart rendering failed: {message}")]
    Render { message: String },

    #[error("request exceeded the {seconds}s wall-clock budget")]
    Timeout { seconds: u64 },

    #[error("general error: {0}")]
    General(#[from] anyhow::Error),
}

impl ScoutError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input { message: message.into() }
    }

    pub fn upstream(
        what: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::UpstreamUnavailable { what: what.into(), source: Box::new(source) }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::UpstreamFormat { message: message.into() }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render { message: message.into() }
    }

    /// Whether the orchestrator may continue the request after this error.
    ///
    /// Format errors are absorbed into placeholder answers; insufficient
    /// chart data degrades a single answer. Everything else fails the
    /// request (input, timeout) or the sub-operation (transport).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScoutError::UpstreamFormat { .. } | ScoutError::InsufficientData { .. }
        )
    }
}

/// Result type alias for convenience
pub type ScoutResult<T> = Result<T, ScoutError>;
