use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GhAssessError {
    #[error("GitHub fetch failed: {status}")]
    Upstream { status: StatusCode },

    #[error("Unexpected response shape from {endpoint}: {source}")]
    Schema {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GhAssessError {
    /// Status code reported to callers of the callable endpoint.
    pub fn callable_status(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            _ => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, GhAssessError>;
