//! Error Types for Research Tools

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResearchError>;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("Empty input")]
    EmptyInput,

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("Unexpected response from {service}: {detail}")]
    Malformed { service: &'static str, detail: String },

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ResearchError> for AgentError {
    fn from(err: ResearchError) -> Self {
        Self::ToolExecution(err.to_string())
    }
}
