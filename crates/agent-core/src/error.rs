//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Reasoning capability returned an error or malformed output
    #[error("Capability error: {0}")]
    Capability(String),

    /// Reasoning capability unreachable
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Tool not found in registry
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// A tool with the same name is already registered
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited by the capability
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication against the capability failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Whether this error came from the reasoning capability.
    ///
    /// These are the only errors that abort a run.
    pub const fn is_capability_error(&self) -> bool {
        matches!(
            self,
            Self::Capability(_)
                | Self::CapabilityUnavailable(_)
                | Self::RateLimited(_)
                | Self::Auth(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Capability(msg) => format!("The language model returned an error: {msg}"),
            Self::CapabilityUnavailable(_) => {
                "The language model is currently unavailable. Please try again.".into()
            }
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::RateLimited(_) => "Too many requests to the language model. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication with the language model failed. Check the API key.".into(),
            Self::Config(msg) => format!("The agent is misconfigured: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_classification() {
        assert!(AgentError::Capability("bad json".into()).is_capability_error());
        assert!(AgentError::CapabilityUnavailable("refused".into()).is_capability_error());
        assert!(!AgentError::ToolNotFound("foo_search".into()).is_capability_error());
        assert!(!AgentError::ToolExecution("boom".into()).is_capability_error());
    }

    #[test]
    fn test_tool_not_found_display() {
        let err = AgentError::ToolNotFound("foo_search".into());
        assert_eq!(err.to_string(), "tool not found: foo_search");
    }
}
