//! Transport error mapping shared by the providers

use agent_core::AgentError;

/// Map a transport failure to a capability error
pub(crate) fn transport_error(err: &reqwest::Error) -> AgentError {
    if err.is_connect() || err.is_timeout() {
        AgentError::CapabilityUnavailable(err.to_string())
    } else if err.is_decode() {
        AgentError::Capability(format!("malformed response: {err}"))
    } else {
        AgentError::Capability(err.to_string())
    }
}
