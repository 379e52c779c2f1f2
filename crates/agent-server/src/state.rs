//! Application State

use std::sync::Arc;

use agent_core::{Agent, LlmProvider};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Research agent; stateless between requests
    pub agent: Arc<Agent>,

    /// LLM provider, for health and model listings
    pub provider: Arc<dyn LlmProvider>,
}

impl AppState {
    pub fn new(agent: Agent, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            agent: Arc::new(agent),
            provider,
        }
    }
}
