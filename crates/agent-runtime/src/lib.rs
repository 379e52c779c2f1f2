//! # agent-runtime
//!
//! Reasoning capabilities for the research agent.
//!
//! ## Providers
//!
//! - **OpenAI** (default): Responses API through `async-openai`, with native
//!   function calling, usable against any OpenAI-compatible endpoint
//! - **Ollama**: local inference through `ollama-rs`, native or text tool calls
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(any(feature = "openai", feature = "ollama"))]
mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, Conversation, LlmProvider, Message, Result, Role, Tool, ToolRegistry,
};
