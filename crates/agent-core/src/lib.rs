//! # agent-core
//!
//! Core agent logic: a reason/act loop over a provider-agnostic reasoning
//! capability and a fixed registry of string-in, string-out tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │    Loop     │  │    Tool     │  │   LlmProvider       │  │
//! │  │ Controller  │──│  Registry   │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop stops when the assistant writes `Final Answer:`, when it stops
//! requesting tools, or when the conversation outgrows the message cap.
//! Tool failures are fed back to the model; only capability errors abort.

pub mod answer;
pub mod error;
pub mod message;
pub mod parse;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role, ToolRequest};
pub use provider::LlmProvider;
pub use reasoning::{Agent, AgentBuilder, AgentConfig, LoopState, Run, Termination};
pub use tool::{Tool, ToolRegistry, ToolResult, ToolSchema};
