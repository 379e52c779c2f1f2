//! Conversation Messages
//!
//! Standard message format used across the agent system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A tool invocation requested by the assistant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Call ID, echoed back on the tool message that answers it
    pub id: String,

    /// Registered tool name
    pub name: String,

    /// Input passed to the tool
    pub input: String,
}

impl ToolRequest {
    /// Create a request with a fresh call ID
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            input: input.into(),
        }
    }

    /// Override the call ID (providers that issue their own IDs)
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Build a request from a function-call arguments payload.
    ///
    /// Tools take a single string. `{"input": "..."}` is the declared shape;
    /// a bare string or a single-field object is accepted as well, anything
    /// else is passed through as its JSON text.
    pub fn from_arguments(name: impl Into<String>, arguments: &serde_json::Value) -> Self {
        let input = match arguments {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(map) => match map.get("input") {
                Some(serde_json::Value::String(s)) => s.clone(),
                _ if map.len() == 1 => match map.values().next() {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                },
                _ => arguments.to_string(),
            },
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Self::new(name, input)
    }

    /// Arguments payload in the declared `{"input": ...}` shape
    pub fn arguments(&self) -> serde_json::Value {
        serde_json::json!({ "input": self.input })
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Tool name (tool messages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Pending tool requests (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requests: Vec<ToolRequest>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Optional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// Additional message metadata
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Tool call ID (for tool messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Model that generated this (for assistant messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Whether the tool call failed (for tool messages)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_requests: Vec::new(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool requests
    pub fn assistant_with_tools(content: impl Into<String>, requests: Vec<ToolRequest>) -> Self {
        let mut msg = Self::assistant(content);
        msg.tool_requests = requests;
        msg
    }

    /// Create a tool result message answering `request`
    pub fn tool(content: impl Into<String>, request: &ToolRequest) -> Self {
        Self::tool_answer(content, request.name.clone(), request.id.clone())
    }

    /// Create a tool result message from the tool name and call ID
    pub fn tool_answer(content: impl Into<String>, name: impl Into<String>, call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.name = Some(name.into());
        msg.metadata = Some(MessageMetadata {
            tool_call_id: Some(call_id.into()),
            ..Default::default()
        });
        msg
    }

    /// Record the model that produced this message
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.metadata.get_or_insert_with(MessageMetadata::default).model = Some(model.into());
        self
    }

    /// Mark a tool message as a failed call
    #[must_use]
    pub fn failed(mut self) -> Self {
        self.metadata.get_or_insert_with(MessageMetadata::default).failed = true;
        self
    }

    /// Whether the assistant asked for any tools
    pub fn has_tool_requests(&self) -> bool {
        !self.tool_requests.is_empty()
    }

    /// Tool call ID this message answers
    pub fn tool_call_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.tool_call_id.as_deref()
    }

    /// Whether this is a tool message for a failed call
    pub fn is_failure(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.failed)
    }
}

/// Conversation history for one run.
///
/// Append-only: messages are pushed and read, never edited or removed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation from the user's question
    pub fn seeded(user_text: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Message::user(user_text));
        conv
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Iterate over messages in order
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Tool requests that have no tool message answering them yet
    pub fn unresolved_requests(&self) -> Vec<&ToolRequest> {
        self.messages
            .iter()
            .flat_map(|m| m.tool_requests.iter())
            .filter(|req| {
                !self
                    .messages
                    .iter()
                    .any(|m| m.role == Role::Tool && m.tool_call_id() == Some(req.id.as_str()))
            })
            .collect()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
