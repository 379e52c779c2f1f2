//! Tool System
//!
//! Tools are external capabilities with a string-in, string-out interface.
//! They are registered once at startup and dispatched by name from the
//! acting step of the reasoning loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Message, ToolRequest};

/// Tool descriptor shown to the reasoning capability
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// What the single string input should contain
    #[serde(default = "default_input_description")]
    pub input_description: String,
}

fn default_input_description() -> String {
    "Input for the tool".into()
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_description: default_input_description(),
        }
    }

    #[must_use]
    pub fn with_input_description(mut self, description: impl Into<String>) -> Self {
        self.input_description = description.into();
        self
    }

    /// JSON Schema for function-calling APIs: one required string `input`
    pub fn parameters_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": self.input_description,
                }
            },
            "required": ["input"],
            "additionalProperties": false,
        })
    }
}

/// Result from resolving one tool request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID of the request this answers
    pub id: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (tool text or failure description)
    pub output: String,
}

impl ToolResult {
    pub fn success(request: &ToolRequest, output: impl Into<String>) -> Self {
        Self {
            name: request.name.clone(),
            id: request.id.clone(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(request: &ToolRequest, error: impl Into<String>) -> Self {
        Self {
            name: request.name.clone(),
            id: request.id.clone(),
            success: false,
            output: error.into(),
        }
    }

    /// Tool message for the conversation, answering the request this
    /// result was resolved from
    pub fn into_message(self) -> Message {
        let msg = Message::tool_answer(self.output, self.name, self.id);
        if self.success { msg } else { msg.failed() }
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name and description shown to the reasoning capability
    fn schema(&self) -> ToolSchema;

    /// Run the tool on a single string input
    async fn invoke(&self, input: &str) -> Result<String>;
}

/// Registry for available tools.
///
/// Names are unique; descriptors are listed in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.schema().name;
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    /// Invoke a tool by name
    pub async fn invoke(&self, name: &str, input: &str) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        tool.invoke(input).await
    }

    /// Resolve one request. Never fails: errors become a failed result.
    pub async fn resolve(&self, request: &ToolRequest) -> ToolResult {
        match self.invoke(&request.name, &request.input).await {
            Ok(output) => ToolResult::success(request, output),
            Err(AgentError::ToolNotFound(name)) => ToolResult::failure(
                request,
                format!(
                    "Error: tool not found: {name}. Try one of [{}].",
                    self.names().join(", ")
                ),
            ),
            Err(AgentError::ToolExecution(detail)) => ToolResult::failure(
                request,
                format!("Error: {detail}\n Please fix your mistakes."),
            ),
            Err(e) => ToolResult::failure(
                request,
                format!("Error: {e}\n Please fix your mistakes."),
            ),
        }
    }

    /// All tool schemas, in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Tool names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.schema().name).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Returns its input reversed
    pub struct ReverseTool;

    #[async_trait]
    impl Tool for ReverseTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("reverse", "Reverse the input text")
        }

        async fn invoke(&self, input: &str) -> Result<String> {
            Ok(input.chars().rev().collect())
        }
    }

    /// Always fails
    pub struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("broken", "Always fails")
        }

        async fn invoke(&self, _input: &str) -> Result<String> {
            Err(AgentError::ToolExecution("service returned 503".into()))
        }
    }

    #[test]
    fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(ReverseTool).unwrap();
        registry.register(BrokenTool).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("reverse").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.names(), vec!["reverse", "broken"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(ReverseTool).unwrap();

        let err = registry.register(ReverseTool).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(name) if name == "reverse"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parameters_json() {
        let schema = ToolSchema::new("serper", "Web search").with_input_description("Search query");
        let params = schema.parameters_json();
        assert_eq!(params["required"][0], "input");
        assert_eq!(params["properties"]["input"]["description"], "Search query");
        assert_eq!(params["additionalProperties"], false);
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let mut registry = ToolRegistry::new();
        registry.register(ReverseTool).unwrap();

        let request = ToolRequest::new("reverse", "abc");
        let result = registry.resolve(&request).await;
        assert!(result.success);
        assert_eq!(result.output, "cba");
        assert_eq!(result.id, request.id);

        let msg = result.into_message();
        assert!(!msg.is_failure());
        assert_eq!(msg.content, "cba");
        assert_eq!(msg.tool_call_id(), Some(request.id.as_str()));
    }

    #[tokio::test]
    async fn test_resolve_unknown_tool_is_soft() {
        let mut registry = ToolRegistry::new();
        registry.register(ReverseTool).unwrap();

        let request = ToolRequest::new("foo_search", "anything");
        let result = registry.resolve(&request).await;
        assert!(!result.success);
        assert!(result.output.contains("tool not found"));
        assert!(result.output.contains("reverse"));

        let msg = result.into_message();
        assert!(msg.is_failure());
        assert_eq!(msg.tool_call_id(), Some(request.id.as_str()));
        assert_eq!(msg.name.as_deref(), Some("foo_search"));
    }

    #[tokio::test]
    async fn test_resolve_tool_failure_is_soft() {
        let mut registry = ToolRegistry::new();
        registry.register(BrokenTool).unwrap();

        let result = registry.resolve(&ToolRequest::new("broken", "x")).await;
        assert!(!result.success);
        assert!(result.output.contains("service returned 503"));
    }
}
