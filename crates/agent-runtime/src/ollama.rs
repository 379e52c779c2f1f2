//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference.
//! Models with native tool support get the tool list as function
//! declarations; otherwise tools are described in the system prompt and
//! requested through fenced ```` ```tool ```` blocks.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role, ToolRequest},
    parse::{parse_tool_requests, prompt_section},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo, TokenUsage},
    tool::ToolSchema,
};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    error::OllamaError,
    generation::{
        chat::{ChatMessage, ChatMessageResponse, MessageRole, request::ChatMessageRequest},
        tools::{ToolCall, ToolCallFunction, ToolFunctionInfo, ToolInfo, ToolType},
    },
    models::ModelOptions,
};

use crate::http::transport_error;

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Send tools as native function declarations
    pub native_tools: bool,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            timeout_secs: 120,
            native_tools: true,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| "http://localhost".into());
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434);
        let native_tools = std::env::var("OLLAMA_NATIVE_TOOLS")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        Self {
            host,
            port,
            native_tools,
            ..Default::default()
        }
    }

    fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom host/port
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::from_config(OllamaConfig {
            host: host.into(),
            port,
            ..Default::default()
        })
    }

    /// Create from configuration.
    ///
    /// The host must be an `http` or `https` URL.
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        let host = config.host.trim_end_matches('/');
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(AgentError::Config(format!("OLLAMA_HOST must be an http(s) URL, got '{host}'")));
        }
        Ollama::try_new(config.base_url())
            .map_err(|e| AgentError::Config(format!("invalid Ollama address '{}': {e}", config.base_url())))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self {
            client: Ollama::new_with_client(host, config.port, http),
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Create with default localhost settings
    pub fn localhost() -> Result<Self> {
        Self::from_config(OllamaConfig::default())
    }

    /// Convert agent messages to Ollama format
    fn convert_messages(messages: &[Message], tools: &[ToolSchema], native_tools: bool) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                if native_tools {
                    let role = match m.role {
                        Role::System => MessageRole::System,
                        Role::User => MessageRole::User,
                        Role::Assistant => MessageRole::Assistant,
                        Role::Tool => MessageRole::Tool,
                    };
                    let mut message = ChatMessage::new(role, m.content.clone());
                    message.tool_calls = m
                        .tool_requests
                        .iter()
                        .map(|req| ToolCall {
                            function: ToolCallFunction {
                                name: req.name.clone(),
                                arguments: req.arguments(),
                            },
                        })
                        .collect();
                    return message;
                }

                // Text protocol: tools live in the system prompt, results
                // come back as user context.
                match m.role {
                    Role::System if !tools.is_empty() => {
                        ChatMessage::system(format!("{}\n\n{}", m.content, prompt_section(tools)))
                    }
                    Role::System => ChatMessage::system(m.content.clone()),
                    Role::User => ChatMessage::user(m.content.clone()),
                    Role::Assistant => ChatMessage::assistant(m.content.clone()),
                    Role::Tool => {
                        let name = m.name.as_deref().unwrap_or("tool");
                        let verb = if m.is_failure() { "failed" } else { "returned" };
                        ChatMessage::user(format!("[Tool '{name}' {verb}]\n{}", m.content))
                    }
                }
            })
            .collect()
    }

    /// Tool descriptors as Ollama function declarations
    fn convert_tools(tools: &[ToolSchema]) -> Result<Vec<ToolInfo>> {
        tools
            .iter()
            .map(|t| {
                let parameters = serde_json::from_value(t.parameters_json())
                    .map_err(|e| AgentError::Other(format!("invalid parameters for tool '{}': {e}", t.name)))?;
                Ok(ToolInfo {
                    tool_type: ToolType::Function,
                    function: ToolFunctionInfo {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters,
                    },
                })
            })
            .collect()
    }

    /// Convert Ollama response to agent completion
    fn convert_completion(response: ChatMessageResponse, model: &str) -> Completion {
        let mut requests: Vec<ToolRequest> = response
            .message
            .tool_calls
            .into_iter()
            .map(|call| ToolRequest::from_arguments(call.function.name, &call.function.arguments))
            .collect();

        // Text-only models ask for tools inside the reply itself.
        if requests.is_empty() {
            requests = parse_tool_requests(&response.message.content);
        }

        let finish_reason = if !requests.is_empty() {
            FinishReason::ToolUse
        } else if response.done {
            FinishReason::Stop
        } else {
            FinishReason::Length
        };

        let usage = response.final_data.as_ref().map(|d| {
            let prompt_tokens = u32::try_from(d.prompt_eval_count).unwrap_or(u32::MAX);
            let completion_tokens = u32::try_from(d.eval_count).unwrap_or(u32::MAX);
            TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens.saturating_add(completion_tokens),
            }
        });

        Completion {
            message: Message::assistant_with_tools(response.message.content, requests).with_model(model),
            model: model.to_string(),
            usage,
            finish_reason: Some(finish_reason),
        }
    }

    /// Build Ollama generation options
    fn build_options(opts: &GenerationOptions) -> ModelOptions {
        ModelOptions::default()
            .temperature(opts.temperature)
            .top_p(opts.top_p)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX))
    }
}

/// Map an ollama-rs failure to a capability error
fn ollama_error(err: OllamaError) -> AgentError {
    match err {
        OllamaError::ReqwestError(e) => transport_error(&e),
        OllamaError::JsonError(e) => AgentError::Capability(format!("malformed response: {e}")),
        OllamaError::InternalError(e) => AgentError::Capability(e.message),
        other => AgentError::Capability(other.to_string()),
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Ollama".into(),
            models,
            supports_tools: self.config.native_tools,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let native = self.config.native_tools;
        let mut request = ChatMessageRequest::new(
            options.model.clone(),
            Self::convert_messages(messages, tools, native),
        )
        .options(Self::build_options(options));

        if native && !tools.is_empty() {
            request = request.tools(Self::convert_tools(tools)?);
        }

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(ollama_error)?;

        Ok(Self::convert_completion(response, &options.model))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self.client.list_local_models().await.map_err(ollama_error)?;

        Ok(models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(message: serde_json::Value) -> ChatMessageResponse {
        serde_json::from_value(serde_json::json!({
            "model": "llama3.2",
            "created_at": "2024-08-04T08:52:19.385406455-07:00",
            "message": message,
            "done": true,
            "total_duration": 1000,
            "load_duration": 10,
            "prompt_eval_count": 20,
            "prompt_eval_duration": 100,
            "eval_count": 7,
            "eval_duration": 200
        }))
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);
        assert_eq!(config.base_url(), "http://localhost:11434");
        assert!(config.native_tools);
    }

    #[test]
    fn test_invalid_host_is_config_error() {
        let err = OllamaProvider::new("localhost", 11434).err().unwrap();
        assert!(matches!(err, AgentError::Config(_)));
        assert!(OllamaProvider::localhost().is_ok());
    }

    #[test]
    fn test_native_message_conversion() {
        let request = ToolRequest::new("python_repl", "print(1)");
        let messages = vec![
            Message::system("You are helpful."),
            Message::assistant_with_tools("", vec![request.clone()]),
            Message::tool("1", &request),
        ];

        let converted = OllamaProvider::convert_messages(&messages, &[], true);
        assert_eq!(converted[0].role, MessageRole::System);
        assert!(converted[0].tool_calls.is_empty());
        assert_eq!(converted[1].tool_calls[0].function.name, "python_repl");
        assert_eq!(converted[1].tool_calls[0].function.arguments["input"], "print(1)");
        assert_eq!(converted[2].role, MessageRole::Tool);
        assert_eq!(converted[2].content, "1");
    }

    #[test]
    fn test_text_protocol_conversion() {
        let request = ToolRequest::new("wikipedia_search", "Rust");
        let tools = vec![ToolSchema::new("wikipedia_search", "Search Wikipedia")];
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Tell me about Rust"),
            Message::tool("Page: Rust", &request).failed(),
        ];

        let converted = OllamaProvider::convert_messages(&messages, &tools, false);
        assert_eq!(converted.len(), 3);
        assert!(converted[0].content.contains("### wikipedia_search"));
        assert_eq!(converted[2].role, MessageRole::User);
        assert!(converted[2].content.starts_with("[Tool 'wikipedia_search' failed]"));
    }

    #[test]
    fn test_tools_conversion() {
        let tools = vec![ToolSchema::new("serper", "Web search").with_input_description("Search query")];
        let converted = OllamaProvider::convert_tools(&tools).unwrap();

        assert_eq!(converted[0].function.name, "serper");
        let json = serde_json::to_value(&converted[0]).unwrap();
        assert_eq!(json["function"]["parameters"]["required"][0], "input");
        assert_eq!(json["function"]["parameters"]["properties"]["input"]["description"], "Search query");
    }

    #[test]
    fn test_completion_native_tool_calls() {
        let response = response(serde_json::json!({
            "role": "assistant",
            "content": "",
            "tool_calls": [{"function": {"name": "serper", "arguments": {"input": "rust news"}}}]
        }));

        let completion = OllamaProvider::convert_completion(response, "llama3.2");
        assert_eq!(completion.message.tool_requests.len(), 1);
        assert_eq!(completion.message.tool_requests[0].input, "rust news");
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolUse));
        assert_eq!(completion.usage.unwrap().total_tokens, 27);
    }

    #[test]
    fn test_completion_text_tool_block() {
        let response = response(serde_json::json!({
            "role": "assistant",
            "content": "Thought: search.\n```tool\n{\"tool\": \"arxiv_search\", \"arguments\": {\"input\": \"1003.3568\"}}\n```"
        }));

        let completion = OllamaProvider::convert_completion(response, "llama3.2");
        assert_eq!(completion.message.tool_requests[0].name, "arxiv_search");
        assert_eq!(completion.message.tool_requests[0].input, "1003.3568");
    }

    #[test]
    fn test_completion_final_answer() {
        let response = response(serde_json::json!({"role": "assistant", "content": "Final Answer: 4"}));

        let completion = OllamaProvider::convert_completion(response, "llama3.2");
        assert!(completion.message.tool_requests.is_empty());
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert!(completion.message.has_final_answer());
    }

    #[test]
    fn test_error_mapping() {
        let err = ollama_error(OllamaError::Other("model 'nope' not found".into()));
        assert!(err.is_capability_error());
        assert!(err.to_string().contains("model 'nope' not found"));
    }
}
