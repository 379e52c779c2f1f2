//! OpenAI LLM Provider
//!
//! Implementation of `LlmProvider` over the Responses API with native
//! function calling. Works against any OpenAI-compatible endpoint.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role, ToolRequest},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo, TokenUsage},
    tool::ToolSchema,
};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::responses::{
        CreateResponse, CreateResponseArgs, EasyInputContent, EasyInputMessage, FunctionCallOutput,
        FunctionCallOutputItemParam, FunctionTool, FunctionToolCall, InputItem, InputParam, Item,
        OutputItem, OutputMessageContent, Response, ResponseUsage, Role as InputRole, Tool,
        ToolChoiceOptions, ToolChoiceParam,
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;

use crate::http::transport_error;

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API key (sent as a bearer token)
    pub api_key: String,

    /// API base URL, without trailing slash
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
            timeout_secs: 120,
        }
    }

    /// Read `OPENAI_API_KEY` (required) and `OPENAI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AgentError::Config("OPENAI_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = std::env::var("OPENAI_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()) {
            config.timeout_secs = secs;
        }
        Ok(config)
    }
}

/// OpenAI LLM provider
pub struct OpenAiProvider {
    client: async_openai::Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        let openai = OpenAIConfig::new()
            .with_api_key(config.api_key)
            .with_api_base(config.base_url);

        Ok(Self {
            client: async_openai::Client::with_config(openai).with_http_client(http),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env()?)
    }

    /// Build a Responses request: system messages become the instructions,
    /// everything else becomes input items in conversation order.
    fn convert_request(messages: &[Message], tools: &[ToolSchema], options: &GenerationOptions) -> Result<CreateResponse> {
        let instructions = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut builder = CreateResponseArgs::default();
        builder
            .model(options.model.as_str())
            .input(InputParam::Items(Self::convert_messages(messages)))
            .temperature(options.temperature)
            .top_p(options.top_p)
            .max_output_tokens(options.max_tokens);

        if !instructions.is_empty() {
            builder.instructions(instructions);
        }
        if !tools.is_empty() {
            builder
                .tools(Self::convert_tools(tools))
                .tool_choice(ToolChoiceParam::Mode(ToolChoiceOptions::Auto));
        }

        builder
            .build()
            .map_err(|e| AgentError::Other(format!("failed to build request: {e}")))
    }

    /// Convert agent messages to Responses input items
    fn convert_messages(messages: &[Message]) -> Vec<InputItem> {
        let mut items = Vec::new();

        for m in messages {
            match m.role {
                Role::System => {}
                Role::User => items.push(text_item(InputRole::User, &m.content)),
                Role::Assistant => {
                    if !m.content.is_empty() {
                        items.push(text_item(InputRole::Assistant, &m.content));
                    }
                    items.extend(m.tool_requests.iter().map(|req| {
                        InputItem::Item(Item::FunctionCall(FunctionToolCall {
                            arguments: req.arguments().to_string(),
                            call_id: req.id.clone(),
                            name: req.name.clone(),
                            id: None,
                            status: None,
                        }))
                    }));
                }
                Role::Tool => match m.tool_call_id() {
                    Some(call_id) => items.push(InputItem::Item(Item::FunctionCallOutput(
                        FunctionCallOutputItemParam {
                            call_id: call_id.to_string(),
                            output: FunctionCallOutput::Text(m.content.clone()),
                            id: None,
                            status: None,
                        },
                    ))),
                    None => items.push(text_item(InputRole::User, &m.content)),
                },
            }
        }

        items
    }

    fn convert_tools(tools: &[ToolSchema]) -> Vec<Tool> {
        tools
            .iter()
            .map(|t| {
                Tool::Function(FunctionTool {
                    name: t.name.clone(),
                    description: Some(t.description.clone()),
                    parameters: Some(t.parameters_json()),
                    strict: Some(true),
                })
            })
            .collect()
    }

    /// Convert a Responses reply to an agent completion
    fn convert_response(response: Response) -> Result<Completion> {
        let finish_reason = response
            .incomplete_details
            .as_ref()
            .map(|details| match details.reason.as_str() {
                "max_output_tokens" => FinishReason::Length,
                other => FinishReason::parse(other),
            });
        Self::convert_output(response.output, response.usage, &response.model, finish_reason)
    }

    fn convert_output(
        output: Vec<OutputItem>,
        usage: Option<ResponseUsage>,
        model: &str,
        finish_reason: Option<FinishReason>,
    ) -> Result<Completion> {
        let mut text = String::new();
        let mut requests = Vec::new();

        for item in output {
            match item {
                OutputItem::Message(msg) => {
                    for content in msg.content {
                        match content {
                            OutputMessageContent::OutputText(part) => text.push_str(&part.text),
                            OutputMessageContent::Refusal(refusal) => {
                                return Err(AgentError::Capability(format!("model refused: {}", refusal.refusal)));
                            }
                        }
                    }
                }
                OutputItem::FunctionCall(call) => {
                    let arguments = serde_json::from_str(&call.arguments)
                        .unwrap_or(serde_json::Value::String(call.arguments));
                    requests.push(ToolRequest::from_arguments(call.name, &arguments).with_id(call.call_id));
                }
                other => {
                    tracing::warn!(item = ?other, "Dropping unsupported output item");
                }
            }
        }

        let finish_reason = if requests.is_empty() {
            finish_reason.unwrap_or(FinishReason::Stop)
        } else {
            FinishReason::ToolUse
        };

        Ok(Completion {
            message: Message::assistant_with_tools(text, requests).with_model(model),
            model: model.to_string(),
            usage: usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: Some(finish_reason),
        })
    }
}

fn text_item(role: InputRole, content: &str) -> InputItem {
    InputItem::EasyMessage(EasyInputMessage {
        r#type: Default::default(),
        role,
        content: EasyInputContent::Text(content.to_string()),
    })
}

/// Map an async-openai failure to a capability error
fn openai_error(err: OpenAIError) -> AgentError {
    match err {
        OpenAIError::ApiError(api) => {
            let code = api.code.as_deref().unwrap_or_default();
            let kind = api.r#type.as_deref().unwrap_or_default();
            if code == "rate_limit_exceeded" || kind == "insufficient_quota" {
                AgentError::RateLimited(api.message)
            } else if code == "invalid_api_key" || (kind == "invalid_request_error" && api.message.contains("API key")) {
                AgentError::Auth(api.message)
            } else {
                AgentError::Capability(api.message)
            }
        }
        OpenAIError::Reqwest(e) => match e.status() {
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => AgentError::Auth(e.to_string()),
            Some(StatusCode::TOO_MANY_REQUESTS) => AgentError::RateLimited(e.to_string()),
            Some(s) if s.is_server_error() => AgentError::CapabilityUnavailable(e.to_string()),
            _ => transport_error(&e),
        },
        OpenAIError::JSONDeserialize(e, _) => AgentError::Capability(format!("malformed response: {e}")),
        other => AgentError::Capability(other.to_string()),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "OpenAI".into(),
            models,
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.models().list().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("OpenAI health check failed: {}", e);
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
        let request = Self::convert_request(messages, tools, options)?;
        let response = self
            .client
            .responses()
            .create(request)
            .await
            .map_err(openai_error)?;

        Self::convert_response(response)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self.client.models().list().await.map_err(openai_error)?;

        Ok(response
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id.clone(),
                id: m.id,
            })
            .collect())
    }
}
