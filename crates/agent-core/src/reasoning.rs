//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern as an explicit state machine.
//!
//! ```text
//!   REASONING ──tool requests──▶ ACTING
//!       ▲                          │
//!       └──────────────────────────┘
//!       │
//!       └──marker / cap / idle──▶ DONE
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolRegistry};

/// Conversation length above which the loop stops instead of idling on
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// Why a run stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The assistant wrote the final-answer marker
    FinalAnswer,
    /// The conversation grew past the message cap
    MessageCap,
    /// No marker and no tool requests: nothing left to do
    NoPendingWork,
}

/// Loop controller state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Reasoning,
    Acting,
    Done(Termination),
}

/// Decide what follows a reasoning step.
///
/// `latest` is the assistant message just appended and `conversation_len`
/// counts it. Rules apply in order: marker, tool requests, cap, idle.
pub fn next_state(latest: &Message, conversation_len: usize, max_messages: usize) -> LoopState {
    if latest.has_final_answer() {
        LoopState::Done(Termination::FinalAnswer)
    } else if latest.has_tool_requests() {
        LoopState::Acting
    } else if conversation_len > max_messages {
        LoopState::Done(Termination::MessageCap)
    } else {
        LoopState::Done(Termination::NoPendingWork)
    }
}

/// A finished run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Run {
    pub conversation: Conversation,
    pub termination: Termination,
}

impl Run {
    /// Extracted final answer, empty if the conversation is empty
    pub fn answer(&self) -> String {
        self.conversation.final_answer().unwrap_or_default()
    }
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System instruction prepended to every reasoning step
    pub system_prompt: String,

    /// Message cap for the loop controller
    pub max_messages: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_messages: DEFAULT_MAX_MESSAGES,
            generation: GenerationOptions::default(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r"You are a helpful AI assistant.

Use the available tools when you need information you do not have.
After receiving tool results, synthesize them into a helpful response.

When you have enough information, respond in this format:
Final Answer: <your answer>";

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Run the loop on a user question and return the full conversation
    pub async fn run(&self, user_text: &str) -> Result<Conversation> {
        self.run_with(user_text, &mut |_: &Message| {})
            .await
            .map(|run| run.conversation)
    }

    /// Run and return only the extracted final answer
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.run_with(question, &mut |_: &Message| {})
            .await
            .map(|run| run.answer())
    }

    /// Run the loop, calling `observer` for every message appended.
    ///
    /// Only capability errors escape; tool failures become tool messages.
    pub async fn run_with(
        &self,
        user_text: &str,
        observer: &mut (dyn FnMut(&Message) + Send),
    ) -> Result<Run> {
        let mut conversation = Conversation::new();
        append(&mut conversation, Message::user(user_text), observer);

        tracing::info!(
            model = %self.config.generation.model,
            tools = self.tools.len(),
            "Starting agent run"
        );

        let mut state = LoopState::Reasoning;
        loop {
            state = match state {
                LoopState::Reasoning => {
                    let message = self.reason(&conversation).await?;
                    append(&mut conversation, message, observer);
                    let latest = conversation
                        .last()
                        .ok_or_else(|| AgentError::Other("conversation is empty".into()))?;
                    next_state(latest, conversation.len(), self.config.max_messages)
                }
                LoopState::Acting => {
                    self.act(&mut conversation, observer).await;
                    LoopState::Reasoning
                }
                LoopState::Done(termination) => {
                    tracing::info!(
                        ?termination,
                        messages = conversation.len(),
                        "Agent run finished"
                    );
                    return Ok(Run {
                        conversation,
                        termination,
                    });
                }
            };
        }
    }

    /// Reasoning step: one assistant message from the capability
    async fn reason(&self, conversation: &Conversation) -> Result<Message> {
        debug_assert!(
            conversation.unresolved_requests().is_empty(),
            "every tool request is answered before the next reasoning step"
        );

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(&self.config.system_prompt));
        messages.extend(conversation.iter().cloned());

        let completion = self
            .provider
            .complete(&messages, &self.tools.schemas(), &self.config.generation)
            .await
            .map_err(|e| {
                if e.is_capability_error() {
                    e
                } else {
                    AgentError::Capability(e.to_string())
                }
            })?;

        if completion.message.role != Role::Assistant {
            return Err(AgentError::Capability(format!(
                "expected an assistant message, got {}",
                completion.message.role
            )));
        }

        Ok(completion.message)
    }

    /// Acting step: resolve every request on the latest message, in order
    async fn act(
        &self,
        conversation: &mut Conversation,
        observer: &mut (dyn FnMut(&Message) + Send),
    ) {
        let requests = conversation
            .last()
            .map(|m| m.tool_requests.clone())
            .unwrap_or_default();

        for request in &requests {
            tracing::debug!(tool = %request.name, id = %request.id, "Executing tool");

            let result = self.tools.resolve(request).await;
            if !result.success {
                tracing::warn!(tool = %request.name, output = %result.output, "Tool call failed");
            }
            append(conversation, result.into_message(), observer);
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

fn append(
    conversation: &mut Conversation,
    message: Message,
    observer: &mut (dyn FnMut(&Message) + Send),
) {
    observer(&message);
    conversation.push(message);
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add one tool; fails on a duplicate name
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Result<Self> {
        self.tools.register(tool)?;
        Ok(self)
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn max_messages(mut self, max: usize) -> Self {
        self.config.max_messages = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::message::ToolRequest;
    use crate::provider::{Completion, ModelInfo, ProviderInfo};
    use crate::tool::ToolSchema;
    use crate::tool::tests::{BrokenTool, ReverseTool};

    /// Replays canned assistant messages and records what it was shown
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Message>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Message>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn info(&self) -> Result<ProviderInfo> {
            Ok(ProviderInfo {
                name: "scripted".into(),
                models: Vec::new(),
                supports_tools: true,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[ToolSchema],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let message = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Message::assistant("(script exhausted)"));
            Ok(Completion {
                message,
                model: options.model.clone(),
                usage: None,
                finish_reason: None,
            })
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    /// Fails every call
    struct DownProvider;

    #[async_trait]
    impl LlmProvider for DownProvider {
        async fn info(&self) -> Result<ProviderInfo> {
            Err(AgentError::CapabilityUnavailable("connection refused".into()))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> Result<Completion> {
            Err(AgentError::CapabilityUnavailable("connection refused".into()))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    fn agent_with(provider: Arc<dyn LlmProvider>) -> Agent {
        let mut tools = ToolRegistry::new();
        tools.register(ReverseTool).unwrap();
        tools.register(BrokenTool).unwrap();
        Agent::with_defaults(provider, Arc::new(tools))
    }

    fn tool_call(name: &str, input: &str) -> Message {
        Message::assistant_with_tools("", vec![ToolRequest::new(name, input)])
    }

    #[test]
    fn test_marker_wins_over_tool_requests() {
        let msg = Message::assistant_with_tools(
            "Final Answer: done",
            vec![ToolRequest::new("reverse", "x")],
        );
        assert_eq!(next_state(&msg, 3, 20), LoopState::Done(Termination::FinalAnswer));
    }

    #[test]
    fn test_marker_variants_terminate() {
        for text in ["FINAL ANSWER: X", "the final answer: X"] {
            let msg = Message::assistant(text);
            assert_eq!(next_state(&msg, 2, 20), LoopState::Done(Termination::FinalAnswer));
        }
    }

    #[test]
    fn test_tool_requests_go_to_acting() {
        let msg = tool_call("reverse", "x");
        assert_eq!(next_state(&msg, 2, 20), LoopState::Acting);
        assert_eq!(next_state(&msg, 40, 20), LoopState::Acting);
    }

    #[test]
    fn test_message_cap_boundary() {
        let msg = Message::assistant("still thinking");
        assert_eq!(next_state(&msg, 21, 20), LoopState::Done(Termination::MessageCap));
        assert_eq!(next_state(&msg, 20, 20), LoopState::Done(Termination::NoPendingWork));
    }

    #[tokio::test]
    async fn test_direct_final_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![Message::assistant("Final Answer: 4")]));
        let agent = agent_with(provider.clone());

        let run = agent.run_with("What is 2+2?", &mut |_: &Message| {}).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(run.termination, Termination::FinalAnswer);
        assert_eq!(run.conversation.len(), 2);
        assert_eq!(run.answer(), "4");
    }

    #[tokio::test]
    async fn test_single_tool_round_trip() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("reverse", "olleh"),
            Message::assistant("Final Answer: hello"),
        ]));
        let agent = agent_with(provider.clone());

        let run = agent.run_with("reverse olleh", &mut |_: &Message| {}).await.unwrap();
        let roles: Vec<Role> = run.conversation.iter().map(|m| m.role).collect();

        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(run.conversation.messages()[2].content, "hello");
        assert_eq!(run.termination, Termination::FinalAnswer);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_every_request_resolved_in_order() {
        let requests = vec![
            ToolRequest::new("reverse", "abc"),
            ToolRequest::new("foo_search", "q"),
            ToolRequest::new("reverse", "xyz"),
        ];
        let provider = Arc::new(ScriptedProvider::new(vec![
            Message::assistant_with_tools("Thought: three calls", requests.clone()),
            Message::assistant("Final Answer: ok"),
        ]));
        let agent = agent_with(provider.clone());

        let conversation = agent.run("go").await.unwrap();
        let results: Vec<&Message> = conversation.iter().filter(|m| m.role == Role::Tool).collect();

        assert_eq!(results.len(), requests.len());
        for (msg, req) in results.iter().zip(&requests) {
            assert_eq!(msg.tool_call_id(), Some(req.id.as_str()));
        }
        assert_eq!(results[0].content, "cba");
        assert_eq!(results[2].content, "zyx");

        // The second reasoning step saw every request answered.
        let seen = provider.seen.lock().unwrap();
        let second = &seen[1];
        assert_eq!(second[0].role, Role::System);
        assert_eq!(second.iter().filter(|m| m.role == Role::Tool).count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_does_not_abort() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("foo_search", "rust"),
            Message::assistant("Final Answer: gave up on search"),
        ]));
        let agent = agent_with(provider.clone());

        let conversation = agent.run("search rust").await.unwrap();
        let tool_msg = &conversation.messages()[2];

        assert_eq!(tool_msg.role, Role::Tool);
        assert!(tool_msg.is_failure());
        assert!(tool_msg.content.contains("tool not found"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_tool_failure_does_not_abort() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("broken", "x"),
            Message::assistant("Final Answer: the service is down"),
        ]));
        let agent = agent_with(provider);

        let answer = agent.ask("try broken").await.unwrap();
        assert_eq!(answer, "the service is down");
    }

    #[tokio::test]
    async fn test_capability_error_propagates() {
        let agent = agent_with(Arc::new(DownProvider));

        let err = agent.run("What is 2+2?").await.unwrap_err();
        assert!(err.is_capability_error());
    }

    #[tokio::test]
    async fn test_plain_reply_ends_without_marker() {
        let provider = Arc::new(ScriptedProvider::new(vec![Message::assistant("Hello there.")]));
        let agent = agent_with(provider);

        let run = agent.run_with("hi", &mut |_: &Message| {}).await.unwrap();
        assert_eq!(run.termination, Termination::NoPendingWork);
        assert_eq!(run.answer(), "Hello there.");
    }

    #[tokio::test]
    async fn test_cap_after_long_tool_chain() {
        let mut replies: Vec<Message> = (0..10).map(|i| tool_call("reverse", &i.to_string())).collect();
        replies.push(Message::assistant("no marker here"));
        let provider = Arc::new(ScriptedProvider::new(replies));
        let agent = agent_with(provider);

        let run = agent.run_with("loop", &mut |_: &Message| {}).await.unwrap();
        // 1 user + 10 * (assistant + tool) + 1 assistant
        assert_eq!(run.conversation.len(), 22);
        assert_eq!(run.termination, Termination::MessageCap);
    }

    #[tokio::test]
    async fn test_observer_sees_every_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("reverse", "ab"),
            Message::assistant("Final Answer: ba"),
        ]));
        let agent = agent_with(provider);

        let mut observed = Vec::new();
        let run = agent
            .run_with("go", &mut |m: &Message| observed.push(m.role))
            .await
            .unwrap();

        assert_eq!(observed.len(), run.conversation.len());
        assert_eq!(observed, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
    }

    #[test]
    fn test_builder_requires_provider() {
        let err = AgentBuilder::new().build().err().unwrap();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_builder_rejects_duplicate_tools() {
        let result = AgentBuilder::new().tool(ReverseTool).and_then(|b| b.tool(ReverseTool));
        assert!(matches!(result, Err(AgentError::DuplicateTool(_))));
    }
}
