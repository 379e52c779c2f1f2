//! HTTP/WebSocket Handlers

use axum::{
    Form, Json,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    http::StatusCode,
    response::{Html, Response},
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use agent_core::{AgentError, Message, Termination, ToolSchema, provider::ModelInfo};

use crate::page::{self, Outcome};
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
    pub tools: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub termination: Termination,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub query: String,
}

/// Frames pushed over the progress WebSocket
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent<'a> {
    Message { message: &'a Message },
    Answer { answer: String, termination: Termination },
    Error { error: String, code: &'static str },
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// HTTP status and error code for a failed run
fn classify(err: &AgentError) -> (StatusCode, &'static str) {
    match err {
        AgentError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        AgentError::CapabilityUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "CAPABILITY_UNAVAILABLE"),
        e if e.is_capability_error() => (StatusCode::BAD_GATEWAY, "CAPABILITY_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);
    let provider = state
        .provider
        .info()
        .await
        .map(|info| info.name)
        .unwrap_or_else(|_| "unknown".into());

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider,
        provider_connected,
        tools: state.agent.tools().len(),
    })
}

/// Registered tools, in registration order
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSchema>> {
    Json(state.agent.tools().schemas())
}

/// Models offered by the provider
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<ModelInfo>>, ApiError> {
    state.provider.list_models().await.map(Json).map_err(|e| {
        tracing::warn!("Model listing failed: {}", e);
        let (status, code) = classify(&e);
        api_error(status, code, e.user_message())
    })
}

/// Main chat endpoint (non-streaming)
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message must not be empty"));
    }

    let run = state
        .agent
        .run_with(&payload.message, &mut |_: &Message| {})
        .await
        .map_err(|e| {
            tracing::error!("Agent error: {}", e);
            let (status, code) = classify(&e);
            api_error(status, code, e.user_message())
        })?;

    Ok(Json(ChatResponse {
        answer: run.answer(),
        termination: run.termination,
        messages: run.conversation.messages().to_vec(),
    }))
}

/// WebSocket progress stream
pub async fn chat_stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

async fn send_event(sender: &mut futures::stream::SplitSink<WebSocket, WsMessage>, event: &StreamEvent<'_>) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => sender.send(WsMessage::Text(text.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to encode stream event: {}", e);
            false
        }
    }
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            _ => continue,
        };

        let request = match serde_json::from_str::<ChatRequest>(text.as_str()) {
            Ok(r) if !r.message.trim().is_empty() => r,
            Ok(_) => {
                let event = StreamEvent::Error {
                    error: "Message must not be empty".into(),
                    code: "EMPTY_MESSAGE",
                };
                send_event(&mut sender, &event).await;
                continue;
            }
            Err(e) => {
                let event = StreamEvent::Error {
                    error: e.to_string(),
                    code: "BAD_REQUEST",
                };
                send_event(&mut sender, &event).await;
                continue;
            }
        };

        // The observer is synchronous, so appended messages go through a
        // channel and are forwarded while the run is still going.
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let agent = state.agent.clone();
        let run = async move {
            let mut observer = |message: &Message| {
                let _ = tx.send(message.clone());
            };
            agent.run_with(&request.message, &mut observer).await
        };

        let forward = async {
            let mut connected = true;
            while let Some(message) = rx.recv().await {
                if connected {
                    connected = send_event(&mut sender, &StreamEvent::Message { message: &message }).await;
                }
            }
            connected
        };

        let (result, connected) = tokio::join!(run, forward);
        if !connected {
            tracing::debug!("Client disconnected during run");
            break;
        }

        let event = match result {
            Ok(run) => StreamEvent::Answer {
                answer: run.answer(),
                termination: run.termination,
            },
            Err(e) => {
                tracing::error!("Agent error: {}", e);
                StreamEvent::Error {
                    error: e.user_message(),
                    code: classify(&e).1,
                }
            }
        };
        if !send_event(&mut sender, &event).await {
            break;
        }
    }
}

/// Form page
pub async fn form_page() -> Html<String> {
    Html(page::render("", None))
}

/// Form submission
pub async fn ask_form(State(state): State<AppState>, Form(form): Form<AskForm>) -> (StatusCode, Html<String>) {
    let query = form.query.trim();
    if query.is_empty() {
        return (StatusCode::OK, Html(page::render("", None)));
    }

    match state.agent.ask(query).await {
        Ok(answer) => (StatusCode::OK, Html(page::render(query, Some(Outcome::Answer(&answer))))),
        Err(e) => {
            tracing::error!("Agent error: {}", e);
            let status = if e.is_capability_error() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let message = e.user_message();
            (status, Html(page::render(query, Some(Outcome::Error(&message)))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(&AgentError::Capability("bad".into())).0, StatusCode::BAD_GATEWAY);
        assert_eq!(classify(&AgentError::Auth("key".into())).0, StatusCode::BAD_GATEWAY);
        assert_eq!(
            classify(&AgentError::RateLimited("slow".into())).0,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            classify(&AgentError::CapabilityUnavailable("down".into())).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            classify(&AgentError::Config("x".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_stream_event_shape() {
        let message = Message::user("hi");
        let json = serde_json::to_value(StreamEvent::Message { message: &message }).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["message"]["content"], "hi");

        let json = serde_json::to_value(StreamEvent::Answer {
            answer: "4".into(),
            termination: Termination::FinalAnswer,
        })
        .unwrap();
        assert_eq!(json["type"], "answer");
        assert_eq!(json["termination"], "final_answer");
    }
}
