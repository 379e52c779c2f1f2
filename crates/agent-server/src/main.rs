//! research-agent HTTP Server
//!
//! Axum-based server providing the research assistant's form UI, a JSON
//! API and a WebSocket progress stream.

mod config;
mod handlers;
mod page;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, LlmProvider};
use agent_runtime::{OllamaProvider, OpenAiProvider};
use research_tools::{RESEARCH_ASSISTANT_PROMPT, ResearchConfig};

use crate::config::{ProviderKind, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::from_env().context("OpenAI provider")?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::from_env().context("Ollama provider")?),
    };

    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to {:?} provider (model {})", config.provider, config.model);
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {:?} provider not reachable - requests will fail until it is", config.provider);
        }
    }

    // Initialize tools
    let tools = research_tools::default_registry(&ResearchConfig::from_env())?;
    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tools(tools)
        .system_prompt(RESEARCH_ASSISTANT_PROMPT)
        .model(&config.model)
        .temperature(config.temperature)
        .max_messages(config.max_messages)
        .build()?;

    let app = routes::router(AppState::new(agent, provider));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 research-agent server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                - Research form");
    tracing::info!("  POST /ask             - Submit form");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/tools       - List tools");
    tracing::info!("  GET  /api/models      - List available models");
    tracing::info!("  POST /api/chat        - Ask a question");
    tracing::info!("  GET  /api/chat/stream - WebSocket progress stream");

    axum::serve(listener, app).await?;

    Ok(())
}
