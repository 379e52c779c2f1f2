//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    ask_form, chat_handler, chat_stream_handler, form_page, health_check, list_models, list_tools,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Form UI
        .route("/", get(form_page))
        .route("/ask", post(ask_form))

        // Health & info
        .route("/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/models", get(list_models))

        // Agent API
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", get(chat_stream_handler))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
