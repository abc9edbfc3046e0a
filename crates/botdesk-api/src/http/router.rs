//! Axum router configuration with middleware.
//!
//! API routes live under `/api/v1/`; the embed script is served from the
//! root as `/widget.js` so tenant pages can reference a short, stable URL.
//! Middleware: open CORS (the widget runs on arbitrary third-party origins)
//! and request tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::relay_chat))
        .route("/billing/webhook", post(handlers::billing::billing_webhook))
        .route("/conversations", get(handlers::conversation::list_conversations))
        .route(
            "/conversations/{id}/messages",
            get(handlers::conversation::get_conversation_messages),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/widget.js", get(handlers::widget::widget_script))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
