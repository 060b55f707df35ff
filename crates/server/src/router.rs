//! Route table
//!
//! Every endpoint is registered here against its handler. The auth gate
//! wraps the whole router, fallback included, so unknown paths are gated
//! like any other.

use crate::auth::{handlers as auth_handlers, middleware::mw_require_auth};
use crate::chat;
use crate::config::AppState;
use crate::error::GENERIC_FAILURE;
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::error;

pub fn router(state: AppState) -> Router {
    Router::new()
        // Auth routes
        .route("/api/auth/signup", post(auth_handlers::signup))
        .route("/api/auth/login", post(auth_handlers::login))
        .route("/api/auth/profile", get(auth_handlers::profile))
        // Chat routes
        .route("/api/chat", post(chat::chat))
        .route("/api/conversations", get(chat::list_conversations))
        .route(
            "/api/conversations/{id}/messages",
            get(chat::list_messages),
        )
        // Health check
        .route("/health", get(health_check))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), mw_require_auth))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response()
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Method not allowed" })),
    )
        .into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("[Server] Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": GENERIC_FAILURE })),
    )
        .into_response()
}
