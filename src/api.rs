//! HTTP surface of the chat assistant
//!
//! POST /api/chat   chat history in, action / message / suggestions out
//! GET  /health     liveness (POST accepted too)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::agent::ChatOrchestrator;
use crate::error::AssistantError;
use crate::models::{ChatRequest, Message, UserInfo};
use crate::Result;

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<ChatOrchestrator>,
}

/// =============================
/// Request Validation
/// =============================

fn invalid(message: &str) -> AssistantError {
    AssistantError::InvalidRequest(message.to_string())
}

fn parse_message(raw: &Value) -> Result<Message> {
    let fields = raw
        .as_object()
        .ok_or_else(|| invalid("Each message must be an object."))?;

    if fields.contains_key("role") {
        return Err(invalid("Role is not allowed. Deprecated."));
    }
    if fields.contains_key("message") {
        return Err(invalid("Message is not allowed. Deprecated."));
    }

    let user = fields
        .get("user")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("User is not provided."))?;
    let content = fields
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("Content is not provided."))?;

    Ok(Message::new(user, content))
}

/// Validate a raw `/api/chat` body. Message shape is checked before `stream`.
pub fn parse_chat_request(body: &Value) -> Result<ChatRequest> {
    if !body.is_object() {
        return Err(invalid("Request body must be an object."));
    }

    let messages = match body.get("messages") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(parse_message).collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(invalid("Messages must be a list.")),
    };

    if body.get("stream").and_then(Value::as_bool).unwrap_or(false) {
        return Err(invalid("Stream mode is not supported."));
    }

    let user_info = match body.get("userInfo") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<UserInfo>(raw.clone())
                .map_err(|_| invalid("User info must be an object with a status field."))?,
        ),
    };

    Ok(ChatRequest { messages, user_info })
}

/// =============================
/// Handlers
/// =============================

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn error_response(err: AssistantError) -> Response {
    let status = if err.is_client_error() {
        warn!(error = %err, "Rejected chat request");
        StatusCode::BAD_REQUEST
    } else {
        error!(error = %err, "Chat request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn chat_handler(State(state): State<ApiState>, Json(body): Json<Value>) -> Response {
    let request = match parse_chat_request(&body) {
        Ok(request) => request,
        Err(e) => return error_response(e),
    };

    match state.orchestrator.handle(&request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => error_response(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<ChatOrchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", get(health).post(health))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(orchestrator: Arc<ChatOrchestrator>, port: u16) -> Result<()> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Chat API listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;
    Ok(())
}
