//! HTTP API used by the WhatsApp webhook bridge.
//!
//! `POST /api/message` runs one turn through the gateway and returns the
//! reply; `GET /api/health` reports uptime.

use crate::gateway::Gateway;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use concierge_core::{
    config::ApiConfig,
    message::{Attachment, IncomingMessage},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    gateway: Arc<Gateway>,
    api_key: Option<String>,
    uptime: Instant,
}

/// Inbound message body.
#[derive(Debug, Deserialize)]
struct MessageRequest {
    user_id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

type ApiError = (StatusCode, Json<Value>);

fn bad_request(msg: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
}

/// Constant-time string comparison for bearer tokens.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// `None` if authorized, otherwise the rejection to return.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Option<ApiError> {
    let key = api_key.as_ref()?;

    let Some(header) = headers.get("authorization") else {
        return Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "missing Authorization header"})),
        ));
    };
    let Ok(value) = header.to_str() else {
        return Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid Authorization header"})),
        ));
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => None,
        _ => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token"})),
        )),
    }
}

/// `GET /api/health`
async fn health(headers: HeaderMap, State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }
    Ok(Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
        "active_users": state.gateway.active_user_count().await,
    })))
}

/// `POST /api/message`
async fn message(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<MessageRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }

    let Json(request) = body.map_err(|e| bad_request(&format!("invalid request: {e}")))?;

    if request.user_id.trim().is_empty() {
        return Err(bad_request("user_id must not be empty"));
    }
    if request.text.trim().is_empty() && request.attachments.is_empty() {
        return Err(bad_request("text or attachments required"));
    }

    let mut incoming = IncomingMessage::text(request.user_id.trim(), &request.text);
    incoming.attachments = request.attachments;
    let id = incoming.id;
    let reply = state.gateway.handle(incoming).await;
    info!("api message {id} answered via {}", reply.route);

    Ok(Json(json!({
        "reply": reply.reply,
        "route": reply.route,
    })))
}

/// Build the axum router with shared state.
fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/message", post(message))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(config: &ApiConfig, gateway: Arc<Gateway>) {
    let api_key = if config.api_key.is_empty() {
        None
    } else {
        Some(config.api_key.clone())
    };
    let state = ApiState {
        gateway,
        api_key,
        uptime: Instant::now(),
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}
