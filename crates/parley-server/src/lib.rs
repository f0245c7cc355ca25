//! # parley-server
//!
//! HTTP/WebSocket API server over a session registry. Provides:
//!
//! - REST API for chat, continuation, and session management
//! - WebSocket endpoint for interactive chat with automatic continuation

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use parley_config::schema::ParleyConfig;
use parley_core::{ParleyError, SpeakerDecision};
use parley_gateway::ModelGateway;
use parley_session::{SessionRegistry, TurnOutcome};

/// Shared server state.
pub struct AppState {
    pub config: ParleyConfig,
    pub registry: SessionRegistry,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Chat request body, shared by /chat and /chat/continue.
#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
    session_id: Option<Uuid>,
    #[serde(default = "default_check_continue")]
    check_continue: bool,
}

fn default_check_continue() -> bool {
    true
}

/// Chat response body.
#[derive(Serialize)]
struct ChatResponse {
    response: String,
    thoughts: Option<String>,
    session_id: Uuid,
    should_continue: bool,
    decision: Option<SpeakerDecision>,
    timestamp: chrono::DateTime<Utc>,
}

impl ChatResponse {
    fn from_outcome(session_id: Uuid, outcome: TurnOutcome) -> Self {
        Self {
            response: outcome.turn.text_content(),
            thoughts: outcome.turn.thought_content(),
            session_id,
            should_continue: outcome.should_continue,
            decision: outcome.decision,
            timestamp: Utc::now(),
        }
    }
}

/// Build the Axum router.
pub fn build_router(config: ParleyConfig, gateway: Arc<dyn ModelGateway>) -> Router {
    let state = Arc::new(AppState {
        registry: SessionRegistry::new(gateway, config.clone()),
        config,
    });

    let api_routes = Router::new()
        .route("/api/v1/chat", post(chat_handler))
        .route("/api/v1/chat/continue", post(continue_handler))
        .route("/api/v1/sessions", get(sessions_handler))
        .route("/api/v1/sessions/{id}/info", get(session_info_handler))
        .route(
            "/api/v1/sessions/{id}/history",
            get(session_history_handler),
        )
        .route("/api/v1/sessions/{id}/tools", get(session_tools_handler))
        .route("/api/v1/sessions/{id}", delete(delete_session_handler));

    // Apply API key auth if configured
    let api_routes = if state.config.server.api_key.is_some() {
        api_routes.layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
    } else {
        api_routes
    };

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/ws/{session_id}", get(ws_handler))
        .merge(api_routes)
        .with_state(state.clone());

    if state.config.server.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

/// Middleware that checks the Authorization header against the configured API key.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(ref expected_key) = state.config.server.api_key {
        let provided = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match provided {
            Some(key) if key == expected_key => {}
            _ => {
                warn!("unauthorized API request: invalid or missing API key");
                return Err(StatusCode::UNAUTHORIZED);
            }
        }
    }
    Ok(next.run(request).await)
}

fn error_status(err: &ParleyError) -> StatusCode {
    match err {
        ParleyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        ParleyError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let message = match req.message {
        Some(ref m) if !m.trim().is_empty() => m.clone(),
        _ => return Err(StatusCode::UNPROCESSABLE_ENTITY),
    };

    let (session_id, session) = state.registry.get_or_create(req.session_id).await;
    let mut session = session.lock().await;

    match session.submit(&message, req.check_continue).await {
        Ok(outcome) => Ok(Json(ChatResponse::from_outcome(session_id, outcome))),
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "chat turn failed");
            Err(error_status(&e))
        }
    }
}

/// Submit the canned continuation prompt to an existing session. Unlike
/// /chat, this never creates a session: an unknown id is a 404.
async fn continue_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let session_id = req.session_id.ok_or(StatusCode::BAD_REQUEST)?;
    let session = state
        .registry
        .get(session_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let mut session = session.lock().await;

    match session.submit_continue().await {
        Ok(outcome) => Ok(Json(ChatResponse::from_outcome(session_id, outcome))),
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "continuation turn failed");
            Err(error_status(&e))
        }
    }
}

async fn sessions_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sessions = state.registry.list().await;
    Json(serde_json::json!({ "sessions": sessions }))
}

async fn session_info_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.registry.summary(id).await {
        Some(summary) => Ok(Json(serde_json::to_value(summary).unwrap_or_default())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn session_history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let session = state.registry.get(id).await.ok_or(StatusCode::NOT_FOUND)?;
    let session = session.lock().await;
    Ok(Json(serde_json::json!({
        "messages": session.transcript().turns(),
    })))
}

async fn session_tools_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let session = state.registry.get(id).await.ok_or(StatusCode::NOT_FOUND)?;
    let session = session.lock().await;
    Ok(Json(serde_json::json!({ "tools": session.tools() })))
}

async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if state.registry.remove(id).await {
        Ok(Json(
            serde_json::json!({ "message": "Session deleted successfully" }),
        ))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

// ── WebSocket ──────────────────────────────────────────────────

/// Incoming WebSocket frame.
#[derive(Deserialize)]
struct WsIncoming {
    #[serde(default)]
    message: String,
    #[serde(default = "default_check_continue")]
    check_continue: bool,
}

async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_session(socket, state, session_id))
}

async fn ws_session(mut socket: WebSocket, state: Arc<AppState>, session_id: Uuid) {
    let (session_id, session) = state.registry.get_or_create(Some(session_id)).await;
    info!(session_id = %session_id, "websocket connected");

    // A fresh session greets before the first client frame.
    {
        let mut session = session.lock().await;
        if session.transcript().is_empty() {
            let greeting = session.greet();
            let frame = serde_json::json!({
                "type": "greeting",
                "response": greeting,
                "session_id": session_id,
                "timestamp": Utc::now(),
            });
            if send_json(&mut socket, &frame).await.is_err() {
                return;
            }
        }
    }

    let max_auto_continues = state.config.agent.max_auto_continues;

    while let Some(Ok(msg)) = socket.recv().await {
        let text = match msg {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };

        let incoming: WsIncoming = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                let frame = ws_error_frame(format!("invalid frame: {e}"));
                if send_json(&mut socket, &frame).await.is_err() {
                    break;
                }
                continue;
            }
        };
        if incoming.message.trim().is_empty() {
            continue;
        }

        let mut session = session.lock().await;
        let outcome = match session.submit(&incoming.message, incoming.check_continue).await {
            Ok(o) => o,
            Err(e) => {
                drop(session);
                let frame = ws_error_frame(e.to_string());
                if send_json(&mut socket, &frame).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let mut should_continue = outcome.should_continue;
        let frame = ws_turn_frame("message", session_id, outcome);
        if send_json(&mut socket, &frame).await.is_err() {
            break;
        }

        // Keep the model going until it yields, bounded per user input.
        let mut continues = 0u32;
        while should_continue && continues < max_auto_continues {
            continues += 1;
            match session.submit_continue().await {
                Ok(outcome) => {
                    should_continue = outcome.should_continue;
                    let frame = ws_turn_frame("continuation", session_id, outcome);
                    if send_json(&mut socket, &frame).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "continuation failed");
                    let frame = ws_error_frame(e.to_string());
                    let _ = send_json(&mut socket, &frame).await;
                    break;
                }
            }
        }
    }

    info!(session_id = %session_id, "websocket disconnected");
}

fn ws_turn_frame(kind: &str, session_id: Uuid, outcome: TurnOutcome) -> serde_json::Value {
    serde_json::json!({
        "type": kind,
        "response": outcome.turn.text_content(),
        "thoughts": outcome.turn.thought_content(),
        "session_id": session_id,
        "should_continue": outcome.should_continue,
        "decision": outcome.decision,
        "timestamp": Utc::now(),
    })
}

fn ws_error_frame(message: String) -> serde_json::Value {
    serde_json::json!({
        "type": "error",
        "message": message,
        "timestamp": Utc::now(),
    })
}

async fn send_json(
    socket: &mut WebSocket,
    frame: &serde_json::Value,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).unwrap_or_default();
    socket.send(WsMessage::Text(text.into())).await
}

/// Start the HTTP server.
pub async fn start_server(
    config: ParleyConfig,
    gateway: Arc<dyn ModelGateway>,
) -> parley_core::Result<()> {
    let listen = config.server.listen.clone();
    let router = build_router(config, gateway);

    info!(listen = %listen, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .map_err(|e| ParleyError::Session(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| ParleyError::Session(format!("server error: {e}")))?;

    Ok(())
}
