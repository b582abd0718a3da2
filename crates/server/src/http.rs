//! HTTP Endpoints
//!
//! REST API for the call runtime:
//!
//! | method | path | |
//! |---|---|---|
//! | POST | `/api/calls` | create a call, returns the greeting |
//! | GET | `/api/calls` | list call ids |
//! | GET | `/api/calls/:id` | session snapshot |
//! | DELETE | `/api/calls/:id` | far-end hangup |
//! | POST | `/api/calls/:id/events` | deliver one input event |
//! | GET | `/health` | liveness and capacity |
//! | GET | `/metrics` | Prometheus text |

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use receptionist_agent::DialogueError;
use receptionist_core::{AgentAction, Appointment, CallOutcome, DialogueState, InputEvent};

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        .route("/api/calls", post(create_call).get(list_calls))
        .route("/api/calls/:id", get(get_call).delete(hang_up_call))
        .route("/api/calls/:id/events", post(post_event))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - disabled: permissive (development)
/// - no origins: any origin, no credentials
/// - otherwise: the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    base.allow_origin(parsed_origins)
}

/// Create call request
#[derive(Debug, Deserialize)]
pub struct CreateCallRequest {
    pub appointment: Appointment,
    /// Caller-chosen id; a UUID is generated when absent
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Create call response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCallResponse {
    pub session_id: String,
    pub state: DialogueState,
    pub actions: Vec<AgentAction>,
}

/// Event response
#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub session_id: String,
    pub state: DialogueState,
    pub outcome: CallOutcome,
    pub clarification_attempts: u32,
    pub actions: Vec<AgentAction>,
}

async fn create_call(
    State(state): State<AppState>,
    Json(request): Json<CreateCallRequest>,
) -> Result<(StatusCode, Json<CreateCallResponse>), ServerError> {
    let (entry, actions) = state
        .sessions
        .create(request.session_id, request.appointment)?;
    let call_state = entry.controller().await.session().state();

    Ok((
        StatusCode::CREATED,
        Json(CreateCallResponse {
            session_id: entry.id.clone(),
            state: call_state,
            actions,
        }),
    ))
}

async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<InputEvent>,
) -> Result<Json<EventResponse>, ServerError> {
    let entry = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::NotFound(id.clone()))?;

    entry.touch();
    let mut controller = entry.controller().await;

    let actions = controller.handle_event(event).await.map_err(|e| match e {
        DialogueError::InvalidSessionState { .. } => {
            tracing::debug!(session_id = %id, error = %e, "Event ignored");
            ServerError::Conflict(e.to_string())
        }
        other => ServerError::Internal(other.to_string()),
    })?;

    let session = controller.session();
    Ok(Json(EventResponse {
        session_id: id,
        state: session.state(),
        outcome: session.outcome(),
        clarification_attempts: session.clarification_attempts(),
        actions,
    }))
}

/// Get call snapshot
async fn get_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let entry = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::NotFound(id.clone()))?;

    let controller = entry.controller().await;
    let mut snapshot = serde_json::to_value(controller.session())
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    if let Some(obj) = snapshot.as_object_mut() {
        obj.insert("idle_secs".to_string(), entry.idle_for().as_secs().into());
    }

    Ok(Json(snapshot))
}

/// Far-end hangup
async fn hang_up_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.sessions.hang_up(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List calls
async fn list_calls(State(state): State<AppState>) -> Json<serde_json::Value> {
    let calls = state.sessions.list();
    Json(serde_json::json!({
        "calls": calls,
        "count": calls.len(),
    }))
}

/// Health check
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "active_calls": state.sessions.count(),
        "max_calls": state.sessions.max_calls(),
    }))
}
