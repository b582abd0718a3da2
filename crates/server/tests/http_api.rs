//! HTTP round-trips against the router, without a listening socket

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use receptionist_config::Settings;
use receptionist_core::{Appointment, Classification, ClassificationError, IntentClassifier};
use receptionist_server::{create_router, init_metrics, AppState};

fn app_with(settings: Settings) -> Router {
    create_router(AppState::new(settings).unwrap())
}

fn app() -> Router {
    app_with(Settings::default())
}

fn appointment_json() -> Value {
    json!({
        "date": "tomorrow",
        "time": "2:30 PM",
        "service_name": "dental cleaning",
        "provider_name": "Dr. Johnson",
        "location_name": "Main Street Dental Clinic"
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_call(app: &Router, session_id: Option<&str>) -> (StatusCode, Value) {
    let mut body = json!({ "appointment": appointment_json() });
    if let Some(id) = session_id {
        body["session_id"] = json!(id);
    }
    send(app, Method::POST, "/api/calls", Some(body)).await
}

#[tokio::test]
async fn health_reports_capacity() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_calls"], 0);
    assert_eq!(body["max_calls"], 100);
}

#[tokio::test]
async fn create_call_returns_greeting() {
    let app = app();
    let (status, body) = create_call(&app, None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["session_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(body["state"], "awaiting_confirmation");
    assert_eq!(body["actions"][0]["type"], "speak");
    assert!(body["actions"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Dr. Johnson"));
}

#[tokio::test]
async fn confirmation_round_trip() {
    let app = app();
    create_call(&app, Some("call-a")).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/calls/call-a/events",
        Some(json!({"type": "utterance", "text": "Yes, I'll be there", "confidence": 0.95})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "call-a");
    assert_eq!(body["state"], "resolved");
    assert_eq!(body["outcome"], "confirmed");
    assert_eq!(body["clarification_attempts"], 0);
    assert_eq!(body["actions"][0]["type"], "speak");
    assert_eq!(body["actions"][1]["type"], "end_call");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/calls/call-a/events",
        Some(json!({"type": "silence_timeout"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn silence_reprompts() {
    let app = app();
    create_call(&app, Some("quiet")).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/calls/quiet/events",
        Some(json!({"type": "silence_timeout"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "awaiting_confirmation");
    assert_eq!(body["outcome"], "unresolved");
    assert_eq!(body["clarification_attempts"], 1);
    assert_eq!(body["actions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_call_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/calls/nope/events",
        Some(json!({"type": "call_ended"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));

    let (status, _) = send(&app, Method::GET, "/api/calls/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/calls/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_event_is_rejected() {
    let app = app();
    create_call(&app, Some("bad-event")).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/calls/bad-event/events",
        Some(json!({"type": "dtmf", "digit": "1"})),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn capacity_limit_returns_503() {
    let mut settings = Settings::default();
    settings.server.max_calls = 1;
    let app = app_with(settings);

    assert_eq!(create_call(&app, None).await.0, StatusCode::CREATED);
    assert_eq!(create_call(&app, None).await.0, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn duplicate_session_id_conflicts() {
    let app = app();
    assert_eq!(create_call(&app, Some("dup")).await.0, StatusCode::CREATED);
    assert_eq!(create_call(&app, Some("dup")).await.0, StatusCode::CONFLICT);
}

#[tokio::test]
async fn snapshot_list_and_hangup() {
    let app = app();
    create_call(&app, Some("call-b")).await;

    let (status, body) = send(&app, Method::GET, "/api/calls/call-b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "call-b");
    assert_eq!(body["state"], "awaiting_confirmation");
    assert_eq!(body["outcome"], "unresolved");
    assert_eq!(body["appointment"]["location_name"], "Main Street Dental Clinic");
    assert_eq!(body["recent_response_keys"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::GET, "/api/calls", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["calls"][0], "call-b");

    let (status, _) = send(&app, Method::DELETE, "/api/calls/call-b", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/api/calls/call-b", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send(&app, Method::GET, "/api/calls", None).await;
    assert_eq!(body["count"], 0);
}

struct StalledClassifier;

#[async_trait]
impl IntentClassifier for StalledClassifier {
    async fn classify(
        &self,
        _text: &str,
        _appointment: &Appointment,
    ) -> Result<Classification, ClassificationError> {
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

#[tokio::test]
async fn hangup_interrupts_in_flight_event() {
    let state = AppState::with_classifier(Settings::default(), Arc::new(StalledClassifier)).unwrap();
    let app = create_router(state);
    create_call(&app, Some("stuck")).await;

    let pending = {
        let app = app.clone();
        tokio::spawn(async move {
            send(
                &app,
                Method::POST,
                "/api/calls/stuck/events",
                Some(json!({"type": "utterance", "text": "yes", "confidence": 0.9})),
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let (status, _) = send(&app, Method::DELETE, "/api/calls/stuck", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actions"].as_array().unwrap().len(), 0);
    assert_eq!(body["clarification_attempts"], 0);
    assert_eq!(body["outcome"], "unresolved");
}

#[tokio::test]
async fn missing_catalog_file_fails_startup() {
    let mut settings = Settings::default();
    settings.responses.catalog_path = Some("/nonexistent/catalog.yaml".to_string());
    assert!(AppState::new(settings).is_err());
}

#[tokio::test]
async fn metrics_exposes_dialogue_counters() {
    assert!(init_metrics().is_some());
    let app = app();
    create_call(&app, Some("metered")).await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("receptionist_calls_started_total"), "{text}");
}
