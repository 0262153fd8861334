//! API Server
//!
//! HTTP surface of the relay: connect, disconnect, addmessage and update,
//! plus a stats endpoint. Every route accepts GET or POST with a JSON body.
//! Any precondition failure is a bare 400.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::core::{Message, MessageId};
use crate::infrastructure::metrics::{MetricsSnapshot, RelayMetrics};
use crate::relay::SharedRelay;
use crate::{ApiConfig, RelayError};

/// Request body shared by all relay routes
#[derive(Debug, Default, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub text: String,
}

/// Relay counters and current sizes
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub connections: usize,
    pub clients: usize,
    pub messages: usize,
    pub last_message_id: MessageId,
    pub metrics: MetricsSnapshot,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub relay: SharedRelay,
    pub metrics: Arc<RelayMetrics>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        if self.is_precondition() {
            crate::log_api!(tracing::Level::DEBUG, "Rejected: {}", self);
            StatusCode::BAD_REQUEST.into_response()
        } else {
            crate::log_api!(tracing::Level::ERROR, "Request failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the router (also used directly by tests)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/connect", get(connect).post(connect))
        .route("/disconnect", get(disconnect).post(disconnect))
        .route("/addmessage", get(add_message).post(add_message))
        .route("/update", get(update).post(update))
        .route("/stats", get(stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn start_server(state: AppState, config: &ApiConfig) -> Result<(), RelayError> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    crate::log_api!(tracing::Level::INFO, "Server is now running at {}.", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// A missing or malformed body is treated as empty fields
fn body(req: Option<Json<RelayRequest>>) -> RelayRequest {
    req.map(|Json(r)| r).unwrap_or_default()
}

async fn connect(
    State(state): State<AppState>,
    req: Option<Json<RelayRequest>>,
) -> Result<Json<Vec<Message>>, RelayError> {
    let req = body(req);
    let messages = state.relay.lock().connect(&req.from)?;
    Ok(Json(messages))
}

async fn disconnect(
    State(state): State<AppState>,
    req: Option<Json<RelayRequest>>,
) -> Result<StatusCode, RelayError> {
    let req = body(req);
    state.relay.lock().disconnect(&req.from)?;
    Ok(StatusCode::OK)
}

async fn add_message(
    State(state): State<AppState>,
    req: Option<Json<RelayRequest>>,
) -> Result<Json<Vec<Message>>, RelayError> {
    let req = body(req);
    let messages = state.relay.lock().post_message(&req.from, &req.text)?;
    Ok(Json(messages))
}

async fn update(
    State(state): State<AppState>,
    req: Option<Json<RelayRequest>>,
) -> Result<Json<Vec<Message>>, RelayError> {
    let req = body(req);
    let messages = state.relay.lock().poll_update(&req.from)?;
    Ok(Json(messages))
}

async fn stats(State(state): State<AppState>) -> Json<StatsDto> {
    let relay = state.relay.lock();
    Json(StatsDto {
        connections: relay.connections().len(),
        clients: relay.clients().len(),
        messages: relay.log().len(),
        last_message_id: relay.log().last_id(),
        metrics: state.metrics.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::ChatRelay;
    use crate::RelayConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (Router, SharedRelay) {
        let metrics = Arc::new(RelayMetrics::new());
        let relay = ChatRelay::new(&RelayConfig::default(), metrics.clone()).into_shared();
        let state = AppState {
            relay: relay.clone(),
            metrics,
        };
        (router(state), relay)
    }

    async fn call(app: &Router, uri: &str, json: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_connect_returns_join_notice() {
        let (app, _) = app();
        let (status, body) = call(&app, "/connect", r#"{"from":"alice"}"#).await;
        assert_eq!(status, StatusCode::OK);

        let messages: Vec<Message> = serde_json::from_slice(&body).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "Server");
        assert_eq!(messages[0].text, "alice has joined the chat.");
    }

    #[tokio::test]
    async fn test_double_connect_is_bad_request() {
        let (app, _) = app();
        call(&app, "/connect", r#"{"from":"alice"}"#).await;
        let (status, body) = call(&app, "/connect", r#"{"from":"alice"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_post_and_update() {
        let (app, relay) = app();
        call(&app, "/connect", r#"{"from":"alice"}"#).await;
        call(&app, "/connect", r#"{"from":"bob"}"#).await;

        let (status, body) = call(&app, "/addmessage", r#"{"from":"bob","text":"hi"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]");

        let (status, body) = call(&app, "/update", r#"{"from":"alice"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let messages: Vec<Message> = serde_json::from_slice(&body).unwrap();
        // bob's join notice; bob's "hi" is the tail and waits for the next poll
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "bob has joined the chat.");
        assert_eq!(relay.lock().log().last_id(), 2);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let (app, _) = app();
        let (status, _) = call(&app, "/connect", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        call(&app, "/connect", r#"{"from":"alice"}"#).await;
        let (status, _) = call(&app, "/addmessage", r#"{"from":"alice"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, "/update", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let (app, relay) = app();
        let (status, _) = call(&app, "/disconnect", r#"{"from":"alice"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        call(&app, "/connect", r#"{"from":"alice"}"#).await;
        let (status, body) = call(&app, "/disconnect", r#"{"from":"alice"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert!(!relay.lock().is_connected("alice"));

        let (status, _) = call(&app, "/update", r#"{"from":"alice"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats() {
        let (app, _) = app();
        call(&app, "/connect", r#"{"from":"alice"}"#).await;
        call(&app, "/addmessage", r#"{"from":"alice","text":"yo"}"#).await;

        let (status, body) = call(&app, "/stats", "").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["connections"], 1);
        assert_eq!(json["messages"], 2);
        assert_eq!(json["lastMessageId"], 1);
        assert_eq!(json["metrics"]["messagesPosted"], 1);
    }
}
