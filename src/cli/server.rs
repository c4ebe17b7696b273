//! HTTP server mode
//!
//! The platform side posts an event together with the checkpoint it holds
//! and gets back the signal, the updated checkpoint and the items pushed
//! during the invocation. The server keeps no state between requests.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::runner::invoke_in_memory;
use crate::config::ConnectorConfig;
use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::event::{AirdropEvent, Signal};
use crate::state::{Checkpoint, StateManager};
use crate::types::JsonValue;

/// Server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Connector configuration every request runs with
    pub connector: ConnectorConfig,
}

/// App state shared across handlers
struct AppState {
    connector: Connector,
}

/// Request body for `POST /events`
#[derive(Debug, Deserialize)]
struct EventRequest {
    event: AirdropEvent,
    /// Checkpoint from the previous invocation; fresh when absent
    #[serde(default)]
    state: Option<Checkpoint>,
}

/// Items of one type pushed during the invocation
#[derive(Debug, Serialize)]
struct ItemBatch {
    item_type: String,
    items: Vec<JsonValue>,
}

/// Response body for `POST /events`
#[derive(Debug, Serialize)]
struct EventResponse {
    signal: Signal,
    state: Checkpoint,
    items: Vec<ItemBatch>,
}

/// Build the router
pub fn router(config: ServerConfig) -> Router {
    let state = AppState {
        connector: Connector::new(config.connector),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/events", post(handle_event))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig, port: u16) -> Result<()> {
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

/// Run one invocation for the posted event
async fn handle_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EventRequest>,
) -> impl IntoResponse {
    let store = StateManager::in_memory();
    if let Some(previous) = request.state {
        store.replace(previous).await;
    }

    match invoke_in_memory(&state.connector, &request.event, &store).await {
        Ok((signal, sink)) => {
            let items = sink
                .into_batches()
                .into_iter()
                .map(|(item_type, items)| ItemBatch { item_type, items })
                .collect();
            let response = EventResponse {
                signal,
                state: store.checkpoint().await,
                items,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn post_event(body: JsonValue) -> (StatusCode, JsonValue) {
        let request = Request::post("/events")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router(ServerConfig::default()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(ServerConfig::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metadata_event() {
        let (status, body) = post_event(json!({
            "event": {"event_type": "EXTRACTION_METADATA_START"}
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signal"]["signal_type"], "EXTRACTION_METADATA_DONE");
        assert_eq!(body["items"][0]["item_type"], "external_domain_metadata");
        assert_eq!(body["state"]["users"]["completed"], false);
    }

    #[tokio::test]
    async fn test_state_is_passed_through() {
        let (status, body) = post_event(json!({
            "event": {"event_type": "EXTRACTION_DATA_CONTINUE"},
            "state": {"tasks": {"completed": false, "cursor": "abc"}}
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signal"]["signal_type"], "EXTRACTION_DATA_ERROR");
        assert_eq!(body["state"]["tasks"]["cursor"], "abc");
    }

    #[tokio::test]
    async fn test_malformed_event_rejected() {
        let (status, _) = post_event(json!({"event": {"event_type": "NOT_AN_EVENT"}})).await;
        assert!(status.is_client_error());
    }
}
