//! Axum implementation of the bridge.
//!
//! # Routes
//!
//! - `GET  /health`: Returns `{"status": "ok", "version": ..., "service": "mit-ai-studio"}`
//! - `POST /api/send`: Accepts `{"message": "..."}`, returns `{"response": "..."}`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::bridge::{
    Bridge, BridgeCredentials, MessageHandler, CERT_CHAIN_FILE, PRIVATE_KEY_FILE,
};
use crate::error::StudioError;

/// Shared state for the bridge routes.
#[derive(Clone)]
pub struct BridgeState {
    pub handler: Arc<dyn MessageHandler>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub response: String,
}

/// Build the bridge router.
pub fn bridge_router(handler: Arc<dyn MessageHandler>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/send", post(send_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(BridgeState { handler })
}

/// GET /health: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "mit-ai-studio",
    }))
}

/// POST /api/send: route one message through the crew.
async fn send_handler(
    State(state): State<BridgeState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<SendResponse>, (StatusCode, Json<Value>)> {
    match state.handler.handle(&request.message).await {
        Ok(response) => Ok(Json(SendResponse { response })),
        Err(e) => {
            tracing::error!(error = %e, "bridge request failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            ))
        }
    }
}

/// Serves [`bridge_router`] on `0.0.0.0:<port>`.
#[derive(Debug, Clone)]
pub struct HttpBridge {
    pub port: u16,
    /// Directory searched for the TLS files.
    pub cert_dir: PathBuf,
}

impl HttpBridge {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            cert_dir: PathBuf::from("."),
        }
    }

    /// TLS files that are not present in `cert_dir`.
    pub fn missing_certificates(&self) -> Vec<PathBuf> {
        [CERT_CHAIN_FILE, PRIVATE_KEY_FILE]
            .iter()
            .map(|name| self.cert_dir.join(name))
            .filter(|path| !path.exists())
            .collect()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down bridge");
}

#[async_trait]
impl Bridge for HttpBridge {
    async fn serve(
        &self,
        handler: Arc<dyn MessageHandler>,
        credentials: BridgeCredentials,
    ) -> Result<(), StudioError> {
        for path in self.missing_certificates() {
            tracing::warn!(path = %path.display(), "TLS file not found; terminate TLS in front of the bridge");
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| StudioError::Bridge {
                message: format!("failed to bind {}: {}", addr, e),
            })?;

        tracing::info!("bridge listening on {}", addr);
        tracing::info!("public endpoint: https://{}:{}/api/send", credentials.domain, self.port);

        axum::serve(listener, bridge_router(handler))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| StudioError::Bridge {
                message: format!("server failed: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct UpperHandler;

    #[async_trait]
    impl MessageHandler for UpperHandler {
        async fn handle(&self, message: &str) -> Result<String, StudioError> {
            if message == "fail" {
                return Err(StudioError::Bridge {
                    message: "handler failed".to_string(),
                });
            }
            Ok(message.to_uppercase())
        }
    }

    fn app() -> Router {
        bridge_router(Arc::new(UpperHandler))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn send(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/send")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_send_returns_handler_reply() {
        let response = app().oneshot(send(r#"{"message": "brewing: v60"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], "BREWING: V60");
    }

    #[tokio::test]
    async fn test_send_without_message_field_is_empty_message() {
        let response = app().oneshot(send("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], "");
    }

    #[tokio::test]
    async fn test_send_handler_error_is_500() {
        let response = app().oneshot(send(r#"{"message": "fail"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("handler failed"));
    }

    #[test]
    fn test_missing_certificates() {
        let dir = tempfile::tempdir().unwrap();
        let mut bridge = HttpBridge::new(6000);
        bridge.cert_dir = dir.path().to_path_buf();
        assert_eq!(bridge.missing_certificates().len(), 2);

        std::fs::write(dir.path().join(CERT_CHAIN_FILE), "").unwrap();
        std::fs::write(dir.path().join(PRIVATE_KEY_FILE), "").unwrap();
        assert!(bridge.missing_certificates().is_empty());
    }
}
