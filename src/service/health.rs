//! Liveness endpoint.
//!
//! Serves `GET /health` with a 200 while the chat connection is live and a
//! 503 otherwise, so container orchestrators can restart a wedged process.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::info;

use crate::base::types::Void;

/// Shared liveness state.
///
/// The connected flag is flipped by the chat client; uptime counts from
/// process start.
#[derive(Clone)]
pub struct HealthState {
    connected: Arc<AtomicBool>,
    started_at: Instant,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(false)),
            started_at: Instant::now(),
        }
    }

    /// Handle the chat client uses to report connection state.
    pub fn connected_handle(&self) -> Arc<AtomicBool> {
        self.connected.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves the liveness endpoint until the process exits.
pub async fn serve(port: u16, state: HealthState) -> Void {
    let app = Router::new().route("/health", get(health)).fallback(not_found).with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Health check server listening on port {port}.");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<HealthState>) -> Response {
    if state.is_connected() {
        let body = serde_json::json!({ "status": "healthy", "uptime": state.uptime().as_secs() });
        (StatusCode::OK, Json(body)).into_response()
    } else {
        let body = serde_json::json!({ "status": "unhealthy", "reason": "chat connection is not established" });
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_healthy_when_connected() {
        let state = HealthState::new();
        state.connected_handle().store(true, Ordering::SeqCst);

        let response = health(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reports_unavailable_when_disconnected() {
        let state = HealthState::new();

        let response = health(State(state)).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn other_paths_are_not_found() {
        assert_eq!(not_found().await, StatusCode::NOT_FOUND);
    }
}
