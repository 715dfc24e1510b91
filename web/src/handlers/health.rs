//! Service status endpoints. None of them require authentication.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    /// Fixed greeting
    pub message: &'static str,
    /// Deployment environment
    pub env: String,
}

/// Body of the status endpoints.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Status message
    pub message: &'static str,
}

/// `GET /`
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Allocation Service APIs are up and running!",
        env: state.env,
    })
}

/// `GET /checkdb`
///
/// Always 200; the message says whether the store answered.
pub async fn check_db(State(state): State<AppState>) -> Json<StatusResponse> {
    let message = match state.service.ping().await {
        Ok(()) => "Database is connected!",
        Err(error) => {
            tracing::warn!(%error, "Database ping failed");
            "Database is not connected!"
        },
    };
    Json(StatusResponse { message })
}

/// `GET /health`
///
/// Liveness only; does not touch the store.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<StatusResponse>) {
    (StatusCode::OK, Json(StatusResponse { message: "ok" }))
}

/// `GET /ready`
///
/// 503 when the store ping fails.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<StatusResponse>) {
    match state.service.ping().await {
        Ok(()) => (StatusCode::OK, Json(StatusResponse { message: "ready" })),
        Err(error) => {
            tracing::warn!(%error, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StatusResponse {
                    message: "database unavailable",
                }),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, Json(body)) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, "ok");
    }
}
