//! Liveness and readiness checks

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

/// Liveness check
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive"
        })),
    )
}

/// Readiness check; pings the database when one is configured
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let Some(pool) = &state.pool else {
        return (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "database": "memory"
            })),
        );
    };

    let mut response = serde_json::json!({
        "status": "ready",
        "database": "unknown"
    });
    let mut ready = true;

    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => {
            response["database"] = serde_json::json!("ready");
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database readiness check failed");
            response["database"] = serde_json::json!(format!("not_ready: {}", e));
            ready = false;
        }
        Err(_) => {
            tracing::error!("Database readiness check timed out");
            response["database"] = serde_json::json!("timeout");
            ready = false;
        }
    }

    if !ready {
        response["status"] = serde_json::json!("not_ready");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(response));
    }
    (StatusCode::OK, Json(response))
}
