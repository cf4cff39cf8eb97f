use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::middleware::ApiResponse;

pub async fn health() -> ApiResponse<Value> {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiResponse::with_status(
                json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}
