use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::app::services::AppServices;

/// Liveness of both stores. Never fails; a dead store yields 503.
pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let (heroes, users) = tokio::join!(services.heroes.is_connected(), services.users.is_connected());

    let (status, label) = if heroes && users {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!(heroes, users, "store liveness check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "heroes": heroes,
            "users": users,
        })),
    )
}
