/*!
 * # Health Check Module
 *
 * - `/health` - up/down status with a database ping
 * - `/health/live` - process liveness, no dependencies touched
 * - `/health/version` - build information
 */

use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{error, info};
use utoipa::ToSchema;

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Health check detail
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthDetail {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall health information
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub details: BTreeMap<String, HealthDetail>,
}

impl HealthInfo {
    fn from_details(details: BTreeMap<String, HealthDetail>) -> Self {
        let status = if details.values().any(|d| d.status == HealthStatus::Down) {
            HealthStatus::Down
        } else {
            HealthStatus::Up
        };
        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            details,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Up => StatusCode::OK,
            HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Health check with a database ping
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthInfo),
        (status = 503, description = "A dependency is down", body = HealthInfo),
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match crate::db::check_connection(&state.db).await {
        Ok(()) => HealthDetail {
            status: HealthStatus::Up,
            message: None,
        },
        Err(e) => {
            error!("Database health check failed: {}", e);
            HealthDetail {
                status: HealthStatus::Down,
                message: Some("database unreachable".to_string()),
            }
        }
    };

    let mut details = BTreeMap::new();
    details.insert("database".to_string(), database);
    let health = HealthInfo::from_details(details);
    info!(status = ?health.status, "Health check");

    (health.status_code(), Json(health))
}

/// Liveness check endpoint
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
    }))
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .route("/health/version", get(version_info))
}
