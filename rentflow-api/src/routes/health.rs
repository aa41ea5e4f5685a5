/// Liveness endpoints
///
/// # Endpoints
///
/// ```text
/// GET /        plain-text banner
/// GET /health  service and database status
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "status": "healthy",
///     "version": "0.1.0",
///     "database": "connected",
///     "pool": { "active_connections": 1, "idle_connections": 2 }
///   }
/// }
/// ```

use crate::{app::AppState, response::ApiResponse};
use axum::extract::State;
use rentflow_shared::db::pool::{get_pool_stats, health_check as ping_database, PoolStats};
use serde::Serialize;

pub const BANNER: &str = "Vehicle Rental API is running";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    pub pool: PoolStats,
}

pub async fn root() -> &'static str {
    BANNER
}

/// Reports `degraded` rather than failing when the database is unreachable,
/// so the endpoint itself always answers 200.
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let connected = match ping_database(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            false
        }
    };

    ApiResponse::ok(
        "Service status",
        HealthResponse {
            status: if connected { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if connected { "connected" } else { "disconnected" }.to_string(),
            pool: get_pool_stats(&state.db),
        },
    )
}
