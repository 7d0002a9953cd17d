//! Liveness endpoint.
//!
//! Public and rate limited like every other route; it does no I/O.
use crate::api::types::HealthStatus;
use axum::Json;

pub(crate) async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}
