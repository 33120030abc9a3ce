//! Liveness and readiness probe

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;

use crate::application::services::ResourcePool;

#[derive(Clone)]
pub struct HealthState {
    pub db: DatabaseConnection,
    pub pool: Arc<ResourcePool>,
    pub started_at: Arc<Instant>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub database: DatabaseProbe,
    /// Free PCs right now; absent when the pool could not be read
    pub pcs_available: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseProbe {
    pub reachable: bool,
    pub latency_ms: Option<u64>,
}

async fn probe_database(db: &DatabaseConnection) -> DatabaseProbe {
    let started = Instant::now();
    let ping = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());
    match db.execute(ping).await {
        Ok(_) => DatabaseProbe {
            reachable: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health probe could not reach the database");
            DatabaseProbe {
                reachable: false,
                latency_ms: None,
            }
        }
    }
}

/// `GET /health`: 200 while the database answers, 503 otherwise
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = probe_database(&state.db).await;
    let pcs_available = state.pool.list_available().await.ok().map(|pcs| pcs.len());

    let (code, status) = if database.reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database,
            pcs_available,
        }),
    )
}
