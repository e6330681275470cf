//! Banner and health check

use std::sync::Arc;

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::db::{ConnectionManager, Connector, PoolStatus};

#[derive(Serialize)]
pub struct Banner {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub pool: PoolStatus,
}

/// GET /
async fn banner() -> Json<Banner> {
    Json(Banner {
        message: concat!("salesboard API v", env!("CARGO_PKG_VERSION")),
    })
}

/// GET /health
///
/// Reports pool state without touching the database.
async fn health<C: Connector>(State(db): State<Arc<ConnectionManager<C>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pool: db.status(),
    })
}

pub fn router<C: Connector>() -> Router<Arc<ConnectionManager<C>>> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health::<C>))
}
