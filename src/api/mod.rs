//! HTTP API
//!
//! Every handler is generic over the [`Connector`] so the router can be
//! exercised against an in-memory pool in tests. State is the shared
//! [`ConnectionManager`]; nothing connects until the first report request.

pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::db::{ConnectionManager, Connector};

pub use error::ApiError;

/// Assemble all routes with tracing and, optionally, permissive CORS
pub fn build_router<C: Connector>(db: Arc<ConnectionManager<C>>, cors: bool) -> Router {
    let router = Router::new()
        .merge(routes::health::router::<C>())
        .merge(routes::revenue::router::<C>())
        .merge(routes::salespeople::router::<C>())
        .merge(routes::order_reasons::router::<C>())
        .merge(routes::objectives::router::<C>());

    let router = if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(db)
}

/// Bind and serve until Ctrl+C
pub async fn serve<C: Connector>(
    db: Arc<ConnectionManager<C>>,
    settings: &Settings,
) -> std::io::Result<()> {
    let app = build_router(db, settings.cors);
    let listener = TcpListener::bind(settings.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, starting shutdown"),
        Err(e) => {
            tracing::warn!(error = %e, "Could not install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
