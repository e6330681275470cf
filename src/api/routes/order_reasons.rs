//! Order-reason endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::extract::Filters;
use crate::db::{ConnectionManager, Connector};
use crate::reports::order_reasons::{self, ReasonFilter};

type Db<C> = State<Arc<ConnectionManager<C>>>;

async fn share<C: Connector>(
    State(db): Db<C>,
    Filters(filter): Filters<ReasonFilter>,
) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(order_reasons::share(&db, &filter).await?))
}

async fn list<C: Connector>(State(db): Db<C>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(order_reasons::list(&db).await?))
}

pub fn router<C: Connector>() -> Router<Arc<ConnectionManager<C>>> {
    Router::new()
        .route("/api/order-reasons/share", get(share::<C>))
        .route("/api/order-reasons/list", get(list::<C>))
}
