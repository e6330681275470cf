//! Salesperson endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::extract::Filters;
use crate::db::{ConnectionManager, Connector};
use crate::reports::present;
use crate::reports::salespeople::{self, SalespersonFilter};

type Db<C> = State<Arc<ConnectionManager<C>>>;

#[derive(Deserialize)]
pub struct ConversionParams {
    pub salesperson: Option<String>,
}

async fn order_share<C: Connector>(
    State(db): Db<C>,
    Filters(filter): Filters<SalespersonFilter>,
) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(salespeople::order_share(&db, &filter).await?))
}

async fn success_rate<C: Connector>(
    State(db): Db<C>,
    Filters(filter): Filters<SalespersonFilter>,
) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(salespeople::success_rate(&db, &filter).await?))
}

async fn conversion_times<C: Connector>(
    State(db): Db<C>,
    Filters(params): Filters<ConversionParams>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let rows = salespeople::conversion_times(&db, present(&params.salesperson)).await?;
    Ok(Json(rows))
}

async fn list<C: Connector>(State(db): Db<C>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(salespeople::list(&db).await?))
}

async fn vendor_groups<C: Connector>(State(db): Db<C>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(salespeople::vendor_groups(&db).await?))
}

pub fn router<C: Connector>() -> Router<Arc<ConnectionManager<C>>> {
    Router::new()
        .route("/api/salespeople/order-share", get(order_share::<C>))
        .route("/api/salespeople/success-rate", get(success_rate::<C>))
        .route("/api/salespeople/conversion-times", get(conversion_times::<C>))
        .route("/api/salespeople/list", get(list::<C>))
        .route("/api/salespeople/vendor-groups", get(vendor_groups::<C>))
}
