//! Revenue endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::extract::{Filters, YearPath};
use crate::db::{ConnectionManager, Connector};
use crate::reports::revenue::{
    self, CountryFilter, CountryRevenue, RevenueTotal, VendorFilter, VendorRevenue,
};

type Db<C> = State<Arc<ConnectionManager<C>>>;

/// GET /api/revenue/by-country?country&year
async fn by_country<C: Connector>(
    State(db): Db<C>,
    Filters(filter): Filters<CountryFilter>,
) -> Result<Json<Vec<CountryRevenue>>, ApiError> {
    Ok(Json(revenue::by_country(&db, &filter).await?))
}

/// GET /api/revenue/by-vendor?vendor_group&year
async fn by_vendor<C: Connector>(
    State(db): Db<C>,
    Filters(filter): Filters<VendorFilter>,
) -> Result<Json<Vec<VendorRevenue>>, ApiError> {
    Ok(Json(revenue::by_vendor(&db, &filter).await?))
}

/// GET /api/revenue/total/{year}
async fn total<C: Connector>(
    State(db): Db<C>,
    YearPath(year): YearPath,
) -> Result<Json<RevenueTotal>, ApiError> {
    Ok(Json(revenue::total(&db, year).await?))
}

async fn years<C: Connector>(State(db): Db<C>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(revenue::years(&db).await?))
}

async fn countries<C: Connector>(State(db): Db<C>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(revenue::countries(&db).await?))
}

pub fn router<C: Connector>() -> Router<Arc<ConnectionManager<C>>> {
    Router::new()
        .route("/api/revenue/by-country", get(by_country::<C>))
        .route("/api/revenue/by-vendor", get(by_vendor::<C>))
        .route("/api/revenue/total/{year}", get(total::<C>))
        .route("/api/revenue/years", get(years::<C>))
        .route("/api/revenue/countries", get(countries::<C>))
}
