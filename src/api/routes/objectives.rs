//! Objective endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::{Json, Router, routing::get};
use chrono::Datelike;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::extract::Filters;
use crate::db::{ConnectionManager, Connector};
use crate::reports::objectives::{
    self, CompletionRow, Evolution, ObjectiveFilter, ObjectiveRow, Projection,
};
use crate::reports::{YearFilter, present};

type Db<C> = State<Arc<ConnectionManager<C>>>;

#[derive(Deserialize)]
pub struct ProjectionParams {
    pub vendor_group: Option<String>,
    pub year: Option<YearFilter>,
}

#[derive(Deserialize)]
pub struct EvolutionParams {
    pub vendor_group: Option<String>,
}

/// GET /api/objectives?year&vendor_group
async fn list<C: Connector>(
    State(db): Db<C>,
    Filters(filter): Filters<ObjectiveFilter>,
) -> Result<Json<Vec<ObjectiveRow>>, ApiError> {
    Ok(Json(objectives::list(&db, &filter).await?))
}

/// GET /api/objectives/completion?year&vendor_group
async fn completion<C: Connector>(
    State(db): Db<C>,
    Filters(filter): Filters<ObjectiveFilter>,
) -> Result<Json<Vec<CompletionRow>>, ApiError> {
    Ok(Json(objectives::completion(&db, &filter).await?))
}

/// GET /api/objectives/projection?vendor_group&year
///
/// Both parameters are required. Revenue is extrapolated from the current
/// calendar month.
async fn projection<C: Connector>(
    State(db): Db<C>,
    Filters(params): Filters<ProjectionParams>,
) -> Result<Json<Projection>, ApiError> {
    let (Some(vendor_group), Some(year)) = (present(&params.vendor_group), params.year) else {
        return Err(ApiError::BadRequest(
            "vendor_group and year are required".to_string(),
        ));
    };
    let month = chrono::Local::now().month();
    Ok(Json(
        objectives::projection(&db, vendor_group, year, month).await?,
    ))
}

/// GET /api/objectives/evolution?vendor_group
async fn evolution<C: Connector>(
    State(db): Db<C>,
    Filters(params): Filters<EvolutionParams>,
) -> Result<Json<Evolution>, ApiError> {
    let vendor_group = present(&params.vendor_group);
    Ok(Json(objectives::evolution(&db, vendor_group).await?))
}

pub fn router<C: Connector>() -> Router<Arc<ConnectionManager<C>>> {
    Router::new()
        .route("/api/objectives", get(list::<C>))
        .route("/api/objectives/completion", get(completion::<C>))
        .route("/api/objectives/projection", get(projection::<C>))
        .route("/api/objectives/evolution", get(evolution::<C>))
}
