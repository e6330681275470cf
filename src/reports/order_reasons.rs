//! Order-reason breakdown

use super::{FilteredQuery, YearFilter, present};
use crate::db::{ConnectionManager, Connector};
use crate::error::DbResult;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasonFilter {
    #[serde(default)]
    pub year: YearFilter,
    pub reason: Option<String>,
}

pub async fn share<C: Connector>(db: &ConnectionManager<C>, filter: &ReasonFilter) -> DbResult<Vec<Value>> {
    let results = FilteredQuery::new("SELECT year, reason, share FROM order_reason_share WHERE 1=1")
        .year("year", filter.year)
        .filter("reason", present(&filter.reason))
        .run(db)
        .await?;
    Ok(results.to_json())
}

pub async fn list<C: Connector>(db: &ConnectionManager<C>) -> DbResult<Vec<Value>> {
    let results = db
        .execute_query(
            "SELECT DISTINCT reason FROM order_reason_share ORDER BY reason",
            &[],
        )
        .await?;
    Ok(results.to_json())
}
