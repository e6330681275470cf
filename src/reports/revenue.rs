//! Revenue by country, by vendor group, and yearly totals

use super::normalize::parse_amount;
use super::{FilteredQuery, YearFilter, present};
use crate::db::{ConnectionManager, Connector, Record};
use crate::error::DbResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountryFilter {
    pub country: Option<String>,
    #[serde(default)]
    pub year: YearFilter,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorFilter {
    pub vendor_group: Option<String>,
    #[serde(default)]
    pub year: YearFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRevenue {
    pub country: Option<String>,
    pub year: Option<i64>,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorRevenue {
    pub vendor_group: Option<String>,
    pub year: Option<i64>,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTotal {
    pub total_revenue: f64,
}

impl From<Record<'_>> for CountryRevenue {
    fn from(r: Record<'_>) -> Self {
        Self {
            country: r.value("country").as_label(),
            year: r.value("year").as_i64(),
            revenue: parse_amount(r.value("revenue")),
        }
    }
}

impl From<Record<'_>> for VendorRevenue {
    fn from(r: Record<'_>) -> Self {
        Self {
            vendor_group: r.value("vendor_group").as_label(),
            year: r.value("year").as_i64(),
            revenue: parse_amount(r.value("revenue")),
        }
    }
}

pub async fn by_country<C: Connector>(
    db: &ConnectionManager<C>,
    filter: &CountryFilter,
) -> DbResult<Vec<CountryRevenue>> {
    let results = FilteredQuery::new(
        "SELECT country, year, revenue FROM revenue_by_country_year WHERE 1=1",
    )
    .filter("country", present(&filter.country))
    .year("year", filter.year)
    .run(db)
    .await?;
    Ok(results.records().map(CountryRevenue::from).collect())
}

pub async fn by_vendor<C: Connector>(
    db: &ConnectionManager<C>,
    filter: &VendorFilter,
) -> DbResult<Vec<VendorRevenue>> {
    let results = FilteredQuery::new(
        "SELECT vendor_group, year, revenue FROM revenue_by_vendor_year WHERE 1=1",
    )
    .filter("vendor_group", present(&filter.vendor_group))
    .year("year", filter.year)
    .run(db)
    .await?;
    Ok(results.records().map(VendorRevenue::from).collect())
}

/// Sum of country revenue for one year, or for every year
pub async fn total<C: Connector>(db: &ConnectionManager<C>, year: YearFilter) -> DbResult<RevenueTotal> {
    let results = FilteredQuery::new("SELECT year, revenue FROM revenue_by_country_year WHERE 1=1")
        .year("year", year)
        .run(db)
        .await?;
    let total_revenue = results
        .records()
        .map(|r| parse_amount(r.value("revenue")))
        .sum();
    Ok(RevenueTotal { total_revenue })
}

pub async fn years<C: Connector>(db: &ConnectionManager<C>) -> DbResult<Vec<Value>> {
    let results = db
        .execute_query(
            "SELECT DISTINCT year FROM revenue_by_country_year ORDER BY year",
            &[],
        )
        .await?;
    Ok(results.to_json())
}

pub async fn countries<C: Connector>(db: &ConnectionManager<C>) -> DbResult<Vec<Value>> {
    let results = db
        .execute_query(
            "SELECT DISTINCT country FROM revenue_by_country_year ORDER BY country",
            &[],
        )
        .await?;
    Ok(results.to_json())
}
