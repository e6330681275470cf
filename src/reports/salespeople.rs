//! Salesperson order share, success rate and conversion times

use super::{FilteredQuery, YearFilter, present, salesperson_name_sql};
use crate::db::{ConnectionManager, Connector};
use crate::error::DbResult;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalespersonFilter {
    pub salesperson: Option<String>,
    #[serde(default)]
    pub year: YearFilter,
}

/// Share of offers turned into orders, per salesperson and year
pub async fn order_share<C: Connector>(
    db: &ConnectionManager<C>,
    filter: &SalespersonFilter,
) -> DbResult<Vec<Value>> {
    let sql = format!(
        "SELECT o.salesperson, {}, o.year, o.offers, o.orders, o.order_share \
         FROM salesperson_orders o \
         LEFT JOIN salespeople s ON o.salesperson = s.vendor_group \
         WHERE 1=1",
        salesperson_name_sql("o.salesperson")
    );
    let results = FilteredQuery::new(&sql)
        .filter("o.salesperson", present(&filter.salesperson))
        .year("o.year", filter.year)
        .run(db)
        .await?;
    Ok(results.to_json())
}

/// Like [`order_share`], plus `success_rate` = orders / offers × 100
/// (NULL when there were no offers)
pub async fn success_rate<C: Connector>(
    db: &ConnectionManager<C>,
    filter: &SalespersonFilter,
) -> DbResult<Vec<Value>> {
    let sql = format!(
        "SELECT o.salesperson, {}, o.year, o.offers, o.orders, o.order_share, \
                o.orders::float8 / NULLIF(o.offers, 0) * 100 AS success_rate \
         FROM salesperson_orders o \
         LEFT JOIN salespeople s ON o.salesperson = s.vendor_group \
         WHERE 1=1",
        salesperson_name_sql("o.salesperson")
    );
    let results = FilteredQuery::new(&sql)
        .filter("o.salesperson", present(&filter.salesperson))
        .year("o.year", filter.year)
        .run(db)
        .await?;
    Ok(results.to_json())
}

/// Average offer-to-order time, busiest salespeople first
pub async fn conversion_times<C: Connector>(
    db: &ConnectionManager<C>,
    salesperson: Option<&str>,
) -> DbResult<Vec<Value>> {
    let sql = format!(
        "SELECT c.salesperson, {}, c.conversions, c.avg_conversion_days \
         FROM conversion_times c \
         LEFT JOIN salespeople s ON c.salesperson = s.vendor_group \
         WHERE 1=1",
        salesperson_name_sql("c.salesperson")
    );
    let results = FilteredQuery::new(&sql)
        .filter("c.salesperson", salesperson.filter(|s| !s.trim().is_empty()))
        .order_by("c.conversions DESC")
        .run(db)
        .await?;
    Ok(results.to_json())
}

pub async fn list<C: Connector>(db: &ConnectionManager<C>) -> DbResult<Vec<Value>> {
    let sql = format!(
        "SELECT DISTINCT o.salesperson, {} \
         FROM salesperson_orders o \
         LEFT JOIN salespeople s ON o.salesperson = s.vendor_group \
         ORDER BY o.salesperson",
        salesperson_name_sql("o.salesperson")
    );
    Ok(db.execute_query(&sql, &[]).await?.to_json())
}

pub async fn vendor_groups<C: Connector>(db: &ConnectionManager<C>) -> DbResult<Vec<Value>> {
    let sql = format!(
        "SELECT DISTINCT r.vendor_group, {} \
         FROM revenue_by_vendor_year r \
         LEFT JOIN salespeople s ON r.vendor_group = s.vendor_group \
         ORDER BY r.vendor_group",
        salesperson_name_sql("r.vendor_group")
    );
    Ok(db.execute_query(&sql, &[]).await?.to_json())
}
