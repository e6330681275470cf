//! Sales objectives: completion, year-end projection, and evolution

use super::normalize::parse_amount;
use super::{FilteredQuery, YearFilter, present, salesperson_name_sql};
use crate::db::{ConnectionManager, Connector, Record};
use crate::error::DbResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectiveFilter {
    #[serde(default)]
    pub year: YearFilter,
    pub vendor_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveRow {
    pub year: Option<i64>,
    pub vendor_group: Option<String>,
    pub salesperson_name: Option<String>,
    pub objective: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRow {
    #[serde(flatten)]
    pub objective: ObjectiveRow,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Projection {
    Estimate {
        revenue: f64,
        objective: f64,
        projected_revenue: f64,
        salesperson_name: Option<String>,
    },
    Unavailable {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotals {
    pub year: i64,
    pub revenue_total: f64,
    pub objective_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Evolution {
    /// One vendor group, year by year
    Group(Vec<ObjectiveRow>),
    /// All vendor groups summed per year
    Totals(Vec<YearTotals>),
}

impl From<Record<'_>> for ObjectiveRow {
    fn from(r: Record<'_>) -> Self {
        Self {
            year: r.value("year").as_i64(),
            vendor_group: r.value("vendor_group").as_label(),
            salesperson_name: r.value("salesperson_name").as_label(),
            objective: parse_amount(r.value("objective")),
            revenue: parse_amount(r.value("revenue")),
        }
    }
}

/// Percentage of the objective reached.
///
/// A zero objective yields 0. A negative objective (a reduction target) is
/// inverted: reaching `|objective|` in revenue means 0%.
pub fn completion_rate(revenue: f64, objective: f64) -> f64 {
    if objective == 0.0 {
        0.0
    } else if objective < 0.0 {
        (1.0 - revenue / objective.abs()) * 100.0
    } else {
        revenue / objective * 100.0
    }
}

/// Linear year-end extrapolation from revenue booked through `month` (1-12)
pub fn project_revenue(revenue: f64, month: u32) -> f64 {
    revenue / f64::from(month.clamp(1, 12)) * 12.0
}

fn objectives_query() -> String {
    format!(
        "SELECT o.year, o.vendor_group, {}, o.objective, o.revenue \
         FROM sales_objectives o \
         LEFT JOIN salespeople s ON o.vendor_group = s.vendor_group \
         WHERE 1=1",
        salesperson_name_sql("o.vendor_group")
    )
}

pub async fn list<C: Connector>(
    db: &ConnectionManager<C>,
    filter: &ObjectiveFilter,
) -> DbResult<Vec<ObjectiveRow>> {
    let results = FilteredQuery::new(&objectives_query())
        .year("o.year", filter.year)
        .filter("o.vendor_group", present(&filter.vendor_group))
        .run(db)
        .await?;
    Ok(results.records().map(ObjectiveRow::from).collect())
}

pub async fn completion<C: Connector>(
    db: &ConnectionManager<C>,
    filter: &ObjectiveFilter,
) -> DbResult<Vec<CompletionRow>> {
    let rows = list(db, filter).await?;
    Ok(rows
        .into_iter()
        .map(|objective| CompletionRow {
            completion_rate: completion_rate(objective.revenue, objective.objective),
            objective,
        })
        .collect())
}

/// Year-end revenue projection for one vendor group.
///
/// `month` is the current month (1-12); revenue so far is extrapolated
/// linearly to twelve months.
pub async fn projection<C: Connector>(
    db: &ConnectionManager<C>,
    vendor_group: &str,
    year: YearFilter,
    month: u32,
) -> DbResult<Projection> {
    let Some(year) = year.year() else {
        return Ok(Projection::Unavailable {
            message: "A projection needs a specific year".to_string(),
        });
    };

    let sql = format!(
        "SELECT o.revenue, o.objective, {} \
         FROM sales_objectives o \
         LEFT JOIN salespeople s ON o.vendor_group = s.vendor_group \
         WHERE o.vendor_group = @param0 AND o.year = @param1",
        salesperson_name_sql("o.vendor_group")
    );
    let results = db
        .execute_query(&sql, &[vendor_group.into(), year.into()])
        .await?;

    let Some(row) = results.records().next() else {
        return Ok(Projection::Unavailable {
            message: "No data available for this projection".to_string(),
        });
    };

    let revenue = parse_amount(row.value("revenue"));
    Ok(Projection::Estimate {
        revenue,
        objective: parse_amount(row.value("objective")),
        projected_revenue: project_revenue(revenue, month),
        salesperson_name: row.value("salesperson_name").as_label(),
    })
}

/// Objectives and revenue over the years, for one group or all groups summed
pub async fn evolution<C: Connector>(
    db: &ConnectionManager<C>,
    vendor_group: Option<&str>,
) -> DbResult<Evolution> {
    let vendor_group = vendor_group.filter(|g| !g.trim().is_empty());
    let results = FilteredQuery::new(&objectives_query())
        .filter("o.vendor_group", vendor_group)
        .order_by("o.year")
        .run(db)
        .await?;
    let rows = results.records().map(ObjectiveRow::from);

    if vendor_group.is_some() {
        return Ok(Evolution::Group(rows.collect()));
    }

    let mut totals: BTreeMap<i64, YearTotals> = BTreeMap::new();
    for row in rows {
        let Some(year) = row.year else { continue };
        let entry = totals.entry(year).or_insert(YearTotals {
            year,
            revenue_total: 0.0,
            objective_total: 0.0,
        });
        entry.revenue_total += row.revenue;
        entry.objective_total += row.objective;
    }
    Ok(Evolution::Totals(totals.into_values().collect()))
}
