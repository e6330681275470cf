//! Sales reports
//!
//! Each report is one parameterized query plus light post-processing.
//! Optional filters append `AND column = @paramN` clauses in the order they
//! are given, so parameter positions always match placeholder indexes.

pub mod normalize;
pub mod objectives;
pub mod order_reasons;
pub mod revenue;
pub mod salespeople;

use crate::db::{ConnectionManager, Connector, QueryResults, SqlParam};
use crate::error::DbResult;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Display name for a vendor group, falling back to a generated label
pub(crate) fn salesperson_name_sql(id_column: &str) -> String {
    format!(
        "COALESCE(s.name, 'Salesperson ' || {}::text) AS salesperson_name",
        id_column
    )
}

/// Year selector; `all` disables the year filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    pub fn year(&self) -> Option<i32> {
        match self {
            YearFilter::All => None,
            YearFilter::Year(y) => Some(*y),
        }
    }
}

impl FromStr for YearFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(YearFilter::All);
        }
        s.parse::<i32>()
            .map(YearFilter::Year)
            .map_err(|_| format!("year must be a number or 'all' (got '{}')", s))
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearFilter::All => write!(f, "all"),
            YearFilter::Year(y) => write!(f, "{}", y),
        }
    }
}

impl<'de> Deserialize<'de> for YearFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for YearFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Treat empty query-string values as absent
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A base query plus optional equality filters
#[derive(Debug, Clone)]
pub(crate) struct FilteredQuery {
    sql: String,
    params: Vec<SqlParam>,
}

impl FilteredQuery {
    /// `base` must already contain a `WHERE` clause
    pub fn new(base: &str) -> Self {
        Self {
            sql: base.trim_end().to_string(),
            params: Vec::new(),
        }
    }

    pub fn filter<V: Into<SqlParam>>(mut self, column: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.sql.push_str(&format!(
                " AND {} = @param{}",
                column,
                self.params.len()
            ));
            self.params.push(value.into());
        }
        self
    }

    pub fn year(self, column: &str, year: YearFilter) -> Self {
        self.filter(column, year.year())
    }

    pub fn order_by(mut self, clause: &str) -> Self {
        self.sql.push_str(" ORDER BY ");
        self.sql.push_str(clause);
        self
    }

    pub async fn run<C: Connector>(&self, db: &ConnectionManager<C>) -> DbResult<QueryResults> {
        db.execute_query(&self.sql, &self.params).await
    }

    #[cfg(test)]
    pub fn parts(&self) -> (&str, &[SqlParam]) {
        (&self.sql, &self.params)
    }
}
