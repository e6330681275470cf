//! Database type definitions
//!
//! Core data structures for representing query results, data types,
//! and values.

use serde_json::{Map, Value};
use std::time::Duration;

/// Query execution results
#[derive(Debug, Clone)]
pub struct QueryResults {
    /// Column definitions
    pub columns: Vec<ColumnDef>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Query execution time
    pub execution_time: Duration,
    /// Total row count
    pub row_count: usize,
}

/// Column definition in query results
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
}

/// Database data types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    // Integer types
    SmallInt,
    Integer,
    BigInt,

    // Floating point
    Real,
    Double,
    Numeric,

    // Text, varchar, char
    Text,

    Boolean,

    /// Anything else, read back as text
    Unknown(String),
}

/// A single row of query results
#[derive(Debug, Clone)]
pub struct Row {
    /// Cell values in column order
    pub values: Vec<CellValue>,
}

/// A cell value (single column value in a row)
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// NULL value
    Null,

    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// Text/string value; NUMERIC columns arrive here as decimal text
    Text(String),

    /// Boolean value
    Boolean(bool),
}

/// Borrowed view of one row with by-name column access
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [ColumnDef],
    row: &'a Row,
}

impl QueryResults {
    pub fn new(columns: Vec<ColumnDef>, rows: Vec<Row>, execution_time: Duration) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            execution_time,
            row_count,
        }
    }

    /// Result with no columns and no rows
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Duration::ZERO)
    }

    /// Build results from column names and row values.
    ///
    /// Column types are reported as `Unknown`; handy for in-memory pools.
    pub fn from_values(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let columns = columns
            .iter()
            .map(|name| ColumnDef {
                name: name.to_string(),
                data_type: DataType::Unknown("memory".to_string()),
            })
            .collect();
        let rows = rows.into_iter().map(|values| Row { values }).collect();
        Self::new(columns, rows, Duration::ZERO)
    }

    /// Iterate rows with by-name access
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|row| Record {
            columns: &self.columns,
            row,
        })
    }

    /// Rows as JSON objects keyed by column name, in column order
    pub fn to_json(&self) -> Vec<Value> {
        self.records().map(|r| Value::Object(r.to_json())).collect()
    }
}

impl<'a> Record<'a> {
    /// Value of the named column, `None` if no such column
    pub fn get(&self, name: &str) -> Option<&'a CellValue> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .and_then(|i| self.row.values.get(i))
    }

    /// Value of the named column, NULL when missing
    pub fn value(&self, name: &str) -> &'a CellValue {
        const NULL: &CellValue = &CellValue::Null;
        self.get(name).unwrap_or(NULL)
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .zip(&self.row.values)
            .map(|(col, val)| (col.name.clone(), val.to_json()))
            .collect()
    }
}

impl CellValue {
    /// Convert to a JSON value; non-finite floats become `null`
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Integer(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Boolean(b) => Value::Bool(*b),
        }
    }

    /// Text or integer content as a string, for label-like columns
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Integer content, parsing text if needed
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
