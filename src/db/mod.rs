//! Database access layer
//!
//! This module provides a trait-based abstraction over the database driver,
//! a connection manager that owns the shared pool, and the PostgreSQL
//! implementation.

pub mod manager;
pub mod params;
pub mod postgres;
pub mod provider;
pub mod retry;
pub mod types;

// Re-export main types
pub use manager::{ConnectionManager, PoolStatus};
pub use params::SqlParam;
pub use provider::{Connector, Pool};
pub use retry::RetryPolicy;
pub use types::{CellValue, ColumnDef, DataType, QueryResults, Record, Row};
