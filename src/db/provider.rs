//! Database driver traits
//!
//! Defines the seam between the connection manager and a concrete driver.
//! This abstraction allows for:
//! - Swapping the PostgreSQL backend for in-memory pools in tests
//! - Counting and scripting connection attempts
//! - Consistent error handling

use crate::db::params::SqlParam;
use crate::db::types::QueryResults;
use crate::error::DbResult;
use std::future::Future;

/// A live connection pool handle.
///
/// Handles are cheap to clone and all clones refer to the same pool.
pub trait Pool: Clone + Send + Sync + 'static {
    /// Whether the pool is still usable.
    ///
    /// This must not perform I/O; the connection manager calls it on every
    /// request.
    fn is_connected(&self) -> bool;

    /// Execute a query and return its rows
    ///
    /// # Arguments
    /// * `sql` - Query text with `@param0`, `@param1`, ... placeholders
    /// * `params` - Values, `params[i]` binds to `@param{i}`
    ///
    /// # Errors
    /// Returns `DbError::QueryFailed` if execution fails,
    /// `DbError::Binding` if placeholders and values do not match,
    /// `DbError::Timeout` if the request timeout elapses
    fn execute(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> impl Future<Output = DbResult<QueryResults>> + Send;
}

/// Opens new pools against a configured endpoint
pub trait Connector: Send + Sync + 'static {
    type Pool: Pool;

    /// Open a pool and verify it can reach the database
    ///
    /// # Errors
    /// Returns `DbError::ConnectionFailed` if the database is unreachable
    fn open(&self) -> impl Future<Output = DbResult<Self::Pool>> + Send;
}
