//! salesboard - Sales reporting API over a lazily connected PostgreSQL pool
//!
//! The service answers read-only report queries (revenue, salesperson
//! performance, order reasons, objectives) over HTTP. All queries go
//! through one [`db::ConnectionManager`], which opens the pool on first
//! use, retries failed connection attempts, and lets concurrent callers
//! share a single in-flight initialization.
//!
//! # Architecture
//!
//! - [`config`]: Database environment variables and server settings
//! - [`db`]: Connection manager, retry policy, driver seam, PostgreSQL pool
//! - [`reports`]: One parameterized query per report, plus normalization
//! - [`api`]: axum router and handlers
//! - [`error`]: Error types and result aliases
//! - [`logging`]: tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use salesboard::config::DatabaseConfig;
//! use salesboard::db::{ConnectionManager, SqlParam};
//! use salesboard::db::postgres::PgConnector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig::from_env()?;
//! let retry = config.retry;
//! let db = ConnectionManager::new(PgConnector::new(config), retry);
//!
//! // First use opens the pool (with retries); later calls reuse it
//! let results = db
//!     .execute_query("SELECT @param0::int AS answer", &[SqlParam::Int(42)])
//!     .await?;
//! println!("Got {} rows", results.row_count);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod reports;

pub use error::{ConfigError, DbError, DbResult};
