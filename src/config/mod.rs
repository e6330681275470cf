//! Configuration management
//!
//! Handles database connection settings and HTTP server settings.

pub mod database;
pub mod settings;

pub use database::{DatabaseConfig, SslMode};
pub use settings::{Settings, load_settings};
