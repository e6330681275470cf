//! salesboard - entry point
//!
//! Parses the command line, loads configuration, and either serves the
//! report API, runs a one-off connectivity check, or creates the tables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use salesboard::config::{DatabaseConfig, load_settings};
use salesboard::db::ConnectionManager;
use salesboard::db::postgres::{PgConnector, SCHEMA_SQL};

#[derive(Parser, Debug)]
#[command(name = "salesboard", version, about = "Sales reporting API")]
struct Cli {
    /// Debug logging (unless RUST_LOG is set)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Server settings file (default: ~/.salesboard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Listen port (overrides settings and PORT)
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
    /// Connect with retries and run a trivial query
    Check,
    /// Create the report tables
    InitDb {
        /// SQL script to run instead of the bundled schema
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    salesboard::logging::init(cli.verbose).map_err(|e| anyhow!(e))?;

    let db_config = DatabaseConfig::from_env().context("Invalid database configuration")?;
    tracing::info!(endpoint = %db_config.endpoint(), ssl = db_config.ssl_mode.as_str(), "Database configured");
    let retry = db_config.retry;
    let db = Arc::new(ConnectionManager::new(PgConnector::new(db_config), retry));

    match cli.command {
        Commands::Serve { port } => {
            let mut settings =
                load_settings(cli.config.as_deref()).context("Failed to load settings")?;
            if let Some(port) = port {
                settings.port = port;
            }
            salesboard::api::serve(db, &settings)
                .await
                .context("Server error")?;
        }
        Commands::Check => {
            let results = db
                .execute_query("SELECT 1 AS ok", &[])
                .await
                .context("Database check failed")?;
            println!(
                "Connected to {} ({} row in {} ms)",
                db.connector().config().endpoint(),
                results.row_count,
                results.execution_time.as_millis()
            );
        }
        Commands::InitDb { file } => {
            let script = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => SCHEMA_SQL.to_string(),
            };
            db.connector()
                .run_script(&script)
                .await
                .context("Schema script failed")?;
            let source = file.as_deref().map_or("bundled schema".into(), |p| p.display().to_string());
            println!("Applied {} to {}", source, db.connector().config().endpoint());
        }
    }

    Ok(())
}
