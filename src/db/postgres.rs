//! PostgreSQL database provider
//!
//! Concrete implementation using deadpool-postgres over tokio-postgres.

use crate::config::{DatabaseConfig, SslMode};
use crate::db::params::{SqlParam, rewrite_placeholders};
use crate::db::provider::{Connector, Pool};
use crate::db::types::{CellValue, ColumnDef, DataType, QueryResults, Row};
use crate::error::{DbError, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, RecyclingMethod, Runtime};
use rust_decimal::Decimal;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_postgres::types::{ToSql, Type};

/// Table definitions the reports read from
pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Opens deadpool-backed PostgreSQL pools
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: DatabaseConfig,
}

/// PostgreSQL connection pool
#[derive(Clone)]
pub struct PgPool {
    pool: deadpool_postgres::Pool,
    request_timeout: Duration,
}

impl PgConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn build_pool(&self) -> DbResult<deadpool_postgres::Pool> {
        let pg_config = self.config.pg_config();
        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match self.config.ssl_mode {
            SslMode::Disable => {
                Manager::from_config(pg_config, tokio_postgres::NoTls, manager_config)
            }
            SslMode::Prefer | SslMode::Require => {
                let tls_config = make_tls_config(self.config.trust_server_certificate)?;
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
                Manager::from_config(pg_config, tls, manager_config)
            }
        };

        let timeout = Some(self.config.connect_timeout);
        deadpool_postgres::Pool::builder(manager)
            .max_size(self.config.pool_max)
            .runtime(Runtime::Tokio1)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .build()
            .map_err(|e| DbError::ConnectionFailed(format!("Pool setup failed: {}", e)))
    }

    /// Run a multi-statement SQL script on one connection, outside any pool
    /// the service keeps.
    pub async fn run_script(&self, script: &str) -> DbResult<()> {
        tracing::info!(endpoint = %self.config.endpoint(), bytes = script.len(), "Running SQL script");

        let pool = self.build_pool()?;
        let result = async {
            let client = pool
                .get()
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            client.batch_execute(script).await.map_err(query_error)
        }
        .await;
        pool.close();
        result
    }
}

impl Connector for PgConnector {
    type Pool = PgPool;

    /// Build the pool, prove it can connect, and warm it to `pool_min`.
    async fn open(&self) -> DbResult<PgPool> {
        tracing::debug!(
            endpoint = %self.config.endpoint(),
            ssl_mode = self.config.ssl_mode.as_str(),
            trust_server_certificate = self.config.trust_server_certificate,
            pool_max = self.config.pool_max,
            pool_min = self.config.pool_min,
            "Opening PostgreSQL pool"
        );

        let pool = self.build_pool()?;

        let mut warm = Vec::with_capacity(self.config.pool_min.max(1));
        for _ in 0..self.config.pool_min.max(1) {
            let client = pool
                .get()
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            warm.push(client);
        }
        drop(warm);

        if let Some(idle) = self.config.pool_idle_timeout {
            spawn_idle_reaper(pool.clone(), idle, self.config.pool_min);
        }

        Ok(PgPool {
            pool,
            request_timeout: self.config.request_timeout,
        })
    }
}

impl std::fmt::Debug for PgPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPool")
            .field("size", &self.size())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl PgPool {
    /// Pool occupancy, for diagnostics
    pub fn size(&self) -> usize {
        self.pool.status().size
    }

    async fn run(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryResults> {
        let start = Instant::now();

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DbError::QueryFailed(format!("No usable connection: {}", e)))?;

        let stmt = client.prepare_cached(sql).await.map_err(query_error)?;

        let columns: Vec<ColumnDef> = stmt
            .columns()
            .iter()
            .map(|col| ColumnDef {
                name: col.name().to_string(),
                data_type: pg_type_to_datatype(col.type_()),
            })
            .collect();

        let bind: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let pg_rows = client.query(&stmt, &bind).await.map_err(query_error)?;

        let rows = pg_rows
            .iter()
            .map(|pg_row| Row {
                values: columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| extract_cell_value(pg_row, i, &col.data_type))
                    .collect(),
            })
            .collect();

        Ok(QueryResults::new(columns, rows, start.elapsed()))
    }
}

impl Pool for PgPool {
    fn is_connected(&self) -> bool {
        !self.pool.is_closed()
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryResults> {
        let sql = rewrite_placeholders(sql, params.len())?;
        let timeout = self.request_timeout;
        tokio::time::timeout(timeout, self.run(&sql, params))
            .await
            .map_err(|_| DbError::Timeout(timeout))?
    }
}

/// Periodically drop connections idle longer than `idle`, keeping `min`
fn spawn_idle_reaper(pool: deadpool_postgres::Pool, idle: Duration, min: usize) {
    let period = (idle / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if pool.is_closed() {
                break;
            }
            let kept = Cell::new(0usize);
            let result = pool.retain(|_, metrics| {
                if metrics.last_used() < idle || kept.get() < min {
                    kept.set(kept.get() + 1);
                    true
                } else {
                    false
                }
            });
            if !result.removed.is_empty() {
                tracing::debug!(removed = result.removed.len(), "Closed idle connections");
            }
        }
    });
}

fn query_error(e: tokio_postgres::Error) -> DbError {
    match e.as_db_error() {
        Some(db) => DbError::QueryFailed(format!("{} ({})", db.message(), db.code().code())),
        None => DbError::QueryFailed(e.to_string()),
    }
}

/// Build a rustls ClientConfig.
///
/// With `trust_server_certificate` the chain is accepted as-is (handshake
/// signatures are still checked); otherwise OS certificates are trusted,
/// with Mozilla roots as fallback.
fn make_tls_config(trust_server_certificate: bool) -> DbResult<rustls::ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| DbError::ConnectionFailed(format!("TLS setup failed: {}", e)))?;

    if trust_server_certificate {
        return Ok(builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
            .with_no_client_auth());
    }

    let mut root_store = rustls::RootCertStore::empty();
    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    Ok(builder
        .with_root_certificates(root_store)
        .with_no_client_auth())
}

#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Map tokio_postgres Type to our DataType enum
fn pg_type_to_datatype(pg_type: &Type) -> DataType {
    match *pg_type {
        Type::INT2 => DataType::SmallInt,
        Type::INT4 => DataType::Integer,
        Type::INT8 => DataType::BigInt,
        Type::FLOAT4 => DataType::Real,
        Type::FLOAT8 => DataType::Double,
        Type::NUMERIC => DataType::Numeric,
        Type::TEXT | Type::NAME | Type::VARCHAR | Type::CHAR | Type::BPCHAR => DataType::Text,
        Type::BOOL => DataType::Boolean,
        _ => DataType::Unknown(pg_type.name().to_string()),
    }
}

/// Extract a cell value from a tokio_postgres Row based on the column's DataType.
///
/// Falls back to the string representation when the typed read fails.
fn extract_cell_value(row: &tokio_postgres::Row, idx: usize, data_type: &DataType) -> CellValue {
    match data_type {
        DataType::SmallInt => match row.try_get::<_, Option<i16>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v as i64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        DataType::Integer => match row.try_get::<_, Option<i32>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v as i64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        DataType::BigInt => match row.try_get::<_, Option<i64>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        DataType::Real => match row.try_get::<_, Option<f32>>(idx) {
            Ok(Some(v)) => CellValue::Float(v as f64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        DataType::Double => match row.try_get::<_, Option<f64>>(idx) {
            Ok(Some(v)) => CellValue::Float(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        // decimal text so amounts keep their precision
        DataType::Numeric => match row.try_get::<_, Option<Decimal>>(idx) {
            Ok(Some(v)) => CellValue::Text(v.to_string()),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        DataType::Boolean => match row.try_get::<_, Option<bool>>(idx) {
            Ok(Some(v)) => CellValue::Boolean(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        DataType::Text | DataType::Unknown(_) => try_as_string(row, idx),
    }
}

/// Try to extract a value as a string (fallback for type mismatches).
fn try_as_string(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => CellValue::Text(v),
        Ok(None) => CellValue::Null,
        Err(_) => {
            let type_name = row
                .columns()
                .get(idx)
                .map_or("unknown", |c| c.type_().name());
            CellValue::Text(format!("<unsupported type: {}>", type_name))
        }
    }
}
