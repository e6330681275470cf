//! Common test utilities and helpers
//!
//! An in-memory [`Connector`]/[`Pool`] pair with call counters, scripted
//! connection failures, and canned query results.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use salesboard::db::{CellValue, Connector, Pool, QueryResults, SqlParam};
use salesboard::error::{DbError, DbResult};

type Responder = Arc<dyn Fn(&str, &[SqlParam]) -> DbResult<QueryResults> + Send + Sync>;

/// One query as seen by the pool
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Connector whose `open` fails a scripted number of times
#[derive(Clone)]
pub struct MockConnector {
    calls: Arc<AtomicU32>,
    failures_left: Arc<AtomicU32>,
    open_delay: Duration,
    responder: Responder,
    log: Arc<Mutex<Vec<RecordedQuery>>>,
}

impl MockConnector {
    /// Opens successfully on the first attempt; every query returns no rows
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures_left: Arc::new(AtomicU32::new(0)),
            open_delay: Duration::ZERO,
            responder: Arc::new(|_, _| Ok(QueryResults::empty())),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the next `n` attempts, then succeed
    pub fn failing(self, n: u32) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every attempt until [`Self::heal`] is called
    pub fn always_failing(self) -> Self {
        self.failing(u32::MAX)
    }

    /// Each `open` takes this long before resolving
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Answer every query with `f`
    pub fn responding<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &[SqlParam]) -> DbResult<QueryResults> + Send + Sync + 'static,
    {
        self.responder = Arc::new(f);
        self
    }

    /// Answer every query with the same rows
    pub fn returning(self, results: QueryResults) -> Self {
        self.responding(move |_, _| Ok(results.clone()))
    }

    pub fn heal(&self) {
        self.failures_left.store(0, Ordering::SeqCst);
    }

    /// Number of `open` calls so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.log.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> RecordedQuery {
        self.queries().pop().expect("no query was executed")
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// Pool handed out by [`MockConnector`]; `id` is the attempt that created it
#[derive(Clone)]
pub struct MockPool {
    pub id: u32,
    connected: Arc<AtomicBool>,
    responder: Responder,
    log: Arc<Mutex<Vec<RecordedQuery>>>,
}

impl MockPool {
    /// Make this pool (and every clone of it) report itself closed
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for MockPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPool").field("id", &self.id).finish()
    }
}

impl Pool for MockPool {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryResults> {
        self.log.lock().unwrap().push(RecordedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        (self.responder)(sql, params)
    }
}

impl Connector for MockConnector {
    type Pool = MockPool;

    async fn open(&self) -> DbResult<MockPool> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                u32::MAX => Some(u32::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if failing {
            return Err(DbError::ConnectionFailed(format!(
                "attempt {} refused",
                attempt
            )));
        }

        Ok(MockPool {
            id: attempt,
            connected: Arc::new(AtomicBool::new(true)),
            responder: Arc::clone(&self.responder),
            log: Arc::clone(&self.log),
        })
    }
}

/// Shorthand for a text cell
pub fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

/// Build an in-memory result set
pub fn rows(columns: &[&str], values: Vec<Vec<CellValue>>) -> QueryResults {
    QueryResults::from_values(columns, values)
}
