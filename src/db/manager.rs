//! Lazily initialized, shared connection pool
//!
//! [`ConnectionManager`] hands out one pool to every caller. The pool is
//! opened on first use; callers that arrive while it is being opened wait
//! on the same attempt instead of starting their own. The attempt runs as
//! its own task, so it finishes and records its outcome even when every
//! caller has gone away.
//!
//! ```text
//!   Empty ──get_connection──▶ Initializing ──ok──▶ Ready
//!     ▲                           │
//!     └──────── exhausted ────────┘
//! ```

use crate::db::params::SqlParam;
use crate::db::provider::{Connector, Pool};
use crate::db::retry::{RetryPolicy, open_with_retry};
use crate::db::types::QueryResults;
use crate::error::{DbError, DbResult};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

type InitFuture<P> = Shared<BoxFuture<'static, DbResult<P>>>;

/// Observable pool state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    Empty,
    Initializing,
    Ready,
}

enum PoolState<P> {
    Empty,
    Initializing { generation: u64, init: InitFuture<P> },
    Ready(P),
}

struct Inner<P> {
    state: PoolState<P>,
    /// Bumped for every initialization sequence
    generation: u64,
}

/// Owns the process-wide pool for one database endpoint.
///
/// Construct once and share it (`Arc`) with everything that queries.
pub struct ConnectionManager<C: Connector> {
    connector: Arc<C>,
    policy: RetryPolicy,
    inner: Arc<Mutex<Inner<C::Pool>>>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager; no connection is attempted until first use
    pub fn new(connector: C, policy: RetryPolicy) -> Self {
        Self {
            connector: Arc::new(connector),
            policy,
            inner: Arc::new(Mutex::new(Inner {
                state: PoolState::Empty,
                generation: 0,
            })),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn status(&self) -> PoolStatus {
        match self.lock().state {
            PoolState::Empty => PoolStatus::Empty,
            PoolState::Initializing { .. } => PoolStatus::Initializing,
            PoolState::Ready(_) => PoolStatus::Ready,
        }
    }

    /// Get the connected pool, opening it if needed.
    ///
    /// Every caller that arrives while an initialization is in flight gets
    /// that initialization's outcome. A terminal failure leaves the manager
    /// empty, so the next call starts over with a full retry budget.
    pub async fn get_connection(&self) -> DbResult<C::Pool> {
        let init = {
            let mut inner = self.lock();
            match &inner.state {
                PoolState::Ready(pool) if pool.is_connected() => return Ok(pool.clone()),
                PoolState::Initializing { generation, init } => {
                    tracing::debug!(generation, "Joining in-flight pool initialization");
                    init.clone()
                }
                PoolState::Ready(_) | PoolState::Empty => {
                    if matches!(inner.state, PoolState::Ready(_)) {
                        tracing::warn!("Pool reports disconnected, opening a new one");
                    }
                    inner.generation += 1;
                    let generation = inner.generation;
                    let init = self.start_init(generation);
                    inner.state = PoolState::Initializing {
                        generation,
                        init: init.clone(),
                    };
                    init
                }
            }
        };

        init.await
    }

    /// Run a query with `@paramN` placeholders on the shared pool.
    ///
    /// Connection failures propagate as returned by [`Self::get_connection`];
    /// query failures are not retried.
    pub async fn execute_query(&self, query: &str, params: &[SqlParam]) -> DbResult<QueryResults> {
        let pool = self.get_connection().await?;

        tracing::debug!(sql = %compact(query), params = params.len(), "Executing query");
        let start = Instant::now();
        match pool.execute(query, params).await {
            Ok(results) => {
                tracing::debug!(
                    rows = results.row_count,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Query finished"
                );
                Ok(results)
            }
            Err(err) => {
                tracing::error!(error = %err, sql = %compact(query), "Query failed");
                Err(err)
            }
        }
    }

    /// Spawn the retry sequence for `generation`.
    ///
    /// The task writes its own outcome back, so state settles even if no
    /// caller is left awaiting it.
    fn start_init(&self, generation: u64) -> InitFuture<C::Pool> {
        let connector = Arc::clone(&self.connector);
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;

        let task = tokio::spawn(async move {
            let outcome = open_with_retry(connector.as_ref(), policy).await;
            settle(&inner, generation, &outcome);
            outcome
        });

        let inner = Arc::clone(&self.inner);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome = Err(DbError::ConnectionFailed(format!(
                        "Pool initialization task failed: {}",
                        e
                    )));
                    settle(&inner, generation, &outcome);
                    outcome
                }
            }
        }
        .boxed()
        .shared()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<C::Pool>> {
        lock_inner(&self.inner)
    }
}

fn lock_inner<P>(inner: &Mutex<Inner<P>>) -> MutexGuard<'_, Inner<P>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record the outcome of `generation` unless a newer sequence replaced it
fn settle<P: Clone>(inner: &Mutex<Inner<P>>, generation: u64, outcome: &DbResult<P>) {
    let mut inner = lock_inner(inner);
    let current = matches!(
        inner.state,
        PoolState::Initializing { generation: g, .. } if g == generation
    );
    if current {
        inner.state = match outcome {
            Ok(pool) => PoolState::Ready(pool.clone()),
            Err(_) => PoolState::Empty,
        };
    }
}

/// Collapse whitespace so multi-line queries log on one line
fn compact(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
