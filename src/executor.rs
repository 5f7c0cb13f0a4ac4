//! Query execution for PgQ calls.
//!
//! ## What
//!
//! - [`Resolver`] converts a fetched result set into one typed output value.
//! - [`QueryExecutor`] is the runtime-selectable executor: direct execution
//!   on the shared pool, or one serialized transaction per call.
//!
//! ## How
//!
//! The facades bind a fixed SQL statement and argument list to
//! [`QueryExecutor::fetch`] (or the [`QueryExecutor::fetch_int`] convenience)
//! and pick the resolver matching the statement's result shape. In
//! transactional mode a call acquires the executor's single transaction
//! slot, begins a transaction it owns for the duration of the call, and
//! commits on success or rolls back on any query or resolver error. The
//! transaction handle never escapes the call.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};

/// Converts a fetched result set into one typed output value.
///
/// A resolver consumes the whole result set and returns either the resolved
/// value or an error. Resolver errors are treated exactly like query errors:
/// in transactional mode they trigger a rollback.
pub(crate) trait Resolver {
    type Output;

    fn resolve(&self, rows: Vec<PgRow>) -> Result<Self::Output>;
}

pub(crate) fn scan_error(e: sqlx::Error) -> Error {
    Error::Scan {
        message: e.to_string(),
    }
}

/// Resolver for single-integer results.
///
/// Scans the first column of every row, keeping the last value. Zero rows
/// yield 0 with no error; a NULL or non-integer column is a scan error.
#[derive(Debug, Default)]
pub(crate) struct IntResolver;

impl Resolver for IntResolver {
    type Output = i64;

    fn resolve(&self, rows: Vec<PgRow>) -> Result<i64> {
        let mut result = 0;
        for row in rows {
            result = row.try_get(0).map_err(scan_error)?;
        }
        Ok(result)
    }
}

fn query_error(e: sqlx::Error, query: &str, context: &str) -> Error {
    Error::QueryFailed {
        source: Box::new(e),
        query: query.to_string(),
        context: context.to_string(),
    }
}

/// Direct executor over the shared connection pool.
///
/// Concurrent calls may run in parallel; no locking beyond what the driver
/// provides.
#[derive(Debug, Clone)]
pub(crate) struct SimpleExecutor {
    pool: PgPool,
}

impl SimpleExecutor {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch<R: Resolver>(
        &self,
        resolver: &R,
        query: &str,
        args: &[&str],
    ) -> Result<R::Output> {
        tracing::debug!("Executing query: {}", query);
        let mut q = sqlx::query(query);
        for arg in args {
            q = q.bind(*arg);
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(e, query, "query execution failed"))?;
        resolver.resolve(rows)
    }
}

/// State of the transactional executor's single transaction slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Idle,
    InTransaction,
}

/// Single transaction slot for [`TxExecutor`].
///
/// The slot is either `Idle` or `InTransaction`. Holding the permit returned
/// by [`TxSlot::acquire`] is the exclusive right to open one transaction;
/// dropping the permit restores `Idle`, so no exit path can leak the
/// in-transaction state.
#[derive(Debug)]
struct TxSlot {
    state: Mutex<TxState>,
}

impl TxSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(TxState::Idle),
        }
    }

    async fn acquire(&self) -> TxPermit<'_> {
        TxPermit {
            state: self.state.lock().await,
        }
    }

    #[cfg(test)]
    fn try_state(&self) -> Option<TxState> {
        self.state.try_lock().ok().map(|guard| *guard)
    }
}

struct TxPermit<'a> {
    state: MutexGuard<'a, TxState>,
}

impl TxPermit<'_> {
    fn begin(&mut self) {
        *self.state = TxState::InTransaction;
    }
}

impl Drop for TxPermit<'_> {
    fn drop(&mut self) {
        *self.state = TxState::Idle;
    }
}

/// Transactional executor: one serialized transaction per call.
///
/// All calls are serialized through the slot regardless of which queue or
/// consumer they target. This trades throughput for correctness: the
/// executor has exactly one transaction slot, so no two calls may interleave.
#[derive(Debug)]
pub(crate) struct TxExecutor {
    pool: PgPool,
    slot: TxSlot,
}

impl TxExecutor {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self {
            pool,
            slot: TxSlot::new(),
        }
    }

    async fn fetch<R: Resolver>(
        &self,
        resolver: &R,
        query: &str,
        args: &[&str],
    ) -> Result<R::Output> {
        let mut permit = self.slot.acquire().await;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::TransactionFailed {
                source: Box::new(e),
                context: "failed to begin transaction".into(),
            })?;
        permit.begin();

        tracing::debug!("Executing query in transaction: {}", query);
        let mut q = sqlx::query(query);
        for arg in args {
            q = q.bind(*arg);
        }

        let resolved = match q.fetch_all(&mut *tx).await {
            Ok(rows) => resolver.resolve(rows),
            Err(e) => Err(query_error(e, query, "query execution failed in transaction")),
        };

        match resolved {
            Ok(value) => {
                tx.commit().await.map_err(|e| Error::TransactionFailed {
                    source: Box::new(e),
                    context: "failed to commit transaction".into(),
                })?;
                Ok(value)
            }
            Err(cause) => {
                if let Err(e) = tx.rollback().await {
                    tracing::warn!("Rollback failed after query error: {}", e);
                    return Err(Error::RollbackFailed {
                        source: Box::new(e),
                        cause: Box::new(cause),
                    });
                }
                Err(cause)
            }
        }
    }
}

/// Runtime-selectable query executor.
///
/// Wraps the two execution modes and provides a unified fetch interface so a
/// client can swap modes after construction without reconnecting.
#[derive(Debug)]
pub(crate) enum QueryExecutor {
    /// Direct execution on the shared pool
    Simple(SimpleExecutor),
    /// One serialized transaction per call
    Tx(TxExecutor),
}

impl QueryExecutor {
    pub(crate) fn new(pool: PgPool, transactional: bool) -> Self {
        if transactional {
            QueryExecutor::Tx(TxExecutor::new(pool))
        } else {
            QueryExecutor::Simple(SimpleExecutor::new(pool))
        }
    }

    /// The shared database handle both modes execute against.
    pub(crate) fn pool(&self) -> &PgPool {
        match self {
            QueryExecutor::Simple(e) => &e.pool,
            QueryExecutor::Tx(e) => &e.pool,
        }
    }

    pub(crate) async fn fetch<R: Resolver>(
        &self,
        resolver: &R,
        query: &str,
        args: &[&str],
    ) -> Result<R::Output> {
        match self {
            QueryExecutor::Simple(e) => e.fetch(resolver, query, args).await,
            QueryExecutor::Tx(e) => e.fetch(resolver, query, args).await,
        }
    }

    /// Convenience for the single-integer result shape shared by most PgQ
    /// calls.
    pub(crate) async fn fetch_int(&self, query: &str, args: &[&str]) -> Result<i64> {
        self.fetch(&IntResolver, query, args).await
    }
}
