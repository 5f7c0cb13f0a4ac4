//! Core types for pgq-client: queue metadata and its row resolver.
//!
//! ## What
//!
//! - [`QueueInfo`] is a read-only snapshot of queue metadata as reported by
//!   `pgq.get_queue_info`.
//! - [`QueueInfoResolver`] translates the five-column result row into a
//!   [`QueueInfo`] value.
//!
//! ## How
//!
//! [`QueueInfo`] values are recreated fresh on every fetch; they carry no
//! identity beyond the queue name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::fmt;

use crate::error::Result;
use crate::executor::{scan_error, Resolver};

/// Metadata snapshot for one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    /// Name of the queue
    pub queue_name: String,
    /// Time of the queue's next event-table switch
    pub switch_time: DateTime<Utc>,
    /// Rotation period of the queue's event tables, in seconds
    pub rotation_period_secs: i64,
    /// Maximum ticker lag for the queue, in seconds
    pub ticker_max_lag_secs: i64,
    /// Id of the last tick generated for the queue
    pub last_tick_id: i64,
}

impl Default for QueueInfo {
    fn default() -> Self {
        Self {
            queue_name: String::new(),
            switch_time: DateTime::UNIX_EPOCH,
            rotation_period_secs: 0,
            ticker_max_lag_secs: 0,
            last_tick_id: 0,
        }
    }
}

impl fmt::Display for QueueInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueueInfo {{ queue_name: {}, switch_time: {}, rotation_period_secs: {}, ticker_max_lag_secs: {}, last_tick_id: {} }}",
            self.queue_name,
            self.switch_time,
            self.rotation_period_secs,
            self.ticker_max_lag_secs,
            self.last_tick_id
        )
    }
}

/// Resolver for the five-column `get_queue_info` row shape.
///
/// Scans positionally, keeping the last row. Zero rows yield
/// [`QueueInfo::default`] with no error: the extension reports a missing
/// queue through the query itself, so an empty result is a pass-through
/// default rather than a not-found signal.
#[derive(Debug, Default)]
pub(crate) struct QueueInfoResolver;

impl Resolver for QueueInfoResolver {
    type Output = QueueInfo;

    fn resolve(&self, rows: Vec<PgRow>) -> Result<QueueInfo> {
        let mut info = QueueInfo::default();
        for row in rows {
            info = QueueInfo {
                queue_name: row.try_get(0).map_err(scan_error)?,
                switch_time: row.try_get(1).map_err(scan_error)?,
                rotation_period_secs: row.try_get(2).map_err(scan_error)?,
                ticker_max_lag_secs: row.try_get(3).map_err(scan_error)?,
                last_tick_id: row.try_get(4).map_err(scan_error)?,
            };
        }
        Ok(info)
    }
}
