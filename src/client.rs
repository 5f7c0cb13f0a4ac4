//! Client interface for PgQ queue administration.
//!
//! This module defines the [`Client`] struct, which binds the PgQ stored
//! procedures for queue management: creating queues, registering and
//! unregistering consumers, fetching batches, and reading queue metadata.
//!
//! ## What
//!
//! - [`Client`] exposes one method per PgQ call; each is a pure binding of a
//!   fixed SQL statement and argument list to the query executor.
//! - [`ClientBuilder`] configures the connection and execution mode.
//!
//! ## How
//!
//! Build a [`Client`] from a DSN, then call the queue operations. For a
//! reader bound to one queue/consumer pair, use
//! [`Consumer`](crate::Consumer) instead.
//!
//! ### Example
//!
//! ```no_run
//! use pgq_client::Client;
//!
//! # async fn example() -> pgq_client::Result<()> {
//! let client = Client::builder("postgresql://localhost/db")
//!     .transactional(true)
//!     .build()
//!     .await?;
//! let status = client.create_queue("notifications").await?;
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::constants::{
    CREATE_QUEUE, GET_QUEUE_INFO, NEXT_BATCH, REGISTER_CONSUMER, UNREGISTER_CONSUMER,
};
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::pool::create_pool;
use crate::types::{QueueInfo, QueueInfoResolver};

/// Builder for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    config: Config,
}

impl ClientBuilder {
    /// Create a new builder for the given DSN.
    pub fn new<S: Into<String>>(dsn: S) -> Self {
        Self {
            config: Config::from_dsn(dsn),
        }
    }

    /// Enable or disable transactional execution mode.
    pub fn transactional(mut self, enable: bool) -> Self {
        self.config.transactional = enable;
        self
    }

    /// Set the maximum number of database connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Set the connection acquire timeout in seconds.
    pub fn connection_timeout(mut self, seconds: u64) -> Self {
        self.config.connection_timeout_seconds = seconds;
        self
    }

    /// Connect and build the client.
    pub async fn build(self) -> Result<Client> {
        Client::connect(&self.config).await
    }
}

/// Client for PgQ queue administration.
///
/// Holds one query executor; the identity of the underlying database handle
/// is fixed for the client's lifetime, while the execution mode may be
/// swapped with [`Client::enable_tx`].
#[derive(Debug)]
pub struct Client {
    executor: QueryExecutor,
}

impl Client {
    /// Create a new builder for the given DSN.
    pub fn builder<S: Into<String>>(dsn: S) -> ClientBuilder {
        ClientBuilder::new(dsn)
    }

    /// Connect using a configuration object.
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        let pool = create_pool(config).await?;
        Ok(Self {
            executor: QueryExecutor::new(pool, config.transactional),
        })
    }

    /// Switch transactional execution mode.
    ///
    /// Swaps the executor for a new instance pointed at the same database
    /// handle; the connection pool is not closed or reopened.
    pub fn enable_tx(&mut self, enable: bool) {
        let pool = self.executor.pool().clone();
        self.executor = QueryExecutor::new(pool, enable);
    }

    /// Create a queue.
    ///
    /// # Returns
    /// 1 if the queue was created, 0 if it already existed.
    pub async fn create_queue(&self, name: &str) -> Result<i64> {
        self.executor.fetch_int(CREATE_QUEUE, &[name]).await
    }

    /// Register a consumer on a queue.
    ///
    /// # Returns
    /// 1 if the consumer was registered, 0 if it was already registered.
    pub async fn register_consumer(&self, queue: &str, consumer: &str) -> Result<i64> {
        self.executor
            .fetch_int(REGISTER_CONSUMER, &[queue, consumer])
            .await
    }

    /// Unregister a consumer from a queue.
    pub async fn unregister_consumer(&self, queue: &str, consumer: &str) -> Result<i64> {
        self.executor
            .fetch_int(UNREGISTER_CONSUMER, &[queue, consumer])
            .await
    }

    /// Fetch the id of the next batch of events for a consumer.
    pub async fn next_batch(&self, queue: &str, consumer: &str) -> Result<i64> {
        self.executor.fetch_int(NEXT_BATCH, &[queue, consumer]).await
    }

    /// Read metadata for a queue.
    ///
    /// If the queue reports no rows, a zero-valued [`QueueInfo`] is returned
    /// with no error.
    pub async fn get_queue_info(&self, name: &str) -> Result<QueueInfo> {
        self.executor
            .fetch(&QueueInfoResolver, GET_QUEUE_INFO, &[name])
            .await
    }
}
