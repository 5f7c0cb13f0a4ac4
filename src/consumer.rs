//! Consumer interface for pgq-client.
//!
//! This module defines the [`Consumer`] struct, a reader bound to one
//! queue/consumer-name pair. For queue administration, use
//! [`Client`](crate::Client).

use crate::config::Config;
use crate::constants::{NEXT_BATCH, REGISTER_CONSUMER, UNREGISTER_CONSUMER};
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::pool::create_pool;

/// Builder for [`Consumer`].
#[derive(Debug, Clone)]
pub struct ConsumerBuilder {
    config: Config,
    queue: String,
    name: String,
}

impl ConsumerBuilder {
    /// Create a new builder bound to one queue/consumer-name pair.
    pub fn new<D, Q, N>(dsn: D, queue: Q, name: N) -> Self
    where
        D: Into<String>,
        Q: Into<String>,
        N: Into<String>,
    {
        Self {
            config: Config::from_dsn(dsn),
            queue: queue.into(),
            name: name.into(),
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

    /// Connect and build the consumer.
    pub async fn build(self) -> Result<Consumer> {
        Consumer::connect(&self.config, &self.queue, &self.name).await
    }
}

/// A named reader bound to one queue.
///
/// The queue and consumer names are fixed at construction; only the
/// execution mode may change afterwards.
#[derive(Debug)]
pub struct Consumer {
    executor: QueryExecutor,
    queue: String,
    name: String,
}

impl Consumer {
    /// Create a new builder bound to one queue/consumer-name pair.
    pub fn builder<D, Q, N>(dsn: D, queue: Q, name: N) -> ConsumerBuilder
    where
        D: Into<String>,
        Q: Into<String>,
        N: Into<String>,
    {
        ConsumerBuilder::new(dsn, queue, name)
    }

    /// Connect using a configuration object.
    pub async fn connect(config: &Config, queue: &str, name: &str) -> Result<Self> {
        config.validate()?;
        let pool = create_pool(config).await?;
        Ok(Self {
            executor: QueryExecutor::new(pool, config.transactional),
            queue: queue.to_string(),
            name: name.to_string(),
        })
    }

    /// Queue this consumer reads from.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Name this consumer is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Switch transactional execution mode.
    ///
    /// Swaps the executor for a new instance pointed at the same database
    /// handle; the connection pool is not closed or reopened.
    pub fn enable_tx(&mut self, enable: bool) {
        let pool = self.executor.pool().clone();
        self.executor = QueryExecutor::new(pool, enable);
    }

    /// Register this consumer on its queue.
    ///
    /// # Returns
    /// 1 if the consumer was registered, 0 if it was already registered.
    pub async fn register(&self) -> Result<i64> {
        self.executor
            .fetch_int(REGISTER_CONSUMER, &[self.queue.as_str(), self.name.as_str()])
            .await
    }

    /// Unregister this consumer from its queue.
    pub async fn unregister(&self) -> Result<i64> {
        self.executor
            .fetch_int(UNREGISTER_CONSUMER, &[self.queue.as_str(), self.name.as_str()])
            .await
    }

    /// Fetch the id of the next batch of events for this consumer.
    pub async fn next_batch(&self) -> Result<i64> {
        self.executor
            .fetch_int(NEXT_BATCH, &[self.queue.as_str(), self.name.as_str()])
            .await
    }
}
