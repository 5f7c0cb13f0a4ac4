use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

pub(crate) async fn create_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .connect(&config.dsn)
        .await
        .map_err(|e| Error::ConnectionFailed {
            source: Box::new(e),
            context: "Failed to connect to postgres".into(),
        })
}
