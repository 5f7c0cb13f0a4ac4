/*!
 # pgq-client

A Rust client for the PgQ PostgreSQL queue extension: create queues, register
and unregister consumers, and fetch work batches through PgQ's stored
procedures.

## Features

- **Thin RPC surface**: every call maps to exactly one PgQ stored function
- **Optional transactions**: run each call inside its own serialized
  transaction, toggled at construction time or later
- **Async**: non-blocking sqlx/tokio stack
*/

pub mod client;
pub mod config;
pub mod consumer;
pub mod error;
pub mod types;

mod constants;
mod executor;
mod pool;

pub use crate::client::{Client, ClientBuilder};
pub use crate::config::Config;
pub use crate::consumer::{Consumer, ConsumerBuilder};
pub use crate::error::{Error, Result};
pub use crate::types::QueueInfo;
