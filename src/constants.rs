//! SQL statement texts for the PgQ stored-procedure contract.
//!
//! PgQ installs its functions under the `pgq` schema; these five statements
//! are the crate's entire wire surface. Integer results are cast to BIGINT
//! server-side so every status/batch-id column scans as a 64-bit integer,
//! and the two interval columns of `get_queue_info` are converted to epoch
//! seconds for the same reason.

pub const CREATE_QUEUE: &str = r#"SELECT pgq.create_queue($1)::BIGINT"#;

pub const REGISTER_CONSUMER: &str =
    r#"SELECT register_consumer::BIGINT FROM pgq.register_consumer($1, $2)"#;

pub const UNREGISTER_CONSUMER: &str =
    r#"SELECT unregister_consumer::BIGINT FROM pgq.unregister_consumer($1, $2)"#;

pub const NEXT_BATCH: &str = r#"SELECT next_batch::BIGINT FROM pgq.next_batch($1, $2)"#;

pub const GET_QUEUE_INFO: &str = r#"
    SELECT
        queue_name,
        queue_switch_time,
        EXTRACT(EPOCH FROM queue_rotation_period)::BIGINT,
        EXTRACT(EPOCH FROM queue_ticker_max_lag)::BIGINT,
        last_tick_id
    FROM pgq.get_queue_info($1);
"#;
