//! Minimal stand-in for the PgQ extension.
//!
//! Installs a `pgq` schema with plain tables and plpgsql functions honoring
//! the wire contract the client depends on: `create_queue`,
//! `register_consumer`, `unregister_consumer`, `next_batch` and
//! `get_queue_info`. `register_consumer` additionally records a
//! start/finish timestamp pair in `pgq.call_audit`, which the transaction
//! tests use to observe serialization and rollback.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const INSTALL: &str = r#"
CREATE SCHEMA pgq;

CREATE TABLE pgq.queue (
    queue_name text PRIMARY KEY,
    queue_switch_time timestamptz NOT NULL DEFAULT now(),
    queue_rotation_period interval NOT NULL DEFAULT interval '2 hours',
    queue_ticker_max_lag interval NOT NULL DEFAULT interval '3 seconds',
    last_tick_id bigint NOT NULL DEFAULT 1
);

CREATE TABLE pgq.consumer (
    queue_name text NOT NULL REFERENCES pgq.queue (queue_name),
    consumer_name text NOT NULL,
    next_batch_id bigint NOT NULL DEFAULT 0,
    PRIMARY KEY (queue_name, consumer_name)
);

CREATE TABLE pgq.call_audit (
    id bigint GENERATED ALWAYS AS IDENTITY,
    call text NOT NULL,
    started timestamptz NOT NULL,
    finished timestamptz NOT NULL
);

CREATE FUNCTION pgq.create_queue(i_queue_name text) RETURNS integer
LANGUAGE plpgsql AS $$
BEGIN
    INSERT INTO pgq.queue (queue_name) VALUES (i_queue_name)
    ON CONFLICT (queue_name) DO NOTHING;
    IF FOUND THEN
        RETURN 1;
    END IF;
    RETURN 0;
END;
$$;

CREATE FUNCTION pgq.register_consumer(i_queue_name text, i_consumer_name text) RETURNS integer
LANGUAGE plpgsql AS $$
DECLARE
    v_start timestamptz := clock_timestamp();
    v_new boolean;
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pgq.queue WHERE queue_name = i_queue_name) THEN
        RAISE EXCEPTION 'Event queue not found: %', i_queue_name;
    END IF;
    v_new := NOT EXISTS (
        SELECT 1 FROM pgq.consumer
        WHERE queue_name = i_queue_name AND consumer_name = i_consumer_name
    );
    PERFORM pg_sleep(0.05);
    INSERT INTO pgq.consumer (queue_name, consumer_name)
    VALUES (i_queue_name, i_consumer_name)
    ON CONFLICT (queue_name, consumer_name) DO NOTHING;
    INSERT INTO pgq.call_audit (call, started, finished)
    VALUES ('register_consumer', v_start, clock_timestamp());
    IF v_new THEN
        RETURN 1;
    END IF;
    RETURN 0;
END;
$$;

CREATE FUNCTION pgq.unregister_consumer(i_queue_name text, i_consumer_name text) RETURNS integer
LANGUAGE plpgsql AS $$
DECLARE
    v_count integer;
BEGIN
    DELETE FROM pgq.consumer
    WHERE queue_name = i_queue_name AND consumer_name = i_consumer_name;
    GET DIAGNOSTICS v_count = ROW_COUNT;
    RETURN v_count;
END;
$$;

CREATE FUNCTION pgq.next_batch(i_queue_name text, i_consumer_name text) RETURNS bigint
LANGUAGE plpgsql AS $$
DECLARE
    v_last bigint;
    v_next bigint;
BEGIN
    SELECT q.last_tick_id INTO v_last
    FROM pgq.queue q
    WHERE q.queue_name = i_queue_name;
    IF NOT FOUND THEN
        RAISE EXCEPTION 'Event queue not found: %', i_queue_name;
    END IF;
    SELECT c.next_batch_id INTO v_next
    FROM pgq.consumer c
    WHERE c.queue_name = i_queue_name AND c.consumer_name = i_consumer_name;
    IF NOT FOUND THEN
        RAISE EXCEPTION 'Not subscriber to queue: %', i_queue_name;
    END IF;
    -- No tick beyond the consumer's position: no batch available.
    IF v_next >= v_last THEN
        RETURN NULL;
    END IF;
    UPDATE pgq.consumer SET next_batch_id = v_next + 1
    WHERE queue_name = i_queue_name AND consumer_name = i_consumer_name;
    RETURN v_next + 1;
END;
$$;

CREATE FUNCTION pgq.get_queue_info(i_queue_name text) RETURNS SETOF pgq.queue
LANGUAGE sql AS $$
    SELECT * FROM pgq.queue WHERE queue_name = i_queue_name;
$$;
"#;

// Replacement register_consumer that performs its insert and then returns
// NULL, so the client's integer resolver fails after a successful query.
const BREAK_REGISTER_CONSUMER: &str = r#"
CREATE OR REPLACE FUNCTION pgq.register_consumer(i_queue_name text, i_consumer_name text) RETURNS integer
LANGUAGE plpgsql AS $$
BEGIN
    INSERT INTO pgq.call_audit (call, started, finished)
    VALUES ('register_consumer', clock_timestamp(), clock_timestamp());
    RETURN NULL;
END;
$$;
"#;

pub async fn connect(dsn: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(4).connect(dsn).await
}

/// Install the stub schema into a fresh database.
pub async fn install(dsn: &str) -> Result<(), sqlx::Error> {
    let pool = connect(dsn).await?;
    sqlx::raw_sql(INSTALL).execute(&pool).await?;
    Ok(())
}

/// Replace `register_consumer` with a variant whose result cannot be
/// scanned, to exercise the resolver-error path.
pub async fn break_register_consumer(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(BREAK_REGISTER_CONSUMER).execute(pool).await?;
    Ok(())
}

/// Number of `register_consumer` audit rows currently visible.
pub async fn audit_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM pgq.call_audit WHERE call = 'register_consumer'")
        .fetch_one(pool)
        .await
}

/// Audit intervals for `register_consumer`, ordered by start time.
pub async fn audit_intervals(
    pool: &PgPool,
) -> Result<Vec<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT started, finished FROM pgq.call_audit WHERE call = 'register_consumer' ORDER BY started",
    )
    .fetch_all(pool)
    .await
}

/// Count of sessions currently sitting in an open transaction.
pub async fn open_transaction_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM pg_stat_activity \
         WHERE datname = current_database() AND state = 'idle in transaction'",
    )
    .fetch_one(pool)
    .await
}
