//! Schema bootstrap for the dispatch tables.

use sqlx::PgPool;

use parcel_core::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS couriers (
    id             BIGSERIAL PRIMARY KEY,
    name           TEXT NOT NULL,
    phone          TEXT NOT NULL UNIQUE,
    status         TEXT NOT NULL,
    transport_type TEXT NOT NULL,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS deliveries (
    id          BIGSERIAL PRIMARY KEY,
    courier_id  BIGINT NOT NULL REFERENCES couriers (id),
    order_id    TEXT NOT NULL UNIQUE,
    assigned_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deadline    TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_deliveries_courier_deadline
ON deliveries (courier_id, deadline);
";

/// Create the dispatch tables when they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| StoreError::backend("ensure schema", e))?;
    Ok(())
}
