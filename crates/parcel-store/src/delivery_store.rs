//! Delivery rows in PostgreSQL.
//!
//! `get_by_order` and `least_loaded_available` take `FOR UPDATE` row locks
//! held to transaction end; they serialize concurrent assigns against each
//! other and against unassign/complete/reclamation on the same rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use parcel_core::error::StoreError;
use parcel_core::model::DeliveryRecord;
use parcel_core::store::DeliveryStore;

#[derive(Clone, Copy, Debug, Default)]
pub struct PgDeliveryStore;

impl PgDeliveryStore {
    pub fn new() -> Self {
        Self
    }
}

fn delivery_from_row(row: &PgRow) -> Result<DeliveryRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::backend("decode delivery row", e);

    Ok(DeliveryRecord {
        id: row.try_get("id").map_err(decode)?,
        courier_id: row.try_get("courier_id").map_err(decode)?,
        order_id: row.try_get("order_id").map_err(decode)?,
        assigned_at: row.try_get("assigned_at").map_err(decode)?,
        deadline: row.try_get("deadline").map_err(decode)?,
    })
}

#[async_trait]
impl DeliveryStore<PgConnection> for PgDeliveryStore {
    async fn create(
        &self,
        conn: &mut PgConnection,
        order_id: &str,
        courier_id: i64,
        deadline: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO deliveries (courier_id, order_id, deadline) VALUES ($1, $2, $3)")
            .bind(courier_id)
            .bind(order_id)
            .bind(deadline)
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::backend("insert delivery", e))?;

        Ok(())
    }

    async fn get_by_order(
        &self,
        conn: &mut PgConnection,
        order_id: &str,
    ) -> Result<DeliveryRecord, StoreError> {
        let row = sqlx::query(
            "SELECT id, courier_id, order_id, assigned_at, deadline
             FROM deliveries
             WHERE order_id = $1
             FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StoreError::backend("get delivery", e))?
        .ok_or(StoreError::NotFound)?;

        delivery_from_row(&row)
    }

    async fn delete_by_order(
        &self,
        conn: &mut PgConnection,
        order_id: &str,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query("DELETE FROM deliveries WHERE order_id = $1 RETURNING courier_id")
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| StoreError::backend("delete delivery", e))?
            .ok_or(StoreError::NotFound)?;

        row.try_get("courier_id")
            .map_err(|e| StoreError::backend("decode courier_id", e))
    }

    async fn couriers_fully_expired(
        &self,
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>, StoreError> {
        let rows = sqlx::query(
            "SELECT DISTINCT d.courier_id
             FROM deliveries d
             WHERE d.deadline < $1
               AND NOT EXISTS (
                   SELECT 1 FROM deliveries d2
                   WHERE d2.courier_id = d.courier_id
                     AND d2.deadline >= $1
               )",
        )
        .bind(now)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StoreError::backend("expired couriers", e))?;

        rows.iter()
            .map(|row| {
                row.try_get("courier_id")
                    .map_err(|e| StoreError::backend("decode courier_id", e))
            })
            .collect()
    }

    async fn least_loaded_available(
        &self,
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        // The aggregate runs in a subquery because Postgres does not allow
        // FOR UPDATE together with GROUP BY; the outer select locks the
        // chosen courier row until the transaction ends.
        let row = sqlx::query(
            "SELECT c.id FROM couriers c
             WHERE c.id = (
                 SELECT c2.id FROM couriers c2
                 LEFT JOIN deliveries d
                        ON c2.id = d.courier_id AND d.deadline < $1
                 WHERE c2.status = 'available'
                 GROUP BY c2.id
                 ORDER BY COUNT(d.order_id) ASC, c2.id ASC
                 LIMIT 1
             )
             FOR UPDATE",
        )
        .bind(now)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StoreError::backend("least loaded courier", e))?
        .ok_or(StoreError::NotFound)?;

        row.try_get("id")
            .map_err(|e| StoreError::backend("decode courier id", e))
    }
}
