//! Courier rows in PostgreSQL.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use parcel_core::error::StoreError;
use parcel_core::model::{CourierPatch, CourierRecord, CourierStatus, NewCourier, TransportKind};
use parcel_core::store::CourierStore;

const COURIER_COLUMNS: &str = "id, name, phone, status, transport_type, created_at, updated_at";

#[derive(Clone, Copy, Debug, Default)]
pub struct PgCourierStore;

impl PgCourierStore {
    pub fn new() -> Self {
        Self
    }
}

fn courier_from_row(row: &PgRow) -> Result<CourierRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::backend("decode courier row", e);

    let status: String = row.try_get("status").map_err(decode)?;
    let transport: String = row.try_get("transport_type").map_err(decode)?;
    Ok(CourierRecord {
        id: row.try_get("id").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
        status: CourierStatus::parse(&status)
            .ok_or_else(|| StoreError::backend("decode courier status", &status))?,
        transport: TransportKind::parse(&transport)
            .ok_or_else(|| StoreError::backend("decode courier transport", &transport))?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

fn map_write_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::DuplicatePhone;
        }
    }
    StoreError::backend("courier write", err)
}

#[async_trait]
impl CourierStore<PgConnection> for PgCourierStore {
    async fn create(
        &self,
        conn: &mut PgConnection,
        courier: &NewCourier,
    ) -> Result<CourierRecord, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO couriers (name, phone, status, transport_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {COURIER_COLUMNS}"
        ))
        .bind(&courier.name)
        .bind(&courier.phone)
        .bind(courier.status.as_str())
        .bind(courier.transport.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(map_write_err)?;

        courier_from_row(&row)
    }

    async fn get(&self, conn: &mut PgConnection, id: i64) -> Result<CourierRecord, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {COURIER_COLUMNS} FROM couriers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StoreError::backend("get courier", e))?
        .ok_or(StoreError::NotFound)?;

        courier_from_row(&row)
    }

    async fn list(&self, conn: &mut PgConnection) -> Result<Vec<CourierRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {COURIER_COLUMNS} FROM couriers ORDER BY id"
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StoreError::backend("list couriers", e))?;

        rows.iter().map(courier_from_row).collect()
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        patch: &CourierPatch,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE couriers SET
                 name = COALESCE($2, name),
                 phone = COALESCE($3, phone),
                 status = COALESCE($4, status),
                 transport_type = COALESCE($5, transport_type),
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(patch.id)
        .bind(patch.name.as_deref())
        .bind(patch.phone.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.transport.map(|t| t.as_str()))
        .execute(&mut *conn)
        .await
        .map_err(map_write_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_available(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<CourierRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {COURIER_COLUMNS} FROM couriers
             WHERE status = 'available'
             ORDER BY id
             FOR UPDATE"
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StoreError::backend("list available couriers", e))?;

        rows.iter().map(courier_from_row).collect()
    }

    async fn restore_available(
        &self,
        conn: &mut PgConnection,
        ids: &[i64],
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE couriers SET status = 'available', updated_at = now()
             WHERE id = ANY($1) AND status = 'busy'",
        )
        .bind(ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::backend("restore couriers", e))?;

        Ok(())
    }
}
