//! Integration tests against a real PostgreSQL instance.
//!
//! Run with a database available:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/parcel_test cargo test -p parcel-store -- --ignored
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use parcel_core::error::StoreError;
use parcel_core::model::{CourierPatch, CourierStatus, NewCourier, TransportKind};
use parcel_core::store::{CourierStore, DeliveryStore, TxScope};
use parcel_store::{ensure_schema, PgCourierStore, PgDeliveryStore, PgTxScope};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect");
    ensure_schema(&pool).await.expect("schema");
    pool
}

fn unique_phone() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .subsec_nanos();
    format!("+79{:09}", nanos)
}

fn new_courier(status: CourierStatus) -> NewCourier {
    NewCourier {
        name: "integration".into(),
        phone: unique_phone(),
        status,
        transport: TransportKind::Scooter,
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn courier_create_get_update_round_trip() {
    let scope = PgTxScope::new(pool().await);
    let store = PgCourierStore::new();

    let created: Result<_, StoreError> = scope
        .run_atomic(false, |conn| {
            Box::pin(async move {
                let created = store.create(conn, &new_courier(CourierStatus::Available)).await?;
                let fetched = store.get(conn, created.id).await?;
                assert_eq!(fetched, created);

                store
                    .update(
                        conn,
                        &CourierPatch::new(created.id).with_status(CourierStatus::Paused),
                    )
                    .await?;
                let updated = store.get(conn, created.id).await?;
                assert_eq!(updated.status, CourierStatus::Paused);
                assert_eq!(updated.transport, created.transport);
                Ok(created)
            })
        })
        .await;
    created.expect("round trip");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn duplicate_phone_is_reported() {
    let scope = PgTxScope::new(pool().await);
    let store = PgCourierStore::new();
    let courier = new_courier(CourierStatus::Available);

    let result: Result<(), StoreError> = scope
        .run_atomic(false, |conn| {
            Box::pin(async move {
                store.create(conn, &courier).await?;
                let err = store.create(conn, &courier).await.unwrap_err();
                assert!(matches!(err, StoreError::DuplicatePhone));
                Ok(())
            })
        })
        .await;
    result.expect("duplicate check");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn delivery_lifecycle_and_expiry_queries() {
    let scope = PgTxScope::new(pool().await);
    let couriers = PgCourierStore::new();
    let deliveries = PgDeliveryStore::new();
    let order_id = format!("order-{}", unique_phone());

    let result: Result<(), StoreError> = scope
        .run_atomic(true, |conn| {
            let order_id = order_id.clone();
            Box::pin(async move {
                let courier = couriers
                    .create(conn, &new_courier(CourierStatus::Available))
                    .await?;

                let available = couriers.list_available(conn).await?;
                assert!(available.iter().any(|c| c.id == courier.id));

                let now = Utc::now();
                deliveries.least_loaded_available(conn, now).await?;

                deliveries
                    .create(conn, &order_id, courier.id, now - Duration::minutes(1))
                    .await?;
                let fetched = deliveries.get_by_order(conn, &order_id).await?;
                assert_eq!(fetched.courier_id, courier.id);

                let expired = deliveries.couriers_fully_expired(conn, Utc::now()).await?;
                assert!(expired.contains(&courier.id));

                let removed = deliveries.delete_by_order(conn, &order_id).await?;
                assert_eq!(removed, courier.id);
                let err = deliveries.get_by_order(conn, &order_id).await.unwrap_err();
                assert!(matches!(err, StoreError::NotFound));
                Ok(())
            })
        })
        .await;
    result.expect("delivery lifecycle");
}
