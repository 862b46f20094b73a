//! Transaction scope and store contracts used by the engine and services.
//!
//! Implementations must make the locking discipline explicit:
//! - `DeliveryStore::get_by_order` and `DeliveryStore::least_loaded_available`
//!   are locking reads: the returned row (or the selected courier row) stays
//!   row-locked until the enclosing transaction ends, so two concurrent
//!   assigns cannot pick the same courier and unassign/complete cannot race a
//!   reclamation tick.
//! - All methods take the connection handle as an explicit parameter obtained
//!   from [TxScope::run_atomic]; there is no ambient connection lookup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::error::StoreError;
use crate::model::{CourierPatch, CourierRecord, DeliveryRecord, NewCourier};

/// Scopes a unit of work to one connection, transactional or ambient.
#[async_trait]
pub trait TxScope: Send + Sync {
    /// Connection handle threaded through every store call inside the scope.
    type Conn: Send;

    /// Run `body` against a scoped connection.
    ///
    /// With `in_tx`, a transaction is opened and `body` receives its
    /// connection: an `Err` from `body` rolls the transaction back and
    /// propagates unchanged; on `Ok` the transaction is committed, and a
    /// commit failure becomes the overall error. Without `in_tx`, `body`
    /// runs on the ambient pooled connection.
    async fn run_atomic<T, E, F>(&self, in_tx: bool, body: F) -> Result<T, E>
    where
        T: Send,
        E: From<StoreError> + Send,
        F: for<'c> FnOnce(&'c mut Self::Conn) -> BoxFuture<'c, Result<T, E>> + Send;
}

/// Courier rows: plain data access plus the two scheduling-side operations
/// (locked availability listing, bulk restore).
#[async_trait]
pub trait CourierStore<C: Send>: Send + Sync {
    /// Insert a courier; the store assigns id and timestamps.
    /// Fails with [StoreError::DuplicatePhone] on a phone collision.
    async fn create(&self, conn: &mut C, courier: &NewCourier)
        -> Result<CourierRecord, StoreError>;

    async fn get(&self, conn: &mut C, id: i64) -> Result<CourierRecord, StoreError>;

    /// All couriers ordered by id.
    async fn list(&self, conn: &mut C) -> Result<Vec<CourierRecord>, StoreError>;

    /// Partial update; `None` fields keep their stored value. Fails with
    /// [StoreError::NotFound] when the id matches no row.
    async fn update(&self, conn: &mut C, patch: &CourierPatch) -> Result<(), StoreError>;

    /// Available couriers ordered by id, row-locked until transaction end.
    async fn list_available(&self, conn: &mut C) -> Result<Vec<CourierRecord>, StoreError>;

    /// Flip the given couriers from busy back to available. Rows not
    /// currently busy are left untouched.
    async fn restore_available(&self, conn: &mut C, ids: &[i64]) -> Result<(), StoreError>;
}

/// Delivery rows: the active binding between an order and a courier.
#[async_trait]
pub trait DeliveryStore<C: Send>: Send + Sync {
    async fn create(
        &self,
        conn: &mut C,
        order_id: &str,
        courier_id: i64,
        deadline: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Locking read by order id; [StoreError::NotFound] when absent.
    async fn get_by_order(&self, conn: &mut C, order_id: &str)
        -> Result<DeliveryRecord, StoreError>;

    /// Delete the delivery for `order_id`, returning the courier that held
    /// it; [StoreError::NotFound] when absent.
    async fn delete_by_order(&self, conn: &mut C, order_id: &str) -> Result<i64, StoreError>;

    /// Ids of couriers whose every delivery deadline is strictly before
    /// `now`. A courier with any still-live delivery is excluded; couriers
    /// with no deliveries at all do not appear.
    async fn couriers_fully_expired(
        &self,
        conn: &mut C,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>, StoreError>;

    /// Among available couriers, the one with the fewest
    /// expired-but-unreclaimed deliveries (ties break toward the lowest id),
    /// row-locked until transaction end. [StoreError::NotFound] when no
    /// courier is available.
    async fn least_loaded_available(
        &self,
        conn: &mut C,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError>;
}
