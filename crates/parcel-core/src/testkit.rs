//! In-memory fakes behind the production store traits, shared by the engine,
//! courier service, and monitor tests.
//!
//! [FakeScope] gives transactions snapshot-restore semantics so rollback
//! behavior is observable: a failed body leaves the fake database exactly as
//! it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::model::{
    CourierPatch, CourierRecord, CourierStatus, DeliveryRecord, NewCourier, TransportKind,
};
use crate::store::{CourierStore, DeliveryStore, TxScope};

/// In-memory courier and delivery tables standing in for the database.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct FakeDb {
    pub couriers: BTreeMap<i64, CourierRecord>,
    pub deliveries: Vec<DeliveryRecord>,
    pub next_courier_id: i64,
    pub next_delivery_id: i64,
    /// When set, the expired-couriers query fails with this message.
    pub fail_expired_query: Option<String>,
    /// When set, courier updates fail with this message.
    pub fail_courier_update: Option<String>,
}

impl FakeDb {
    pub fn add_courier(&mut self, status: CourierStatus, transport: TransportKind) -> i64 {
        self.next_courier_id += 1;
        let id = self.next_courier_id;
        let now = Utc::now();
        self.couriers.insert(
            id,
            CourierRecord {
                id,
                name: format!("courier-{id}"),
                phone: format!("+7912000{id:04}"),
                status,
                transport,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn add_delivery(
        &mut self,
        courier_id: i64,
        order_id: &str,
        deadline: DateTime<Utc>,
    ) -> i64 {
        self.next_delivery_id += 1;
        let id = self.next_delivery_id;
        self.deliveries.push(DeliveryRecord {
            id,
            courier_id,
            order_id: order_id.to_string(),
            assigned_at: Utc::now(),
            deadline,
        });
        id
    }
}

/// Transaction scope over a shared [FakeDb].
#[derive(Clone, Default)]
pub(crate) struct FakeScope {
    db: Arc<Mutex<FakeDb>>,
}

impl FakeScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed<R>(&self, seed: impl FnOnce(&mut FakeDb) -> R) -> R {
        seed(&mut *self.db.lock().await)
    }

    pub async fn snapshot(&self) -> FakeDb {
        self.db.lock().await.clone()
    }
}

#[async_trait]
impl TxScope for FakeScope {
    type Conn = FakeDb;

    async fn run_atomic<T, E, F>(&self, in_tx: bool, body: F) -> Result<T, E>
    where
        T: Send,
        E: From<StoreError> + Send,
        F: for<'c> FnOnce(&'c mut FakeDb) -> BoxFuture<'c, Result<T, E>> + Send,
    {
        let mut db = self.db.lock().await;
        if !in_tx {
            return body(&mut *db).await;
        }

        let before = db.clone();
        match body(&mut *db).await {
            Ok(value) => Ok(value),
            Err(err) => {
                *db = before;
                Err(err)
            }
        }
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FakeCourierStore;

#[async_trait]
impl CourierStore<FakeDb> for FakeCourierStore {
    async fn create(
        &self,
        conn: &mut FakeDb,
        courier: &NewCourier,
    ) -> Result<CourierRecord, StoreError> {
        if conn.couriers.values().any(|c| c.phone == courier.phone) {
            return Err(StoreError::DuplicatePhone);
        }
        conn.next_courier_id += 1;
        let id = conn.next_courier_id;
        let now = Utc::now();
        let record = CourierRecord {
            id,
            name: courier.name.clone(),
            phone: courier.phone.clone(),
            status: courier.status,
            transport: courier.transport,
            created_at: now,
            updated_at: now,
        };
        conn.couriers.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, conn: &mut FakeDb, id: i64) -> Result<CourierRecord, StoreError> {
        conn.couriers.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list(&self, conn: &mut FakeDb) -> Result<Vec<CourierRecord>, StoreError> {
        Ok(conn.couriers.values().cloned().collect())
    }

    async fn update(&self, conn: &mut FakeDb, patch: &CourierPatch) -> Result<(), StoreError> {
        if let Some(message) = &conn.fail_courier_update {
            return Err(StoreError::backend("update courier", message));
        }
        if let Some(phone) = &patch.phone {
            if conn
                .couriers
                .values()
                .any(|c| c.id != patch.id && &c.phone == phone)
            {
                return Err(StoreError::DuplicatePhone);
            }
        }
        let courier = conn
            .couriers
            .get_mut(&patch.id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = &patch.name {
            courier.name = name.clone();
        }
        if let Some(phone) = &patch.phone {
            courier.phone = phone.clone();
        }
        if let Some(status) = patch.status {
            courier.status = status;
        }
        if let Some(transport) = patch.transport {
            courier.transport = transport;
        }
        courier.updated_at = Utc::now();
        Ok(())
    }

    async fn list_available(&self, conn: &mut FakeDb) -> Result<Vec<CourierRecord>, StoreError> {
        Ok(conn
            .couriers
            .values()
            .filter(|c| c.status == CourierStatus::Available)
            .cloned()
            .collect())
    }

    async fn restore_available(&self, conn: &mut FakeDb, ids: &[i64]) -> Result<(), StoreError> {
        for id in ids {
            if let Some(courier) = conn.couriers.get_mut(id) {
                if courier.status == CourierStatus::Busy {
                    courier.status = CourierStatus::Available;
                    courier.updated_at = Utc::now();
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FakeDeliveryStore;

#[async_trait]
impl DeliveryStore<FakeDb> for FakeDeliveryStore {
    async fn create(
        &self,
        conn: &mut FakeDb,
        order_id: &str,
        courier_id: i64,
        deadline: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if conn.deliveries.iter().any(|d| d.order_id == order_id) {
            return Err(StoreError::backend("insert delivery", "duplicate order_id"));
        }
        conn.add_delivery(courier_id, order_id, deadline);
        Ok(())
    }

    async fn get_by_order(
        &self,
        conn: &mut FakeDb,
        order_id: &str,
    ) -> Result<DeliveryRecord, StoreError> {
        conn.deliveries
            .iter()
            .find(|d| d.order_id == order_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_by_order(&self, conn: &mut FakeDb, order_id: &str) -> Result<i64, StoreError> {
        let index = conn
            .deliveries
            .iter()
            .position(|d| d.order_id == order_id)
            .ok_or(StoreError::NotFound)?;
        Ok(conn.deliveries.remove(index).courier_id)
    }

    async fn couriers_fully_expired(
        &self,
        conn: &mut FakeDb,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>, StoreError> {
        if let Some(message) = &conn.fail_expired_query {
            return Err(StoreError::backend("expired couriers", message));
        }
        Ok(conn
            .couriers
            .keys()
            .copied()
            .filter(|id| {
                let mut any = false;
                let all_expired = conn
                    .deliveries
                    .iter()
                    .filter(|d| d.courier_id == *id)
                    .all(|d| {
                        any = true;
                        d.deadline < now
                    });
                any && all_expired
            })
            .collect())
    }

    async fn least_loaded_available(
        &self,
        conn: &mut FakeDb,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        conn.couriers
            .values()
            .filter(|c| c.status == CourierStatus::Available)
            .map(|c| {
                let expired = conn
                    .deliveries
                    .iter()
                    .filter(|d| d.courier_id == c.id && d.deadline < now)
                    .count();
                (expired, c.id)
            })
            .min()
            .map(|(_, id)| id)
            .ok_or(StoreError::NotFound)
    }
}
