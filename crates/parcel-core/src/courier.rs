//! Plain courier record management: create, get, list, partial update.
//!
//! Runs on the ambient (non-transactional) connection; scheduling state is
//! owned by [crate::engine::AssignEngine] and [crate::monitor::DeadlineMonitor].

use std::sync::Arc;

use crate::error::CourierError;
use crate::model::{CourierPatch, CourierRecord, CreateCourier, NewCourier, TransportKind};
use crate::store::{CourierStore, TxScope};

pub struct CourierService<S, CS> {
    scope: S,
    couriers: Arc<CS>,
}

impl<S, CS> CourierService<S, CS>
where
    S: TxScope,
    CS: CourierStore<S::Conn> + 'static,
{
    pub fn new(scope: S, couriers: CS) -> Self {
        Self {
            scope,
            couriers: Arc::new(couriers),
        }
    }

    /// Register a courier. The phone must carry a leading `+` and exactly 11
    /// digits; transport defaults to on-foot when omitted.
    pub async fn create(&self, input: CreateCourier) -> Result<CourierRecord, CourierError> {
        if !valid_phone(&input.phone) {
            return Err(CourierError::InvalidPhone);
        }

        let courier = NewCourier {
            name: input.name,
            phone: input.phone,
            status: input.status,
            transport: input.transport.unwrap_or(TransportKind::OnFoot),
        };

        let couriers = Arc::clone(&self.couriers);
        self.scope
            .run_atomic(false, move |conn| {
                Box::pin(async move {
                    couriers
                        .create(conn, &courier)
                        .await
                        .map_err(CourierError::from)
                })
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<CourierRecord, CourierError> {
        let couriers = Arc::clone(&self.couriers);
        self.scope
            .run_atomic(false, move |conn| {
                Box::pin(async move { couriers.get(conn, id).await.map_err(CourierError::from) })
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<CourierRecord>, CourierError> {
        let couriers = Arc::clone(&self.couriers);
        self.scope
            .run_atomic(false, move |conn| {
                Box::pin(async move { couriers.list(conn).await.map_err(CourierError::from) })
            })
            .await
    }

    /// Partial update, last-writer-wins. Callers must not use this to change
    /// `status` while the courier holds an active delivery; availability is
    /// the engine's and the monitor's to write.
    pub async fn update(&self, patch: CourierPatch) -> Result<(), CourierError> {
        if let Some(phone) = &patch.phone {
            if !valid_phone(phone) {
                return Err(CourierError::InvalidPhone);
            }
        }

        let couriers = Arc::clone(&self.couriers);
        self.scope
            .run_atomic(false, move |conn| {
                Box::pin(async move {
                    couriers
                        .update(conn, &patch)
                        .await
                        .map_err(CourierError::from)
                })
            })
            .await
    }
}

/// A phone is valid when it starts with `+` and contains exactly 11 digits;
/// separators and spacing are ignored.
fn valid_phone(raw: &str) -> bool {
    let mut digits = 0usize;
    let mut leading_plus = false;
    for c in raw.chars() {
        if c == '+' && digits == 0 {
            leading_plus = true;
            continue;
        }
        if c.is_ascii_digit() {
            digits += 1;
        }
    }
    leading_plus && digits == 11
}
