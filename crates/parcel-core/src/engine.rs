//! Assignment engine: assign, unassign, and complete, each a single
//! transaction composing the courier store, the delivery store, and the
//! lease policy.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{DispatchError, StoreError};
use crate::model::{
    AssignState, AssignedDelivery, CourierPatch, CourierStatus, ReleasedDelivery,
};
use crate::policy::LeasePolicy;
use crate::store::{CourierStore, DeliveryStore, TxScope};

/// Orchestrates the delivery lifecycle against the stores. The engine is the
/// only writer of delivery rows.
///
/// Stores and policy are held behind `Arc` so each transaction body owns its
/// handles for the lifetime of the scoped connection.
pub struct AssignEngine<S, CS, DS, P> {
    scope: S,
    couriers: Arc<CS>,
    deliveries: Arc<DS>,
    policy: Arc<P>,
}

impl<S, CS, DS, P> AssignEngine<S, CS, DS, P>
where
    S: TxScope,
    CS: CourierStore<S::Conn> + 'static,
    DS: DeliveryStore<S::Conn> + 'static,
    P: LeasePolicy + 'static,
{
    pub fn new(scope: S, couriers: CS, deliveries: DS, policy: P) -> Self {
        Self {
            scope,
            couriers: Arc::new(couriers),
            deliveries: Arc::new(deliveries),
            policy: Arc::new(policy),
        }
    }

    /// Grant `order_id` to the least-loaded available courier and mark the
    /// courier busy.
    ///
    /// Fails with [DispatchError::AlreadyAssigned] when the order already has
    /// an active delivery and [DispatchError::NoCourierAvailable] when no
    /// courier qualifies. Any failure rolls the whole transaction back; a
    /// courier never ends up busy without its delivery row, nor the reverse.
    pub async fn assign(&self, order_id: &str) -> Result<AssignedDelivery, DispatchError> {
        let couriers = Arc::clone(&self.couriers);
        let deliveries = Arc::clone(&self.deliveries);
        let policy = Arc::clone(&self.policy);
        let order_id = order_id.to_string();

        self.scope
            .run_atomic(true, move |conn| {
                Box::pin(async move {
                    match deliveries.get_by_order(conn, &order_id).await {
                        Ok(_) => return Err(DispatchError::AlreadyAssigned),
                        Err(StoreError::NotFound) => {}
                        Err(err) => return Err(err.into()),
                    }

                    let now = Utc::now();
                    let courier_id = match deliveries.least_loaded_available(conn, now).await {
                        Ok(id) => id,
                        Err(StoreError::NotFound) => {
                            return Err(DispatchError::NoCourierAvailable)
                        }
                        Err(err) => return Err(err.into()),
                    };

                    let courier = couriers.get(conn, courier_id).await?;
                    let deadline = policy.deadline(courier.transport, now);

                    deliveries
                        .create(conn, &order_id, courier.id, deadline)
                        .await?;
                    couriers
                        .update(
                            conn,
                            &CourierPatch::new(courier.id).with_status(CourierStatus::Busy),
                        )
                        .await?;

                    Ok(AssignedDelivery {
                        courier_id: courier.id,
                        order_id,
                        transport: courier.transport,
                        deadline,
                    })
                })
            })
            .await
    }

    /// Drop the delivery for `order_id` and return its courier to the
    /// available pool. Fails with [DispatchError::NotAssigned] when the
    /// order has no active delivery.
    pub async fn unassign(&self, order_id: &str) -> Result<ReleasedDelivery, DispatchError> {
        let couriers = Arc::clone(&self.couriers);
        let deliveries = Arc::clone(&self.deliveries);
        let order_id = order_id.to_string();

        self.scope
            .run_atomic(true, move |conn| {
                Box::pin(async move {
                    let courier_id = match deliveries.delete_by_order(conn, &order_id).await {
                        Ok(id) => id,
                        Err(StoreError::NotFound) => return Err(DispatchError::NotAssigned),
                        Err(err) => return Err(err.into()),
                    };

                    couriers
                        .update(
                            conn,
                            &CourierPatch::new(courier_id).with_status(CourierStatus::Available),
                        )
                        .await?;

                    Ok(ReleasedDelivery {
                        courier_id,
                        order_id,
                        status: AssignState::Unassigned,
                    })
                })
            })
            .await
    }

    /// Mark the delivery for `order_id` finished: the courier becomes
    /// available again. The delivery row is intentionally left in place as
    /// history; only [Self::unassign] deletes rows. Fails with
    /// [DispatchError::OrderNotFound] when the order has no delivery.
    pub async fn complete(&self, order_id: &str) -> Result<(), DispatchError> {
        let couriers = Arc::clone(&self.couriers);
        let deliveries = Arc::clone(&self.deliveries);
        let order_id = order_id.to_string();

        self.scope
            .run_atomic(true, move |conn| {
                Box::pin(async move {
                    let delivery = match deliveries.get_by_order(conn, &order_id).await {
                        Ok(delivery) => delivery,
                        Err(StoreError::NotFound) => return Err(DispatchError::OrderNotFound),
                        Err(err) => return Err(err.into()),
                    };

                    couriers
                        .update(
                            conn,
                            &CourierPatch::new(delivery.courier_id)
                                .with_status(CourierStatus::Available),
                        )
                        .await?;

                    Ok(())
                })
            })
            .await
    }
}
