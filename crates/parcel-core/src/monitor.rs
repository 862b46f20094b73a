//! Deadline reclamation: a background loop that returns couriers whose every
//! delivery deadline has passed to the available pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::store::{CourierStore, DeliveryStore, TxScope};

/// Periodic reclaim loop. One transaction per tick: find couriers with only
/// expired deliveries, flip them busy to available. Delivery rows are left in
/// place (soft reclaim); a stale row still blocks re-assignment of its order
/// and still honors a late unassign or complete.
pub struct DeadlineMonitor<S, CS, DS> {
    scope: S,
    couriers: Arc<CS>,
    deliveries: Arc<DS>,
    interval: Duration,
}

impl<S, CS, DS> DeadlineMonitor<S, CS, DS>
where
    S: TxScope,
    CS: CourierStore<S::Conn> + 'static,
    DS: DeliveryStore<S::Conn> + 'static,
{
    pub fn new(scope: S, couriers: CS, deliveries: DS, interval: Duration) -> Self {
        Self {
            scope,
            couriers: Arc::new(couriers),
            deliveries: Arc::new(deliveries),
            interval,
        }
    }

    async fn tick(&self) -> Result<Vec<i64>, DispatchError> {
        let couriers = Arc::clone(&self.couriers);
        let deliveries = Arc::clone(&self.deliveries);

        self.scope
            .run_atomic(true, move |conn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let expired = deliveries.couriers_fully_expired(conn, now).await?;
                    if !expired.is_empty() {
                        couriers.restore_available(conn, &expired).await?;
                    }
                    Ok(expired)
                })
            })
            .await
    }

    /// Run until `shutdown` fires, ticking at the configured interval. The
    /// first tick happens one full interval after start, and a tick must
    /// finish before the next is awaited. Returns
    /// [DispatchError::Cancelled] on shutdown; any store error is fatal to
    /// the loop and propagates to the supervisor.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DispatchError> {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("deadline monitor shutting down");
                    return Err(DispatchError::Cancelled);
                }
                _ = ticker.tick() => {
                    let restored = self.tick().await?;
                    if !restored.is_empty() {
                        tracing::info!(couriers = restored.len(), "reclaimed expired couriers");
                    }
                }
            }
        }
    }
}
