//! Delivery deadline policy: transport kind to lease duration.

use chrono::{DateTime, Duration, Utc};

use crate::model::TransportKind;

/// Maps a courier's transport to the absolute deadline of a new delivery.
/// Evaluated once at grant time; the deadline is never recomputed afterwards.
pub trait LeasePolicy: Send + Sync {
    fn deadline(&self, transport: TransportKind, granted_at: DateTime<Utc>) -> DateTime<Utc>;
}

/// Fixed per-transport durations: a courier on foot gets the longest window,
/// a car the shortest.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportLeasePolicy;

impl TransportLeasePolicy {
    pub fn new() -> Self {
        Self
    }
}

impl LeasePolicy for TransportLeasePolicy {
    fn deadline(&self, transport: TransportKind, granted_at: DateTime<Utc>) -> DateTime<Utc> {
        let ttl = match transport {
            TransportKind::OnFoot => Duration::minutes(30),
            TransportKind::Scooter => Duration::minutes(15),
            TransportKind::Car => Duration::minutes(5),
        };
        granted_at + ttl
    }
}
