//! Domain records and closed state enums for couriers and deliveries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability state of a courier.
///
/// A courier is `Busy` iff exactly one active delivery references it; the
/// engine bundles the status write and the delivery write in one transaction
/// to keep that invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourierStatus {
    Available,
    Busy,
    Paused,
}

impl CourierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourierStatus::Available => "available",
            CourierStatus::Busy => "busy",
            CourierStatus::Paused => "paused",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "available" => Some(CourierStatus::Available),
            "busy" => Some(CourierStatus::Busy),
            "paused" => Some(CourierStatus::Paused),
            _ => None,
        }
    }
}

/// How a courier moves. Determines the delivery deadline via
/// [crate::policy::LeasePolicy].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    OnFoot,
    Scooter,
    Car,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::OnFoot => "on_foot",
            TransportKind::Scooter => "scooter",
            TransportKind::Car => "car",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "on_foot" => Some(TransportKind::OnFoot),
            "scooter" => Some(TransportKind::Scooter),
            "car" => Some(TransportKind::Car),
            _ => None,
        }
    }
}

/// Outcome state reported back to the caller of unassign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignState {
    Assigned,
    Unassigned,
}

impl AssignState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignState::Assigned => "assigned",
            AssignState::Unassigned => "unassigned",
        }
    }
}

/// A courier row as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CourierRecord {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub status: CourierStatus,
    pub transport: TransportKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to [crate::courier::CourierService::create]. Transport defaults to
/// [TransportKind::OnFoot] when omitted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCourier {
    pub name: String,
    pub phone: String,
    pub status: CourierStatus,
    pub transport: Option<TransportKind>,
}

/// Validated courier fields handed to the store for insertion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewCourier {
    pub name: String,
    pub phone: String,
    pub status: CourierStatus,
    pub transport: TransportKind,
}

/// Partial update of a courier row. `None` fields are left untouched
/// (COALESCE semantics in the store).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CourierPatch {
    pub id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<CourierStatus>,
    pub transport: Option<TransportKind>,
}

impl CourierPatch {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: CourierStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A delivery row: the binding between an order and a courier, with the
/// deadline after which the courier becomes reclaimable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: i64,
    pub courier_id: i64,
    pub order_id: String,
    pub assigned_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

/// Result of a successful assign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssignedDelivery {
    pub courier_id: i64,
    pub order_id: String,
    pub transport: TransportKind,
    pub deadline: DateTime<Utc>,
}

/// Result of a successful unassign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReleasedDelivery {
    pub courier_id: i64,
    pub order_id: String,
    pub status: AssignState,
}
