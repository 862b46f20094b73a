//! Wire DTOs. Field names follow the existing JSON contract
//! (`transport_type`, `delivery_deadline`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parcel_core::model::{AssignedDelivery, CourierRecord, ReleasedDelivery};

#[derive(Clone, Debug, Deserialize)]
pub struct CreateCourierRequest {
    pub name: String,
    pub phone: String,
    pub status: String,
    #[serde(default)]
    pub transport_type: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateCourierRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transport_type: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CourierResponse {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub status: String,
    pub transport_type: String,
}

impl From<CourierRecord> for CourierResponse {
    fn from(courier: CourierRecord) -> Self {
        Self {
            id: courier.id,
            name: courier.name,
            phone: courier.phone,
            status: courier.status.as_str().to_string(),
            transport_type: courier.transport.as_str().to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub order_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AssignResponse {
    pub courier_id: i64,
    pub order_id: String,
    pub transport_type: String,
    pub delivery_deadline: DateTime<Utc>,
}

impl From<AssignedDelivery> for AssignResponse {
    fn from(assigned: AssignedDelivery) -> Self {
        Self {
            courier_id: assigned.courier_id,
            order_id: assigned.order_id,
            transport_type: assigned.transport.as_str().to_string(),
            delivery_deadline: assigned.deadline,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UnassignResponse {
    pub courier_id: i64,
    pub order_id: String,
    pub status: String,
}

impl From<ReleasedDelivery> for UnassignResponse {
    fn from(released: ReleasedDelivery) -> Self {
        Self {
            courier_id: released.courier_id,
            order_id: released.order_id,
            status: released.status.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use parcel_core::model::{AssignState, TransportKind};

    #[test]
    fn assign_response_uses_contract_field_names() {
        let assigned = AssignedDelivery {
            courier_id: 3,
            order_id: "order-1".into(),
            transport: TransportKind::OnFoot,
            deadline: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
        };
        let json = serde_json::to_value(AssignResponse::from(assigned)).expect("serialize");

        assert_eq!(json["courier_id"], 3);
        assert_eq!(json["order_id"], "order-1");
        assert_eq!(json["transport_type"], "on_foot");
        assert!(json.get("delivery_deadline").is_some());
    }

    #[test]
    fn unassign_response_reports_state() {
        let released = ReleasedDelivery {
            courier_id: 7,
            order_id: "order-2".into(),
            status: AssignState::Unassigned,
        };
        let json = serde_json::to_value(UnassignResponse::from(released)).expect("serialize");
        assert_eq!(json["status"], "unassigned");
    }

    #[test]
    fn order_request_tolerates_missing_field() {
        let req: OrderRequest = serde_json::from_str("{}").expect("deserialize");
        assert!(req.order_id.is_empty());
    }
}
