//! Axum handlers and router for the dispatch service.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use parcel_core::model::{CourierPatch, CourierStatus, CreateCourier, TransportKind};
use parcel_core::{AssignEngine, CourierService, TransportLeasePolicy};
use parcel_store::{PgCourierStore, PgDeliveryStore, PgTxScope};

use crate::dto::{
    AssignResponse, CourierResponse, CreateCourierRequest, OrderRequest, UnassignResponse,
    UpdateCourierRequest,
};
use crate::error::{map_courier_err, map_dispatch_err, ApiError};

pub type Engine = AssignEngine<PgTxScope, PgCourierStore, PgDeliveryStore, TransportLeasePolicy>;
pub type Couriers = CourierService<PgTxScope, PgCourierStore>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub couriers: Arc<Couriers>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/couriers", get(list_couriers).post(create_courier))
        .route("/v1/couriers/:id", get(get_courier).patch(update_courier))
        .route("/v1/deliveries/assign", post(assign_delivery))
        .route("/v1/deliveries/unassign", post(unassign_delivery))
        .route("/v1/deliveries/complete", post(complete_delivery))
        .layer(from_fn(request_log_middleware))
        .with_state(state)
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

async fn request_log_middleware(
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    let rid = request_id(&headers);
    tracing::info!(
        request_id = %rid,
        method = %request.method(),
        path = %request.uri().path(),
        "http request"
    );
    next.run(request).await
}

fn require_order_id(req: &OrderRequest) -> Result<&str, ApiError> {
    if req.order_id.trim().is_empty() {
        return Err(ApiError::bad_request("order_id must not be empty"));
    }
    Ok(&req.order_id)
}

fn parse_status(raw: &str) -> Result<CourierStatus, ApiError> {
    CourierStatus::parse(raw).ok_or_else(|| ApiError::bad_request(format!("invalid status: {raw}")))
}

fn parse_transport(raw: &str) -> Result<TransportKind, ApiError> {
    TransportKind::parse(raw)
        .ok_or_else(|| ApiError::bad_request(format!("invalid transport: {raw}")))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_courier(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCourierRequest>,
) -> Result<(StatusCode, Json<CourierResponse>), ApiError> {
    let rid = request_id(&headers);
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty").with_request_id(rid));
    }
    let status = parse_status(&req.status).map_err(|e| e.with_request_id(rid.clone()))?;
    let transport = match req.transport_type.as_deref() {
        Some(raw) if !raw.is_empty() => {
            Some(parse_transport(raw).map_err(|e| e.with_request_id(rid.clone()))?)
        }
        _ => None,
    };

    let created = state
        .couriers
        .create(CreateCourier {
            name: req.name,
            phone: req.phone,
            status,
            transport,
        })
        .await
        .map_err(|e| map_courier_err(e).with_request_id(rid))?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn get_courier(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<CourierResponse>, ApiError> {
    let rid = request_id(&headers);
    let courier = state
        .couriers
        .get(id)
        .await
        .map_err(|e| map_courier_err(e).with_request_id(rid))?;
    Ok(Json(courier.into()))
}

async fn list_couriers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<CourierResponse>>, ApiError> {
    let rid = request_id(&headers);
    let couriers = state
        .couriers
        .list()
        .await
        .map_err(|e| map_courier_err(e).with_request_id(rid))?;
    Ok(Json(couriers.into_iter().map(Into::into).collect()))
}

async fn update_courier(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCourierRequest>,
) -> Result<StatusCode, ApiError> {
    let rid = request_id(&headers);
    if id <= 0 {
        return Err(ApiError::bad_request("invalid courier id").with_request_id(rid));
    }
    if matches!(&req.name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::bad_request("name must not be empty").with_request_id(rid));
    }

    let mut patch = CourierPatch::new(id);
    patch.name = req.name;
    patch.phone = req.phone;
    if let Some(raw) = req.status.as_deref() {
        patch.status = Some(parse_status(raw).map_err(|e| e.with_request_id(rid.clone()))?);
    }
    if let Some(raw) = req.transport_type.as_deref() {
        if !raw.is_empty() {
            patch.transport =
                Some(parse_transport(raw).map_err(|e| e.with_request_id(rid.clone()))?);
        }
    }

    state
        .couriers
        .update(patch)
        .await
        .map_err(|e| map_courier_err(e).with_request_id(rid))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OrderRequest>,
) -> Result<Json<AssignResponse>, ApiError> {
    let rid = request_id(&headers);
    let order_id = require_order_id(&req).map_err(|e| e.with_request_id(rid.clone()))?;

    let assigned = state
        .engine
        .assign(order_id)
        .await
        .map_err(|e| map_dispatch_err(e).with_request_id(rid))?;
    Ok(Json(assigned.into()))
}

async fn unassign_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OrderRequest>,
) -> Result<Json<UnassignResponse>, ApiError> {
    let rid = request_id(&headers);
    let order_id = require_order_id(&req).map_err(|e| e.with_request_id(rid.clone()))?;

    let released = state
        .engine
        .unassign(order_id)
        .await
        .map_err(|e| map_dispatch_err(e).with_request_id(rid))?;
    Ok(Json(released.into()))
}

async fn complete_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OrderRequest>,
) -> Result<StatusCode, ApiError> {
    let rid = request_id(&headers);
    let order_id = require_order_id(&req).map_err(|e| e.with_request_id(rid.clone()))?;

    state
        .engine
        .complete(order_id)
        .await
        .map_err(|e| map_dispatch_err(e).with_request_id(rid))?;
    Ok(StatusCode::NO_CONTENT)
}
