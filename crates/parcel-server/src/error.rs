//! HTTP error mapping for the dispatch handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use parcel_core::error::{CourierError, DispatchError};

#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(ErrorState),
    NotFound(ErrorState),
    Conflict(ErrorState),
    Internal(ErrorState),
}

#[derive(Clone, Debug)]
pub struct ErrorState {
    pub message: String,
    pub request_id: Option<String>,
}

impl ErrorState {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            request_id: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct ErrorEnvelope {
    request_id: String,
    error: ErrorBody,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(ErrorState::new(message))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(ErrorState::new(message))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(ErrorState::new(message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(ErrorState::new(message))
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        let request_id = Some(request_id.into());
        match &mut self {
            Self::BadRequest(s) | Self::NotFound(s) | Self::Conflict(s) | Self::Internal(s) => {
                s.request_id = request_id
            }
        }
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, state) = match self {
            ApiError::BadRequest(s) => (StatusCode::BAD_REQUEST, "bad_request", s),
            ApiError::NotFound(s) => (StatusCode::NOT_FOUND, "not_found", s),
            ApiError::Conflict(s) => (StatusCode::CONFLICT, "conflict", s),
            ApiError::Internal(s) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", s),
        };

        let envelope = ErrorEnvelope {
            request_id: state.request_id.unwrap_or_default(),
            error: ErrorBody {
                code,
                message: state.message,
            },
        };
        (status, Json(envelope)).into_response()
    }
}

/// Dispatch errors surface as conflict/not-found; infrastructure failures are
/// logged and returned as an opaque internal error.
pub fn map_dispatch_err(err: DispatchError) -> ApiError {
    match err {
        DispatchError::AlreadyAssigned | DispatchError::NoCourierAvailable => {
            ApiError::conflict(err.to_string())
        }
        DispatchError::NotAssigned | DispatchError::OrderNotFound => {
            ApiError::not_found(err.to_string())
        }
        DispatchError::Cancelled => ApiError::conflict(err.to_string()),
        DispatchError::Store(store_err) => {
            tracing::error!(error = %store_err, "dispatch store failure");
            ApiError::internal("internal error")
        }
    }
}

pub fn map_courier_err(err: CourierError) -> ApiError {
    match err {
        CourierError::NotFound => ApiError::not_found(err.to_string()),
        CourierError::DuplicatePhone => ApiError::conflict(err.to_string()),
        CourierError::InvalidPhone => ApiError::bad_request(err.to_string()),
        CourierError::Store(store_err) => {
            tracing::error!(error = %store_err, "courier store failure");
            ApiError::internal("internal error")
        }
    }
}
