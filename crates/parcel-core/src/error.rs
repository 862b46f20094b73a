//! Per-component error types, matched by variant.

/// Store-level error. `NotFound` and `DuplicatePhone` are domain signals the
/// callers match on; `Transaction` and `Backend` are infrastructure failures
/// propagated unchanged up to the process boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("courier with this phone number already exists")]
    DuplicatePhone,
    #[error("transaction failure: {0}")]
    Transaction(String),
    #[error("database error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn transaction(context: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Transaction(format!("{context}: {err}"))
    }

    pub fn backend(context: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Backend(format!("{context}: {err}"))
    }
}

/// Assignment engine and monitor error.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The order already has an active delivery.
    #[error("order already assigned")]
    AlreadyAssigned,
    /// No available courier qualifies right now; transient.
    #[error("no available couriers now")]
    NoCourierAvailable,
    /// Unassign for an order with no active delivery.
    #[error("no courier associated with this order")]
    NotAssigned,
    /// Complete for an order with no active delivery.
    #[error("order not found")]
    OrderNotFound,
    /// The monitor observed its shutdown signal; clean exit, not a failure.
    #[error("shutdown requested")]
    Cancelled,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Courier CRUD service error.
#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    #[error("courier not found")]
    NotFound,
    #[error("courier with this phone number already exists")]
    DuplicatePhone,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CourierError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CourierError::NotFound,
            StoreError::DuplicatePhone => CourierError::DuplicatePhone,
            other => CourierError::Store(other),
        }
    }
}
