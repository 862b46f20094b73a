//! Courier dispatch core: domain model, store contracts, the assignment
//! engine, and the deadline reclamation monitor.
//!
//! Everything in this crate operates through the [store::TxScope] abstraction
//! and the store contracts in [store]; the PostgreSQL implementations live in
//! the `parcel-store` crate and the HTTP surface in `parcel-server`.

pub mod courier;
pub mod engine;
pub mod error;
pub mod model;
pub mod monitor;
pub mod policy;
pub mod store;

#[cfg(test)]
pub(crate) mod testkit;

pub use courier::CourierService;
pub use engine::AssignEngine;
pub use error::{CourierError, DispatchError, StoreError};
pub use model::{
    AssignState, AssignedDelivery, CourierPatch, CourierRecord, CourierStatus, CreateCourier,
    DeliveryRecord, NewCourier, ReleasedDelivery, TransportKind,
};
pub use monitor::DeadlineMonitor;
pub use policy::{LeasePolicy, TransportLeasePolicy};
pub use store::{CourierStore, DeliveryStore, TxScope};
