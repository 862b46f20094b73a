//! PostgreSQL implementations of the dispatch store contracts.
//!
//! Row-level locking (`FOR UPDATE`) carries all cross-operation consistency;
//! see the contract docs in `parcel_core::store`.

pub mod courier_store;
pub mod delivery_store;
pub mod schema;
pub mod tx;

pub use courier_store::PgCourierStore;
pub use delivery_store::PgDeliveryStore;
pub use schema::ensure_schema;
pub use tx::PgTxScope;
