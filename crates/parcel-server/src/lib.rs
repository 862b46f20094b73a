//! HTTP adapter for the courier dispatch core: DTOs, handlers, router, and
//! environment-derived configuration. The binary lives in `src/main.rs`.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;

pub use config::Config;
pub use error::ApiError;
pub use handlers::{build_router, AppState};
