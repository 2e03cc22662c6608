//! Gatehouse API Library
//!
//! Password hashing, token issuance and verification, and the request gates
//! that protect the Gatehouse HTTP surface.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod security;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
