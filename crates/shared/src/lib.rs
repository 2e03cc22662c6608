//! Gatehouse Shared Types
//!
//! Domain types used by every Gatehouse surface: roles, verified identities,
//! user records and the user-store boundary the auth core is handed records through.

pub mod error;
pub mod store;
pub mod types;

pub use error::*;
pub use store::{MemoryUserStore, NewUser, UserStore, UserUpdate};
pub use types::*;
