//! Core business logic for pawlink.
//!
//! Services here are written against the store traits in `pawlink-db` and
//! never authenticate on their own: callers pass an explicit [`Actor`].

pub mod actor;
pub mod services;

pub use actor::Actor;
pub use services::*;
