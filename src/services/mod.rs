//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle units of work, validation, and multi-step operations.

pub mod coordinator;

pub use coordinator::Coordinator;
