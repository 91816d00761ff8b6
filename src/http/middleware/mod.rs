//! Request middleware.

pub mod authentication;

pub use authentication::{authentication_required, AuthGate, GateRejection};
