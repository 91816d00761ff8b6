//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (cross-origin headers, preflight answers)
//!     → http::middleware::authentication (protected routes only)
//! ```
//!
//! # Design Decisions
//! - Cross-origin policy is configuration, never hardcoded
//! - Allow-all stays the default to match the existing deployment

pub mod cors;

pub use cors::cors_layer;
