//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (request id, trace, CORS, limits)
//!     → error.rs (centralized responder wraps everything below)
//!     → router:
//!         /ping   → handlers.rs
//!         /secure → middleware/authentication.rs → handlers.rs
//!         other   → static files → handlers::not_found
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::{AppError, ErrorReport, ErrorResponder, FinalResponse};
pub use middleware::AuthGate;
pub use server::{build_router, HttpServer, ServerError};
