//! Bearer-token gated HTTP service.
//!
//! ```text
//!   request ─▶ request id ─▶ trace ─▶ CORS ─▶ limits ─▶ error responder ─┐
//!                                                                        ▼
//!                 /ping ◀───────────────────────────────────────────── router
//!                 /secure ◀── authentication gate ◀── TokenVerifier ──┤
//!                 static files ─▶ not found ──────────────────────────┘
//! ```
//!
//! The gate never judges tokens itself: it extracts `Bearer <token>` and asks
//! an injected [`auth::TokenVerifier`]. [`auth::JwksVerifier`] is the
//! production authority for OIDC issuers.
//!
//! The [`scan`] module submits static-analysis runs to an external scanner.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod scan;
pub mod security;

pub use auth::{ClaimSet, JwksVerifier, TokenVerifier, VerificationError};
pub use config::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
