//! Network layer subsystem.
//!
//! Plain TCP listeners come straight from Tokio; this module only adds the
//! optional TLS termination.

pub mod tls;

pub use tls::load_tls_config;
