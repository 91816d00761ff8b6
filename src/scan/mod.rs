//! Static-analysis scan submission.
//!
//! # Data Flow
//! ```text
//! sonar-project.toml / CLI flags
//!     → config.rs (ScanConfig → ordered sonar.* properties)
//!     → invoker.rs (spawn external scanner, return immediately)
//!     → completion callback (empty by default)
//! ```

pub mod config;
pub mod invoker;

use thiserror::Error;

pub use config::ScanConfig;
pub use invoker::{ignore_outcome, ScanInvoker};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid scan configuration: {0}")]
    Invalid(String),

    #[error("failed to start scanner '{scanner}': {source}")]
    Spawn {
        scanner: String,
        #[source]
        source: std::io::Error,
    },
}
