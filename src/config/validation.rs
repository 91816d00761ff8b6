//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//! - Reject CORS origin lists that mix the wildcard with explicit origins
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GateConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("cors.allowed_origins: '*' cannot be combined with explicit origins")]
    MixedWildcardOrigin,

    #[error("cors.allowed_origins: invalid origin '{0}'")]
    InvalidOrigin(String),

    #[error("observability.log_level: unknown level '{0}'")]
    InvalidLogLevel(String),
}

/// Check a deserialized configuration for semantic errors.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::Missing { field: "listener.tls.cert_path" });
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::Missing { field: "listener.tls.key_path" });
        }
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_body_size" });
    }
    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "limits.request_timeout_secs" });
    }

    let origins = &config.cors.allowed_origins;
    if origins.iter().any(|o| o == "*") && origins.len() > 1 {
        errors.push(ValidationError::MixedWildcardOrigin);
    }
    for origin in origins.iter().filter(|o| o.as_str() != "*") {
        if Url::parse(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if config.static_files.enabled && config.static_files.dir.is_empty() {
        errors.push(ValidationError::Missing { field: "static_files.dir" });
    }

    if config.verifier.issuer.is_empty() {
        errors.push(ValidationError::Missing { field: "verifier.issuer" });
    } else if Url::parse(&config.verifier.issuer).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: "verifier.issuer",
            value: config.verifier.issuer.clone(),
        });
    }
    if let Some(uri) = &config.verifier.jwks_uri {
        if Url::parse(uri).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: "verifier.jwks_uri",
                value: uri.clone(),
            });
        }
    }
    if config.verifier.jwks_cache_secs == 0 {
        errors.push(ValidationError::Zero { field: "verifier.jwks_cache_secs" });
    }
    if config.verifier.jwks_refresh_secs == 0 {
        errors.push(ValidationError::Zero { field: "verifier.jwks_refresh_secs" });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
