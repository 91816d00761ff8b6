//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the gated service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Request size and time limits.
    pub limits: LimitsConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Static asset serving.
    pub static_files: StaticFilesConfig,

    /// Centralized error responder settings.
    pub errors: ErrorsConfig,

    /// Token verification authority.
    pub verifier: VerifierConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Total time allowed for a request/response in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
            request_timeout_secs: 30,
        }
    }
}

/// Cross-origin resource sharing policy.
///
/// The default mirrors a permissive `cors()` setup: every origin is allowed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Inject CORS headers at all.
    pub enabled: bool,

    /// Allowed origins. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub enabled: bool,

    /// Directory served for unmatched GET requests.
    pub dir: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Include full error detail in error bodies. Development only.
    pub verbose: bool,
}

/// Settings for the JWKS-backed access token verifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Authorization server issuer (e.g., "https://example.okta.com/oauth2/default").
    pub issuer: String,

    /// Expected `cid` claim. Not asserted when unset.
    pub client_id: Option<String>,

    /// Claims that must be present with the given value (e.g., `aud`).
    pub assert_claims: BTreeMap<String, String>,

    /// Key set location. Defaults to `<issuer>/v1/keys`.
    pub jwks_uri: Option<String>,

    /// Upper bound on one verification call in milliseconds. 0 disables the bound.
    pub timeout_ms: u64,

    /// Clock skew tolerated on `exp`/`nbf` in seconds.
    pub leeway_secs: u64,

    /// How long a fetched key set is trusted before a refetch.
    pub jwks_cache_secs: u64,

    /// Minimum spacing between two key set fetches.
    pub jwks_refresh_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        let mut assert_claims = BTreeMap::new();
        assert_claims.insert("aud".to_string(), "api://default".to_string());
        Self {
            issuer: String::new(),
            client_id: None,
            assert_claims,
            jwks_uri: None,
            timeout_ms: 5_000,
            leeway_secs: 120,
            jwks_cache_secs: 3_600,
            jwks_refresh_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
