//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bearer_gate::config::GateConfig;
use bearer_gate::http::HttpServer;
use bearer_gate::lifecycle::Shutdown;
use bearer_gate::{ClaimSet, TokenVerifier, VerificationError};
use tokio::net::TcpListener;

/// Test double for the verification authority. Records every call.
#[derive(Default)]
pub struct RecordingVerifier {
    accepted: HashMap<String, ClaimSet>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(mut self, token: &str, claims: ClaimSet) -> Self {
        self.accepted.insert(token.to_string(), claims);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenVerifier for RecordingVerifier {
    async fn verify_access_token(&self, token: &str) -> Result<ClaimSet, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.accepted
            .get(token)
            .cloned()
            .ok_or_else(|| VerificationError::Rejected(format!("token '{token}' is not valid")))
    }
}

/// A config suitable for tests: no static files, quiet errors.
pub fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.verifier.issuer = "https://idp.example.com/oauth2/default".to_string();
    config.static_files.enabled = false;
    config
}

/// A running gate bound to an ephemeral port.
pub struct TestGate {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGate {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the real server with `verifier` as its authority.
pub async fn start_gate(config: GateConfig, verifier: Arc<dyn TokenVerifier>) -> TestGate {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, verifier);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGate { addr, shutdown }
}

/// HTTP client without pooling or proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
