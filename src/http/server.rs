//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, limits, error responder)
//! - Guard protected routes with the authentication gate
//! - Serve static assets ahead of the not-found fallback
//! - Bind to a listener, plain or TLS, with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    handler::HandlerWithoutStateExt,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::TokenVerifier;
use crate::config::GateConfig;
use crate::http::error::{handle_panic, respond_to_errors, ErrorResponder};
use crate::http::handlers;
use crate::http::middleware::{authentication_required, AuthGate};
use crate::lifecycle::shutdown;
use crate::security::cors_layer;

/// Time in-flight TLS connections get to finish after shutdown.
const TLS_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the gated service.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
}

impl HttpServer {
    /// Create a new HTTP server. `verifier` judges every token presented to
    /// protected routes.
    pub fn new(config: GateConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        let router = build_router(&config, verifier);
        Self { router, config }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on the configured bind address until `shutdown` fires.
    pub async fn run_tls(
        self,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr: SocketAddr = self.config.listener.bind_address.parse()?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let signal = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            signal.graceful_shutdown(Some(TLS_GRACE_PERIOD));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &GateConfig, verifier: Arc<dyn TokenVerifier>) -> Router {
    let verification_timeout = (config.verifier.timeout_ms > 0)
        .then(|| Duration::from_millis(config.verifier.timeout_ms));
    let gate = AuthGate::new(verifier).with_timeout(verification_timeout);

    let protected = Router::new()
        .route("/secure", get(handlers::secure))
        .route_layer(middleware::from_fn_with_state(gate, authentication_required));

    let router = Router::new()
        .route("/ping", get(handlers::ping))
        .merge(protected)
        .method_not_allowed_fallback(handlers::method_not_allowed);

    let router = if config.static_files.enabled {
        let assets = ServeDir::new(&config.static_files.dir)
            .call_fallback_on_method_not_allowed(true)
            .not_found_service(handlers::not_found.into_service());
        router.fallback_service(assets)
    } else {
        router.fallback(handlers::not_found)
    };

    with_middleware(router, config)
}

/// Wrap routes in the service-wide layers.
///
/// Outermost first: request id, trace, CORS, error responder, timeout, body
/// limit, panic capture. CORS runs inside the trace span so preflights and
/// rejected requests are logged with their request id. Everything that can
/// fail a request sits inside the error responder.
#[allow(deprecated)]
fn with_middleware(router: Router, config: &GateConfig) -> Router {
    let router = router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_timeout_secs)))
        .layer(middleware::from_fn_with_state(
            ErrorResponder::new(config.errors.verbose),
            respond_to_errors,
        ));

    let router = match cors_layer(&config.cors) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
