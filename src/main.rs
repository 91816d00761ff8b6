//! bearer-gate server entry point.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bearer_gate::auth::JwksVerifier;
use bearer_gate::config::load_config;
use bearer_gate::http::HttpServer;
use bearer_gate::lifecycle::{signals, Shutdown};
use bearer_gate::net::load_tls_config;
use bearer_gate::observability::{logging, metrics};
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "bearer-gate")]
#[command(about = "HTTP service guarding its API behind bearer-token verification", long_about = None)]
struct Args {
    /// Configuration file (TOML).
    #[arg(short, long, env = "BEARER_GATE_CONFIG", default_value = "bearer-gate.toml")]
    config: PathBuf,

    /// Include full error detail in error responses. Never enable in production.
    #[arg(long)]
    verbose_errors: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if args.verbose_errors {
        config.errors.verbose = true;
    }

    logging::init_logging(&config.observability);
    tracing::info!("bearer-gate v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        path = %args.config.display(),
        bind_address = %config.listener.bind_address,
        issuer = %config.verifier.issuer,
        verbose_errors = config.errors.verbose,
        "Configuration loaded"
    );
    if config.errors.verbose {
        tracing::warn!("Verbose error responses enabled; internal detail will reach clients");
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let verifier = Arc::new(JwksVerifier::from_config(&config.verifier)?);
    tracing::info!(jwks_uri = %verifier.jwks_uri(), "Token verifier ready");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let tls = config.listener.tls.clone();
    let server = HttpServer::new(config, verifier);

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
            server.run_tls(rustls, shutdown.subscribe()).await?;
        }
        None => {
            let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
