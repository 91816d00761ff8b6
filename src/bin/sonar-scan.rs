use std::path::PathBuf;

use bearer_gate::scan::{ignore_outcome, ScanConfig, ScanInvoker};
use clap::Parser;

#[derive(Parser)]
#[command(name = "sonar-scan")]
#[command(about = "Submit a static-analysis run to a SonarQube server", long_about = None)]
struct Cli {
    /// Scan configuration (TOML).
    #[arg(short, long, default_value = "sonar-project.toml")]
    config: PathBuf,

    /// Scanner executable.
    #[arg(long, env = "SONAR_SCANNER", default_value = "sonar-scanner")]
    scanner: PathBuf,

    /// Override the analysis server address.
    #[arg(long)]
    server_url: Option<String>,

    /// Override the project version.
    #[arg(long)]
    project_version: Option<String>,

    /// Print the scanner properties instead of submitting.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bearer_gate=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ScanConfig::load(&cli.config)?;
    if let Some(server_url) = cli.server_url {
        config.server_url = server_url;
    }
    if let Some(version) = cli.project_version {
        config.project_version = version;
    }

    if cli.dry_run {
        config.validate()?;
        for (key, value) in config.properties() {
            println!("{key}={value}");
        }
        return Ok(());
    }

    let handle = ScanInvoker::new(cli.scanner).submit(&config, ignore_outcome)?;
    // Nothing consumes the outcome; waiting only keeps the scanner's parent alive.
    handle.await?;
    Ok(())
}
