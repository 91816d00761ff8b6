//! Scanner process invocation.

use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::scan::{ScanConfig, ScanError};

/// Completion callback that discards the outcome.
pub fn ignore_outcome(_: io::Result<ExitStatus>) {}

/// Hands scan configurations to an external scanner executable.
#[derive(Debug, Clone)]
pub struct ScanInvoker {
    scanner: PathBuf,
}

impl ScanInvoker {
    pub fn new(scanner: impl Into<PathBuf>) -> Self {
        Self {
            scanner: scanner.into(),
        }
    }

    /// Scanner arguments, one `-Dkey=value` per property.
    pub fn arguments(config: &ScanConfig) -> Vec<String> {
        config
            .properties()
            .into_iter()
            .map(|(key, value)| format!("-D{key}={value}"))
            .collect()
    }

    pub fn command(&self, config: &ScanConfig) -> Command {
        let mut command = Command::new(&self.scanner);
        command
            .args(Self::arguments(config))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }

    /// Start the scanner and return without waiting for it.
    ///
    /// `on_complete` runs once the scanner exits. The returned handle may be
    /// dropped; awaiting it only matters to keep a short-lived process alive.
    pub fn submit<F>(&self, config: &ScanConfig, on_complete: F) -> Result<JoinHandle<()>, ScanError>
    where
        F: FnOnce(io::Result<ExitStatus>) + Send + 'static,
    {
        config.validate()?;

        let mut child = self
            .command(config)
            .spawn()
            .map_err(|source| ScanError::Spawn {
                scanner: self.scanner.display().to_string(),
                source,
            })?;

        tracing::info!(
            project_key = %config.project_key,
            server_url = %config.server_url,
            "Scan submitted"
        );

        Ok(tokio::spawn(async move {
            let outcome = child.wait().await;
            match &outcome {
                Ok(status) if status.success() => tracing::info!("Scanner finished"),
                Ok(status) => tracing::warn!(status = %status, "Scanner exited with failure"),
                Err(e) => tracing::error!(error = %e, "Failed waiting for scanner"),
            }
            on_complete(outcome);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn config() -> ScanConfig {
        ScanConfig {
            project_key: "bearer-gate".to_string(),
            ..ScanConfig::default()
        }
    }

    #[test]
    fn arguments_are_defines() {
        let args = ScanInvoker::arguments(&config());
        assert_eq!(args[0], "-Dsonar.host.url=http://localhost:9000");
        assert!(args.contains(&"-Dsonar.projectKey=bearer-gate".to_string()));
        assert!(args.contains(&"-Dsonar.sourceEncoding=UTF-8".to_string()));
    }

    #[tokio::test]
    async fn invalid_config_is_not_submitted() {
        let err = ScanInvoker::new("true")
            .submit(&ScanConfig::default(), ignore_outcome)
            .unwrap_err();
        assert!(matches!(err, ScanError::Invalid(_)));
    }

    #[tokio::test]
    async fn missing_scanner_is_spawn_error() {
        let err = ScanInvoker::new("/nonexistent/sonar-scanner")
            .submit(&config(), ignore_outcome)
            .unwrap_err();
        assert!(matches!(err, ScanError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn completion_callback_sees_exit_status() {
        let (tx, rx) = oneshot::channel();
        let handle = ScanInvoker::new("true")
            .submit(&config(), move |outcome| {
                let _ = tx.send(outcome.map(|status| status.success()));
            })
            .unwrap();
        handle.await.unwrap();
        assert!(rx.await.unwrap().unwrap());

        let (tx, rx) = oneshot::channel();
        ScanInvoker::new("false")
            .submit(&config(), move |outcome| {
                let _ = tx.send(outcome.map(|status| status.success()));
            })
            .unwrap();
        assert!(!rx.await.unwrap().unwrap());
    }
}
