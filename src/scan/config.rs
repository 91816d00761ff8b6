//! Scan configuration record.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::scan::ScanError;

/// Everything the scanner needs to analyse one project.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Analysis server address (e.g., "http://sonar.internal:9000").
    pub server_url: String,

    /// Source root, relative to the working directory.
    pub sources: String,

    /// LCOV coverage report location.
    pub lcov_report_paths: String,

    pub language: String,

    pub source_encoding: String,

    pub project_key: String,

    pub project_version: String,

    /// Additional `sonar.*` properties, passed through unchanged.
    pub extra: BTreeMap<String, String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9000".to_string(),
            sources: ".".to_string(),
            lcov_report_paths: "coverage/lcov.info".to_string(),
            language: "js".to_string(),
            source_encoding: "UTF-8".to_string(),
            project_key: String::new(),
            project_version: "1.0".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl ScanConfig {
    /// Load a scan configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.project_key.is_empty() {
            return Err(ScanError::Invalid("project_key is required".to_string()));
        }
        Url::parse(&self.server_url)
            .map_err(|e| ScanError::Invalid(format!("server_url '{}': {e}", self.server_url)))?;
        if let Some(key) = self.extra.keys().find(|key| !key.starts_with("sonar.")) {
            return Err(ScanError::Invalid(format!("extra property '{key}' is not a sonar.* key")));
        }
        Ok(())
    }

    /// Scanner properties in submission order.
    pub fn properties(&self) -> Vec<(String, String)> {
        let mut properties = vec![
            ("sonar.host.url".to_string(), self.server_url.clone()),
            ("sonar.sources".to_string(), self.sources.clone()),
            (
                "sonar.javascript.lcov.reportPaths".to_string(),
                self.lcov_report_paths.clone(),
            ),
            ("sonar.language".to_string(), self.language.clone()),
            ("sonar.sourceEncoding".to_string(), self.source_encoding.clone()),
            ("sonar.projectKey".to_string(), self.project_key.clone()),
            ("sonar.projectVersion".to_string(), self.project_version.clone()),
        ];
        properties.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScanConfig {
        ScanConfig {
            server_url: "http://sonar.internal:9000".to_string(),
            project_key: "node-graphql".to_string(),
            ..ScanConfig::default()
        }
    }

    #[test]
    fn properties_in_order() {
        let properties = sample().properties();
        let keys: Vec<&str> = properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "sonar.host.url",
                "sonar.sources",
                "sonar.javascript.lcov.reportPaths",
                "sonar.language",
                "sonar.sourceEncoding",
                "sonar.projectKey",
                "sonar.projectVersion",
            ]
        );
        assert_eq!(properties[2].1, "coverage/lcov.info");
        assert_eq!(properties[5].1, "node-graphql");
        assert_eq!(properties[6].1, "1.0");
    }

    #[test]
    fn extras_follow_standard_properties() {
        let mut config = sample();
        config.extra.insert("sonar.exclusions".to_string(), "node_modules/**".to_string());
        let properties = config.properties();
        assert_eq!(
            properties.last(),
            Some(&("sonar.exclusions".to_string(), "node_modules/**".to_string()))
        );
    }

    #[test]
    fn validation() {
        assert!(sample().validate().is_ok());
        assert!(matches!(ScanConfig::default().validate(), Err(ScanError::Invalid(_))));

        let mut config = sample();
        config.server_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.extra.insert("exclusions".to_string(), "x".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_toml() {
        let config: ScanConfig = toml::from_str(
            r#"
            server_url = "http://sonar.internal:9000"
            project_key = "bearer-gate"

            [extra]
            "sonar.exclusions" = "target/**"
            "#,
        )
        .unwrap();
        assert_eq!(config.project_key, "bearer-gate");
        assert_eq!(config.sources, ".");
        assert_eq!(config.extra.len(), 1);
    }
}
