use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;

use crate::error::{AmpError, Result};

static CONNECTOR_SPEC: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../schemas/config.v1.json"))
        .expect("bundled config schema is valid JSON")
});

static COMPILED_SPEC: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::options()
        .compile(&CONNECTOR_SPEC)
        .expect("bundled config schema compiles")
});

/// The connector's configuration schema, as served by the `spec` command.
pub fn connector_spec() -> Value {
    CONNECTOR_SPEC.clone()
}

/// Connection settings for one AMP workspace.
///
/// Credentials are static for the lifetime of a run; there is no refresh.
#[derive(Clone, Deserialize)]
pub struct ConnectorConfig {
    pub workspace_id: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

// Key material must never reach logs, so Debug is written by hand.
impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("workspace_id", &self.workspace_id)
            .field("region", &self.region)
            .field("access_key", &"***")
            .field("secret_key", &"***")
            .finish()
    }
}

impl ConnectorConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AmpError::Config(format!("failed to read config file '{}': {}", path, e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        validate(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Base URL of the workspace's Prometheus-compatible query endpoint.
    /// Stream paths are appended to this verbatim.
    pub fn base_url(&self) -> String {
        format!(
            "https://aps-workspaces.{}.amazonaws.com/workspaces/{}",
            self.region, self.workspace_id
        )
    }
}

fn validate(instance: &Value) -> Result<()> {
    if let Err(errors) = COMPILED_SPEC.validate(instance) {
        let reasons: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(AmpError::Config(format!(
            "connector config rejected by schema: {}",
            reasons.join("; ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConnectorConfig {
        ConnectorConfig {
            workspace_id: "ws-12345678-abcd-efgh-ijkl-000000000000".to_string(),
            region: "eu-central-1".to_string(),
            access_key: "AKIAEXAMPLE".to_string(),
            secret_key: "wJalrXUtnFEMI/K7MDENG".to_string(),
        }
    }

    #[test]
    fn base_url_embeds_region_and_workspace() {
        assert_eq!(
            sample().base_url(),
            "https://aps-workspaces.eu-central-1.amazonaws.com/workspaces/ws-12345678-abcd-efgh-ijkl-000000000000"
        );
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("wJalrXUtnFEMI"));
        assert!(rendered.contains("eu-central-1"));
    }

    #[test]
    fn rejects_config_missing_required_field() {
        let err = ConnectorConfig::from_json_str(
            r#"{"workspace_id": "ws-1", "region": "us-east-1", "access_key": "a"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("secret_key"));
    }

    #[test]
    fn rejects_unknown_region() {
        let err = ConnectorConfig::from_json_str(
            r#"{"workspace_id": "ws-1", "region": "moon-base-1", "access_key": "a", "secret_key": "b"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AmpError::Config(_)));
    }
}
