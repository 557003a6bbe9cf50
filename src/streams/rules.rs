use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::client::AmpClient;
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::streams::{MetadataStream, Record, RULES_STREAM};
use crate::transport::HttpTransport;

const RULES_PATH: &str = "/api/v1/rules";

static SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/rules.v1.json"))
        .expect("bundled rules schema is valid JSON")
});

pub fn json_schema() -> Record {
    SCHEMA.clone()
}

/// Reads the workspace's alerting/recording rule definitions, flattening the
/// group/rule nesting into one record per rule.
pub struct RulesStream {
    client: AmpClient,
}

impl RulesStream {
    pub fn new(config: &ConnectorConfig) -> Self {
        Self {
            client: AmpClient::new(config),
        }
    }

    pub fn with_transport(config: &ConnectorConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: AmpClient::with_transport(config, transport),
        }
    }
}

#[async_trait]
impl MetadataStream for RulesStream {
    fn stream_name(&self) -> &'static str {
        RULES_STREAM
    }

    fn json_schema(&self) -> Record {
        json_schema()
    }

    async fn read_records(&self) -> Result<Vec<Record>> {
        let payload = self.client.get_json(RULES_PATH).await?;
        let groups = payload
            .get("data")
            .and_then(|data| data.get("groups"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut records = Vec::new();
        for group in &groups {
            let Some(rules) = group.get("rules").and_then(Value::as_array) else {
                continue;
            };
            for rule in rules {
                records.push(flatten_rule(rule));
            }
        }
        debug!(groups = groups.len(), rules = records.len(), "fetched rules");
        Ok(records)
    }
}

/// Copy a rule's fields verbatim, hoisting the well-known label and
/// annotation entries to top level. The nested maps stay in the record
/// alongside the hoisted copies.
fn flatten_rule(rule: &Value) -> Record {
    let labels = rule.get("labels").cloned().unwrap_or_else(|| json!({}));
    let annotations = rule.get("annotations").cloned().unwrap_or_else(|| json!({}));
    json!({
        "name": field(rule, "name"),
        "state": field(rule, "state"),
        "query": field(rule, "query"),
        "duration": field(rule, "duration"),
        "keepFiringFor": field(rule, "keepFiringFor"),
        "system": field(&labels, "system"),
        "severity": field(&labels, "severity"),
        "description": field(&annotations, "description"),
        "runbook": field(&annotations, "runbook"),
        "summary": field(&annotations, "summary"),
        "health": field(rule, "health"),
        "lastError": field(rule, "lastError"),
        "type": field(rule, "type"),
        "lastEvaluation": field(rule, "lastEvaluation"),
        "evaluationTime": field(rule, "evaluationTime"),
        "labels": labels,
        "annotations": annotations,
        "alerts": rule.get("alerts").cloned().unwrap_or_else(|| json!([])),
    })
}

fn field(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or(Value::Null)
}
