use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::client::AmpClient;
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::streams::{MetadataStream, Record, METRIC_NAMES_STREAM};
use crate::transport::HttpTransport;

const METRIC_NAMES_PATH: &str = "/api/v1/label/__name__/values";

static SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/metric_names.v1.json"))
        .expect("bundled metric names schema is valid JSON")
});

pub fn json_schema() -> Record {
    SCHEMA.clone()
}

/// Reads the workspace's metric name catalog, one record per name.
pub struct MetricNamesStream {
    client: AmpClient,
}

impl MetricNamesStream {
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
impl MetadataStream for MetricNamesStream {
    fn stream_name(&self) -> &'static str {
        METRIC_NAMES_STREAM
    }

    fn json_schema(&self) -> Record {
        json_schema()
    }

    async fn read_records(&self) -> Result<Vec<Record>> {
        let payload = self.client.get_json(METRIC_NAMES_PATH).await?;
        // A workspace with no series has no "data" key; that is an empty
        // stream, not an error.
        let names = payload
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        debug!(count = names.len(), "fetched metric names");
        Ok(names
            .into_iter()
            .map(|name| json!({ "metric_name": name }))
            .collect())
    }
}
