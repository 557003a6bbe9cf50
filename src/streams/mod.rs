use std::fmt;

use async_trait::async_trait;

use crate::error::{AmpError, Result};

pub mod metric_names;
pub mod rules;

pub use metric_names::MetricNamesStream;
pub use rules::RulesStream;

/// Raw record payload as emitted to the downstream harness. Field values are
/// copied verbatim from the API response, so records stay schemaless here.
pub type Record = serde_json::Value;

pub const METRIC_NAMES_STREAM: &str = "MetricNames";
pub const RULES_STREAM: &str = "Rules";

/// One metadata stream of the workspace. Each `read_records` call issues a
/// fresh signed request and materializes that response's records.
#[async_trait]
pub trait MetadataStream: Send + Sync {
    /// Stream name as tagged on emitted envelopes.
    fn stream_name(&self) -> &'static str;

    /// JSON Schema describing this stream's records.
    fn json_schema(&self) -> Record;

    async fn read_records(&self) -> Result<Vec<Record>>;
}

/// The closed set of streams this source supports. Resolving a name outside
/// this set is a configuration error, not a silent skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    MetricNames,
    Rules,
}

impl StreamKind {
    /// Declaration order is read order.
    pub const ALL: [StreamKind; 2] = [StreamKind::MetricNames, StreamKind::Rules];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::MetricNames => METRIC_NAMES_STREAM,
            StreamKind::Rules => RULES_STREAM,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            METRIC_NAMES_STREAM => Ok(StreamKind::MetricNames),
            RULES_STREAM => Ok(StreamKind::Rules),
            other => Err(AmpError::UnknownStream(other.to_string())),
        }
    }

    pub fn json_schema(&self) -> Record {
        match self {
            StreamKind::MetricNames => metric_names::json_schema(),
            StreamKind::Rules => rules::json_schema(),
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
