use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::streams::Record;

/// Emitted wrapper around one normalized record: the stream it came from and
/// the wall-clock emission timestamp in epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEnvelope {
    pub stream: String,
    pub data: Record,
    pub emitted_at: i64,
}

impl RecordEnvelope {
    pub fn stamp(stream: &str, data: Record) -> Self {
        Self {
            stream: stream.to_string(),
            data,
            emitted_at: Utc::now().timestamp_millis(),
        }
    }
}
