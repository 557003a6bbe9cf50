use serde::{Deserialize, Serialize};

use crate::streams::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    FullRefresh,
}

/// Static description of one stream: its name, record schema and the sync
/// modes it supports. Produced by discovery without any network access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    pub json_schema: Record,
    pub supported_sync_modes: Vec<SyncMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<StreamDescriptor>,
}

/// Outcome of the connectivity check. A failure carries the text of whatever
/// error was raised while pulling from the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Succeeded,
    Failed { message: String },
}
