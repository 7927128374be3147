//! Per-request context threaded explicitly through every pipeline stage

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::error::RejectionKind;

/// Where a request is in the gatekeeper state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Received,
    Authenticated,
    DatasetResolved,
    PartitionChosen,
    SchemaValidated,
    Written,
    Rejected(RejectionKind),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Written | PipelineState::Rejected(_))
    }
}

/// Timed pipeline steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ParseSampleRate,
    ParseBody,
    Authenticate,
    ResolveDataset,
    ChoosePartition,
    NormalizeTimestamp,
    CheckSchema,
    WriteEvent,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ParseSampleRate => "parse_sample_rate",
            Stage::ParseBody => "parse_body",
            Stage::Authenticate => "authenticate",
            Stage::ResolveDataset => "resolve_dataset",
            Stage::ChoosePartition => "choose_partition",
            Stage::NormalizeTimestamp => "normalize_timestamp",
            Stage::CheckSchema => "check_schema",
            Stage::WriteEvent => "write_event",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic state for one request: identity, progress, and the fields
/// stages attach for telemetry (team, partition, time drift, cache hit...).
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub dataset: String,
    pub state: PipelineState,
    started: Instant,
    fields: BTreeMap<&'static str, serde_json::Value>,
}

impl RequestContext {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            request_id: format!("{:016x}", rand::random::<u64>()),
            dataset: dataset.into(),
            state: PipelineState::Received,
            started: Instant::now(),
            fields: BTreeMap::new(),
        }
    }

    pub fn add_field(&mut self, key: &'static str, value: impl Into<serde_json::Value>) {
        self.fields.insert(key, value.into());
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<&'static str, serde_json::Value> {
        &self.fields
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
