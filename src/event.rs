//! Events as they move through the pipeline and land in partition logs

use serde::{Deserialize, Serialize};

/// One submitted event. Fields are filled in stage by stage; once written
/// the same shape is what a partition log line decodes back into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub write_key: String,
    /// Epoch milliseconds. `None` until the pipeline normalizes it.
    pub timestamp: Option<i64>,
    pub sample_rate: u64,
    pub payload: serde_json::Value,
    pub chosen_partition: Option<u32>,
}

impl Event {
    pub fn new(write_key: impl Into<String>, sample_rate: u64, payload: serde_json::Value) -> Self {
        Self {
            write_key: write_key.into(),
            timestamp: None,
            sample_rate,
            payload,
            chosen_partition: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<i64>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_partition(mut self, partition: u32) -> Self {
        self.chosen_partition = Some(partition);
        self
    }
}
