//! Partition selection for incoming events
//!
//! Picks one partition uniformly at random from the dataset's partition list.

use std::sync::Arc;

use crate::error::GatekeeperError;
use crate::registry::Dataset;
use crate::sim::{RandomSource, ThreadRandom};

/// Chooses the partition an event will be appended to
#[derive(Clone)]
pub struct PartitionSelector {
    random: Arc<dyn RandomSource>,
}

impl PartitionSelector {
    /// Selector backed by the thread RNG
    pub fn new() -> Self {
        Self::with_random(Arc::new(ThreadRandom))
    }

    pub fn with_random(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Pick a member of `dataset.partitions`
    pub fn choose(&self, dataset: &Dataset) -> Result<u32, GatekeeperError> {
        let partitions = &dataset.partitions;
        if partitions.is_empty() {
            return Err(GatekeeperError::NoPartitionsAvailable(dataset.name.clone()));
        }

        let idx = self.random.below(partitions.len() as u64) as usize;
        Ok(partitions[idx])
    }
}

impl Default for PartitionSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PartitionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionSelector").finish_non_exhaustive()
    }
}
