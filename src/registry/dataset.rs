//! Datasets and name resolution

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::RegistryError;
use crate::error::GatekeeperError;

/// Named destination for events, backed by one or more partitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: u64,
    pub name: String,
    /// Ordered partition ids. May be empty, in which case writes are refused.
    #[serde(default)]
    pub partitions: Vec<u32>,
}

impl Dataset {
    pub fn new(id: u64, name: impl Into<String>, partitions: Vec<u32>) -> Self {
        Self {
            id,
            name: name.into(),
            partitions,
        }
    }

    pub fn has_partitions(&self) -> bool {
        !self.partitions.is_empty()
    }
}

/// Looks up a dataset by name
pub trait DatasetResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<Arc<Dataset>, GatekeeperError>;
}

/// Immutable dataset table, built once at startup
#[derive(Debug)]
pub struct DatasetRegistry {
    datasets: Vec<Arc<Dataset>>,
    by_name: HashMap<String, usize>,
}

impl DatasetRegistry {
    /// Build a registry. Dataset names must be unique.
    pub fn new(datasets: Vec<Dataset>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(datasets.len());
        for (idx, dataset) in datasets.iter().enumerate() {
            if by_name.insert(dataset.name.clone(), idx).is_some() {
                return Err(RegistryError::DuplicateDataset(dataset.name.clone()));
            }
        }

        Ok(Self {
            datasets: datasets.into_iter().map(Arc::new).collect(),
            by_name,
        })
    }

    pub fn datasets(&self) -> &[Arc<Dataset>] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl DatasetResolver for DatasetRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<Dataset>, GatekeeperError> {
        self.by_name
            .get(name)
            .map(|&idx| Arc::clone(&self.datasets[idx]))
            .ok_or_else(|| GatekeeperError::DatasetNotFound(name.to_string()))
    }
}
