//! Registry documents
//!
//! A registry file is JSON:
//!
//! ```json
//! {
//!   "teams": [{"id": 1, "name": "RPO", "write_key": "abcd123EFGH"}],
//!   "datasets": [{"id": 1, "name": "wade", "partitions": [1, 2, 3]}]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CredentialRegistry, Dataset, DatasetRegistry, RegistryError, Team};

/// Unvalidated registry contents, as loaded from disk or built in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

impl RegistryConfig {
    /// The demo tenants and datasets served when no registry file is given
    pub fn builtin() -> Self {
        Self {
            teams: vec![
                Team::new(1, "RPO", "abcd123EFGH"),
                Team::new(2, "b&w", "ijkl456MNOP"),
                Team::new(3, "Third", "qrst789UVWX"),
            ],
            datasets: vec![
                Dataset::new(1, "wade", vec![1, 2, 3]),
                Dataset::new(2, "james", vec![1, 2, 4]),
                Dataset::new(3, "helen", vec![1, 3, 4]),
                Dataset::new(4, "peter", vec![1, 2, 4]),
                Dataset::new(5, "valentine", vec![1, 3, 4]),
                Dataset::new(6, "andrew", vec![2, 3, 4]),
            ],
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self, RegistryError> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_json(&data)
    }

    /// Validate and freeze into the two lookup tables
    pub fn build(self) -> Result<(CredentialRegistry, DatasetRegistry), RegistryError> {
        let credentials = CredentialRegistry::new(self.teams)?;
        let datasets = DatasetRegistry::new(self.datasets)?;

        let empty: Vec<&str> = datasets
            .datasets()
            .iter()
            .filter(|d| !d.has_partitions())
            .map(|d| d.name.as_str())
            .collect();
        if !empty.is_empty() {
            tracing::warn!("Datasets without partitions will refuse writes: {:?}", empty);
        }

        Ok((credentials, datasets))
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::builtin()
    }
}
