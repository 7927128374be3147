//! Read-only credential and dataset registries
//!
//! Both tables are loaded once before the server starts and shared behind
//! `Arc`; nothing mutates them afterwards.

pub mod config;
pub mod dataset;
pub mod team;

pub use config::RegistryConfig;
pub use dataset::{Dataset, DatasetRegistry, DatasetResolver};
pub use team::{CredentialRegistry, CredentialValidator, Team};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Duplicate write key for team '{0}'")]
    DuplicateWriteKey(String),

    #[error("Duplicate dataset name '{0}'")]
    DuplicateDataset(String),

    #[error("Invalid write key pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error reading registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),
}
