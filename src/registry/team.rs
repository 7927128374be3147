//! Teams and write-key authentication

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::RegistryError;
use crate::error::GatekeeperError;

/// Write keys are only letters and numbers
pub const WRITE_KEY_PATTERN: &str = "^[A-Za-z0-9]+$";

/// Tenant authorized by a write key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub write_key: String,
}

impl Team {
    pub fn new(id: u64, name: impl Into<String>, write_key: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            write_key: write_key.into(),
        }
    }
}

/// Authenticates a write key into a team
pub trait CredentialValidator: Send + Sync {
    fn authenticate(&self, write_key: &str) -> Result<Arc<Team>, GatekeeperError>;
}

/// Immutable write-key → team table, built once at startup
#[derive(Debug)]
pub struct CredentialRegistry {
    /// Registry order is preserved
    teams: Vec<Arc<Team>>,
    pattern: Regex,
}

impl CredentialRegistry {
    /// Build a registry. Write keys must be unique.
    pub fn new(teams: Vec<Team>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for team in &teams {
            if !seen.insert(team.write_key.as_str()) {
                return Err(RegistryError::DuplicateWriteKey(team.name.clone()));
            }
        }

        Ok(Self {
            teams: teams.into_iter().map(Arc::new).collect(),
            pattern: Regex::new(WRITE_KEY_PATTERN)?,
        })
    }

    /// Check a write key's shape without consulting the table
    pub fn is_well_formed(&self, write_key: &str) -> bool {
        self.pattern.is_match(write_key)
    }

    pub fn teams(&self) -> &[Arc<Team>] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

impl CredentialValidator for CredentialRegistry {
    fn authenticate(&self, write_key: &str) -> Result<Arc<Team>, GatekeeperError> {
        if !self.is_well_formed(write_key) {
            return Err(GatekeeperError::AuthMalformed);
        }

        // Here a real service would hit the account database
        self.teams
            .iter()
            .find(|team| team.write_key == write_key)
            .cloned()
            .ok_or(GatekeeperError::AuthUnknown)
    }
}
