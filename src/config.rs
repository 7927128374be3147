//! Process configuration from environment variables
//!
//! - GATEKEEPER_HOST: Bind address (default: 0.0.0.0)
//! - GATEKEEPER_PORT: Port number (default: 8080)
//! - GATEKEEPER_LOG_DIR: Directory for partition logs (default: /tmp)
//! - GATEKEEPER_FSYNC: Sync each append to disk (default: false)
//! - GATEKEEPER_REGISTRY: JSON registry file (default: built-in demo registry)
//! - GATEKEEPER_SCHEMA_TTL_SECS: Schema cache window (default: 10)
//! - GATEKEEPER_SCHEMA_FAULT_ONE_IN: Injected fault odds, 0 disables (default: 60)
//! - GATEKEEPER_SCHEMA_LATENCY_MS: Simulated backend latency, `min-max` or a single value (default: 30-50)
//! - GATEKEEPER_SCHEMA_CACHE_SCOPE: `global` or `dataset` (default: global)
//! - GATEKEEPER_SEED: Seed partition choice and fault injection for reproducible runs

use std::path::PathBuf;
use std::time::Duration;

use crate::schema::{CacheScope, SchemaCacheConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    pub host: String,
    pub port: u16,
    pub log_dir: PathBuf,
    pub sync_on_write: bool,
    pub registry_path: Option<PathBuf>,
    pub schema: SchemaCacheConfig,
    pub seed: Option<u64>,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_dir: PathBuf::from("/tmp"),
            sync_on_write: false,
            registry_path: None,
            schema: SchemaCacheConfig::default(),
            seed: None,
        }
    }
}

impl GatekeeperConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("GATEKEEPER_HOST") {
            config.host = host;
        }
        if let Some(port) = get("GATEKEEPER_PORT") {
            config.port = parse_var("GATEKEEPER_PORT", &port)?;
        }
        if let Some(dir) = get("GATEKEEPER_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(fsync) = get("GATEKEEPER_FSYNC") {
            config.sync_on_write = parse_bool("GATEKEEPER_FSYNC", &fsync)?;
        }
        config.registry_path = get("GATEKEEPER_REGISTRY").map(PathBuf::from);

        if let Some(ttl) = get("GATEKEEPER_SCHEMA_TTL_SECS") {
            let secs: u64 = parse_var("GATEKEEPER_SCHEMA_TTL_SECS", &ttl)?;
            config.schema.ttl = Duration::from_secs(secs);
        }
        if let Some(odds) = get("GATEKEEPER_SCHEMA_FAULT_ONE_IN") {
            config.schema.fault_one_in = parse_var("GATEKEEPER_SCHEMA_FAULT_ONE_IN", &odds)?;
        }
        if let Some(range) = get("GATEKEEPER_SCHEMA_LATENCY_MS") {
            let (min, max) = parse_latency_range(&range)?;
            config.schema.latency_min = min;
            config.schema.latency_max = max;
        }
        if let Some(scope) = get("GATEKEEPER_SCHEMA_CACHE_SCOPE") {
            config.schema.scope = scope.parse::<CacheScope>().map_err(|reason| ConfigError::Invalid {
                var: "GATEKEEPER_SCHEMA_CACHE_SCOPE",
                value: scope.clone(),
                reason,
            })?;
        }
        if let Some(seed) = get("GATEKEEPER_SEED") {
            config.seed = Some(parse_var("GATEKEEPER_SEED", &seed)?);
        }

        Ok(config)
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

/// `30-50` or `40`
fn parse_latency_range(value: &str) -> Result<(Duration, Duration), ConfigError> {
    const VAR: &str = "GATEKEEPER_SCHEMA_LATENCY_MS";

    let (min, max) = match value.split_once('-') {
        Some((min, max)) => (parse_var::<u64>(VAR, min)?, parse_var::<u64>(VAR, max)?),
        None => {
            let ms = parse_var::<u64>(VAR, value)?;
            (ms, ms)
        }
    };

    if max < min {
        return Err(ConfigError::Invalid {
            var: VAR,
            value: value.to_string(),
            reason: "max is below min".to_string(),
        });
    }

    Ok((Duration::from_millis(min), Duration::from_millis(max)))
}
