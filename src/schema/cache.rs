//! TTL schema cache with simulated backend latency and fault injection
//!
//! The refresh timestamp is an atomic. A stale read and its refresh mark are
//! one compare-and-swap, so when many requests arrive just after expiry only
//! the CAS winner waits out the simulated backend call; everyone else is
//! served as a hit against the freshly claimed window.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::GatekeeperError;
use crate::registry::Dataset;
use crate::sim::{Clock, Latency, RandomSource, SystemClock, ThreadRandom, TokioLatency};

/// Refresh timestamp not yet initialized
const UNSET: i64 = i64::MIN;

/// Key used for the shared entry in [`CacheScope::Global`]
const GLOBAL_KEY: &str = "";

/// How refresh timestamps are shared between datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// One timestamp for the whole process
    Global,
    /// One timestamp per dataset name
    PerDataset,
}

impl std::str::FromStr for CacheScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(CacheScope::Global),
            "dataset" | "per_dataset" | "per-dataset" => Ok(CacheScope::PerDataset),
            other => Err(format!("unknown cache scope '{}'", other)),
        }
    }
}

/// Policy knobs for the simulated cache
#[derive(Debug, Clone)]
pub struct SchemaCacheConfig {
    pub ttl: Duration,
    /// Simulated backend latency is drawn uniformly from `latency_min..=latency_max`
    pub latency_min: Duration,
    pub latency_max: Duration,
    /// Fail one call in this many on average. Zero disables fault injection.
    pub fault_one_in: u64,
    pub scope: CacheScope,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10),
            latency_min: Duration::from_millis(30),
            latency_max: Duration::from_millis(50),
            fault_one_in: 60,
            scope: CacheScope::Global,
        }
    }
}

impl SchemaCacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.latency_min = min;
        self.latency_max = max.max(min);
        self
    }

    pub fn with_fault_one_in(mut self, fault_one_in: u64) -> Self {
        self.fault_one_in = fault_one_in;
        self
    }

    pub fn with_scope(mut self, scope: CacheScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Result of a successful schema check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaCheck {
    pub hit: bool,
    /// Simulated backend wait paid by this call (zero on a hit)
    pub latency: Duration,
}

/// Process-wide schema cache
pub struct SchemaCache {
    config: SchemaCacheConfig,
    /// Last refresh time (epoch ms) per scope key
    refreshed: DashMap<String, Arc<AtomicI64>>,
    clock: Arc<dyn Clock>,
    latency: Arc<dyn Latency>,
    random: Arc<dyn RandomSource>,
    hits: AtomicU64,
    misses: AtomicU64,
    faults: AtomicU64,
}

impl SchemaCache {
    /// Cache with default policy, wall clock, tokio sleep and thread RNG
    pub fn new() -> Self {
        Self::with_config(SchemaCacheConfig::default())
    }

    pub fn with_config(config: SchemaCacheConfig) -> Self {
        Self::with_sources(
            config,
            Arc::new(SystemClock),
            Arc::new(TokioLatency),
            Arc::new(ThreadRandom),
        )
    }

    pub fn with_sources(
        config: SchemaCacheConfig,
        clock: Arc<dyn Clock>,
        latency: Arc<dyn Latency>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            config,
            refreshed: DashMap::new(),
            clock,
            latency,
            random,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            faults: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SchemaCacheConfig {
        &self.config
    }

    fn slot(&self, dataset: &Dataset) -> Arc<AtomicI64> {
        let key = match self.config.scope {
            CacheScope::Global => GLOBAL_KEY,
            CacheScope::PerDataset => dataset.name.as_str(),
        };

        if let Some(slot) = self.refreshed.get(key) {
            return Arc::clone(&slot);
        }
        let slot = self
            .refreshed
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AtomicI64::new(UNSET)));
        Arc::clone(&slot)
    }

    /// Returns true if this caller won the right to refresh
    fn claim_refresh(&self, slot: &AtomicI64, now: i64) -> bool {
        let last = slot.load(Ordering::SeqCst);

        if last == UNSET {
            // First sighting starts the window without counting as a miss.
            // Losing this race just means someone else started it.
            let _ = slot.compare_exchange(UNSET, now, Ordering::SeqCst, Ordering::SeqCst);
            return false;
        }

        let ttl_ms = i64::try_from(self.config.ttl.as_millis()).unwrap_or(i64::MAX);
        if now.saturating_sub(last) <= ttl_ms {
            return false;
        }

        slot.compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn draw_latency(&self) -> Duration {
        let min = u64::try_from(self.config.latency_min.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.config.latency_max.as_millis())
            .unwrap_or(u64::MAX)
            .max(min);
        let span = (max - min).saturating_add(1);
        Duration::from_millis(min.saturating_add(self.random.below(span)))
    }

    /// Look up the dataset schema.
    ///
    /// On a stale window the winning caller waits out a simulated backend
    /// call before the window is marked fresh. Independently of hit or miss,
    /// every call may fail with an injected `SchemaLookupFailure`.
    pub async fn check_schema(&self, dataset: &Dataset) -> Result<SchemaCheck, GatekeeperError> {
        let slot = self.slot(dataset);
        let now = self.clock.now_ms();

        let check = if self.claim_refresh(&slot, now) {
            self.misses.fetch_add(1, Ordering::Relaxed);

            let wait = self.draw_latency();
            tracing::debug!(
                "Schema cache miss for '{}', simulating {:?} backend call",
                dataset.name,
                wait
            );
            self.latency.pause(wait).await;
            // Window starts once the backend has answered
            slot.fetch_max(self.clock.now_ms(), Ordering::SeqCst);

            SchemaCheck {
                hit: false,
                latency: wait,
            }
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            SchemaCheck {
                hit: true,
                latency: Duration::ZERO,
            }
        };

        if self.config.fault_one_in > 0 && self.random.below(self.config.fault_one_in) == 0 {
            self.faults.fetch_add(1, Ordering::Relaxed);
            return Err(GatekeeperError::SchemaLookupFailure(dataset.name.clone()));
        }

        Ok(check)
    }

    /// Get cache statistics
    pub fn stats(&self) -> SchemaCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        SchemaCacheStats {
            hits,
            misses,
            injected_faults: self.faults.load(Ordering::Relaxed),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
            entry_count: self.refreshed.len(),
            ttl_secs: self.config.ttl.as_secs(),
            scope: self.config.scope,
        }
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct SchemaCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub injected_faults: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
    /// Number of refresh windows tracked
    pub entry_count: usize,
    pub ttl_secs: u64,
    pub scope: CacheScope,
}
