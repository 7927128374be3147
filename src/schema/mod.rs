//! Simulated schema lookups
//!
//! A real intake service validates events against a dataset schema held in a
//! slow backing store. This module stands in for that with a TTL cache that
//! pays a randomized latency on expiry and fails a small fraction of calls.

pub mod cache;

pub use cache::{CacheScope, SchemaCache, SchemaCacheConfig, SchemaCacheStats, SchemaCheck};
