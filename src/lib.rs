//! Gatekeeper: Event-Ingestion Gatekeeper
//!
//! A simulated telemetry-intake API. Each submitted event passes through a
//! fixed pipeline and is either appended to a partition log or rejected with
//! a typed reason.
//!
//! # Pipeline
//!
//! - **Sample rate**: optional header, defaults to 1, digits only
//! - **Body**: JSON, optionally gzip-encoded
//! - **Credentials**: alphanumeric write key looked up in an immutable registry
//! - **Dataset**: resolved by name in an immutable registry
//! - **Partition**: chosen uniformly at random from the dataset's partitions
//! - **Schema**: TTL cache that simulates a slow, occasionally flaky backend
//! - **Write**: one JSON line appended to the partition's log
//!
//! # Example
//!
//! ```no_run
//! use gatekeeper::pipeline::{Gatekeeper, IngestRequest};
//! use gatekeeper::registry::RegistryConfig;
//! use gatekeeper::storage::EventWriter;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (credentials, datasets) = RegistryConfig::builtin().build()?;
//! let writer = EventWriter::new("/tmp")?;
//! let gatekeeper = Gatekeeper::new(Arc::new(credentials), Arc::new(datasets), Arc::new(writer));
//!
//! let request = IngestRequest::new("wade", r#"{"duration_ms": 12}"#).with_write_key("abcd123EFGH");
//! let receipt = gatekeeper.submit(request).await?;
//! println!("written to partition {}", receipt.partition);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod sim;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigError, GatekeeperConfig};
pub use error::{GatekeeperError, RejectionKind};
pub use event::Event;
pub use pipeline::{Gatekeeper, IngestRequest, Receipt};
pub use registry::{Dataset, RegistryConfig, Team};
