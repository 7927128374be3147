pub mod context;
pub mod gatekeeper;
pub mod telemetry;

pub use context::{PipelineState, RequestContext, Stage};
pub use gatekeeper::{Gatekeeper, IngestRequest, Receipt};
pub use telemetry::{NoopSink, RecordingSink, StageOutcome, TelemetrySink, TracingSink};
