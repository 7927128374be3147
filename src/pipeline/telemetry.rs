//! Stage timing reports
//!
//! The pipeline hands every stage's duration and outcome to a
//! [`TelemetrySink`]. Sinks are fire-and-forget: they return nothing and the
//! pipeline never branches on them.

use parking_lot::Mutex;
use std::time::Duration;

use super::context::{RequestContext, Stage};
use crate::error::RejectionKind;

/// How a stage (or a whole request) ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Ok,
    Rejected(RejectionKind),
}

impl StageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageOutcome::Ok => "ok",
            StageOutcome::Rejected(kind) => kind.as_str(),
        }
    }
}

/// Receives pipeline timings
pub trait TelemetrySink: Send + Sync {
    fn record_stage(&self, ctx: &RequestContext, stage: Stage, elapsed: Duration, outcome: StageOutcome);

    /// Called once per request after it reaches a terminal state
    fn record_request(&self, _ctx: &RequestContext, _elapsed: Duration, _outcome: StageOutcome) {}
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn record_stage(&self, _: &RequestContext, _: Stage, _: Duration, _: StageOutcome) {}
}

/// Emits structured `tracing` events: one per stage at debug, one per request
/// at info (warn when rejected).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record_stage(&self, ctx: &RequestContext, stage: Stage, elapsed: Duration, outcome: StageOutcome) {
        tracing::debug!(
            request_id = %ctx.request_id,
            dataset = %ctx.dataset,
            stage = stage.as_str(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            outcome = outcome.as_str(),
            "stage finished"
        );
    }

    fn record_request(&self, ctx: &RequestContext, elapsed: Duration, outcome: StageOutcome) {
        let fields = serde_json::to_string(ctx.fields()).unwrap_or_default();
        match outcome {
            StageOutcome::Ok => tracing::info!(
                request_id = %ctx.request_id,
                dataset = %ctx.dataset,
                duration_ms = elapsed.as_secs_f64() * 1000.0,
                fields = %fields,
                "event accepted"
            ),
            StageOutcome::Rejected(kind) => tracing::warn!(
                request_id = %ctx.request_id,
                dataset = %ctx.dataset,
                duration_ms = elapsed.as_secs_f64() * 1000.0,
                rejection = kind.as_str(),
                fields = %fields,
                "event rejected"
            ),
        }
    }
}

/// One captured stage report
#[derive(Debug, Clone)]
pub struct StageReport {
    pub request_id: String,
    pub stage: Stage,
    pub elapsed: Duration,
    pub outcome: StageOutcome,
}

/// Keeps every report in memory, for tests and local debugging
#[derive(Debug, Default)]
pub struct RecordingSink {
    stages: Mutex<Vec<StageReport>>,
    requests: Mutex<Vec<(String, StageOutcome)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<StageReport> {
        self.stages.lock().clone()
    }

    pub fn requests(&self) -> Vec<(String, StageOutcome)> {
        self.requests.lock().clone()
    }
}

impl TelemetrySink for RecordingSink {
    fn record_stage(&self, ctx: &RequestContext, stage: Stage, elapsed: Duration, outcome: StageOutcome) {
        self.stages.lock().push(StageReport {
            request_id: ctx.request_id.clone(),
            stage,
            elapsed,
            outcome,
        });
    }

    fn record_request(&self, ctx: &RequestContext, _elapsed: Duration, outcome: StageOutcome) {
        self.requests.lock().push((ctx.request_id.clone(), outcome));
    }
}
