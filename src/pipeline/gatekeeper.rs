//! The gatekeeper pipeline
//!
//! Sequence per request, short-circuiting on the first failure:
//!
//! 1. sample rate header (default `1`)
//! 2. JSON body (gunzipped first when declared)
//! 3. write key authentication
//! 4. dataset resolution
//! 5. partition choice
//! 6. timestamp normalization
//! 7. schema check
//! 8. append to the partition log

use flate2::read::GzDecoder;
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::context::{PipelineState, RequestContext, Stage};
use super::telemetry::{StageOutcome, TelemetrySink, TracingSink};
use crate::error::GatekeeperError;
use crate::event::Event;
use crate::registry::{CredentialValidator, DatasetResolver};
use crate::schema::SchemaCache;
use crate::sim::{Clock, SystemClock};
use crate::storage::{EventWriter, PartitionSelector};

/// Sample rate used when the header is absent or empty
pub const DEFAULT_SAMPLE_RATE: &str = "1";

/// A write request, already pulled off the transport
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub dataset: String,
    pub write_key: Option<String>,
    /// Integer epoch milliseconds or RFC 3339
    pub event_time: Option<String>,
    pub sample_rate: Option<String>,
    pub content_encoding: Option<String>,
    pub body: Vec<u8>,
}

impl IngestRequest {
    pub fn new(dataset: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            dataset: dataset.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_write_key(mut self, write_key: impl Into<String>) -> Self {
        self.write_key = Some(write_key.into());
        self
    }

    pub fn with_event_time(mut self, event_time: impl Into<String>) -> Self {
        self.event_time = Some(event_time.into());
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: impl Into<String>) -> Self {
        self.sample_rate = Some(sample_rate.into());
        self
    }

    pub fn with_content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(encoding.into());
        self
    }
}

/// What an accepted request produced
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub request_id: String,
    pub team_id: u64,
    pub dataset: String,
    pub partition: u32,
    pub timestamp: i64,
    pub schema_cache_hit: bool,
}

/// Orchestrates validation, routing and persistence of submitted events
pub struct Gatekeeper {
    credentials: Arc<dyn CredentialValidator>,
    datasets: Arc<dyn DatasetResolver>,
    selector: PartitionSelector,
    schema: Arc<SchemaCache>,
    writer: Arc<EventWriter>,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
}

impl Gatekeeper {
    /// Pipeline with the default selector, schema cache, tracing telemetry
    /// and wall clock
    pub fn new(
        credentials: Arc<dyn CredentialValidator>,
        datasets: Arc<dyn DatasetResolver>,
        writer: Arc<EventWriter>,
    ) -> Self {
        Self {
            credentials,
            datasets,
            selector: PartitionSelector::new(),
            schema: Arc::new(SchemaCache::new()),
            writer,
            telemetry: Arc::new(TracingSink),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_selector(mut self, selector: PartitionSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_schema_cache(mut self, schema: Arc<SchemaCache>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn schema_cache(&self) -> &SchemaCache {
        &self.schema
    }

    pub fn writer(&self) -> &EventWriter {
        &self.writer
    }

    /// Run one request through the pipeline
    pub async fn submit(&self, request: IngestRequest) -> Result<Receipt, GatekeeperError> {
        let mut ctx = RequestContext::new(request.dataset.clone());

        let result = self.run(&mut ctx, request).await;

        let outcome = match &result {
            Ok(_) => {
                ctx.state = PipelineState::Written;
                StageOutcome::Ok
            }
            Err(e) => {
                ctx.state = PipelineState::Rejected(e.kind());
                ctx.add_field("error", e.to_string());
                StageOutcome::Rejected(e.kind())
            }
        };
        self.telemetry.record_request(&ctx, ctx.elapsed(), outcome);

        result
    }

    async fn run(
        &self,
        ctx: &mut RequestContext,
        request: IngestRequest,
    ) -> Result<Receipt, GatekeeperError> {
        let sample_rate = self.stage(ctx, Stage::ParseSampleRate, |ctx| {
            let rate = parse_sample_rate(request.sample_rate.as_deref())?;
            ctx.add_field("sample_rate", rate);
            Ok(rate)
        })?;

        let payload = self.stage(ctx, Stage::ParseBody, |ctx| {
            let gzipped = is_gzip(request.content_encoding.as_deref());
            ctx.add_field("gzipped", gzipped);
            let payload = decode_body(&request.body, gzipped)?;
            if let serde_json::Value::Object(map) = &payload {
                ctx.add_field("event_columns", map.len());
            }
            Ok(payload)
        })?;

        let write_key = request.write_key.unwrap_or_default();
        let team = self.stage(ctx, Stage::Authenticate, |ctx| {
            let team = self.credentials.authenticate(&write_key)?;
            ctx.add_field("team_id", team.id);
            ctx.add_field("team_name", team.name.clone());
            Ok(team)
        })?;
        ctx.state = PipelineState::Authenticated;

        let dataset = self.stage(ctx, Stage::ResolveDataset, |ctx| {
            let dataset = self.datasets.resolve(&request.dataset)?;
            ctx.add_field("dataset_id", dataset.id);
            Ok(dataset)
        })?;
        ctx.state = PipelineState::DatasetResolved;

        let partition = self.stage(ctx, Stage::ChoosePartition, |ctx| {
            let partition = self.selector.choose(&dataset)?;
            ctx.add_field("chosen_partition", partition);
            Ok(partition)
        })?;
        ctx.state = PipelineState::PartitionChosen;

        let timestamp = self.stage(ctx, Stage::NormalizeTimestamp, |ctx| {
            Ok(self.normalize_timestamp(ctx, request.event_time.as_deref()))
        })?;

        let started = Instant::now();
        let check = self.schema.check_schema(&dataset).await;
        self.report(ctx, Stage::CheckSchema, started.elapsed(), &check);
        let check = check?;
        ctx.add_field("hit_schema_cache", check.hit);
        ctx.state = PipelineState::SchemaValidated;

        let event = Event::new(write_key, sample_rate, payload)
            .with_timestamp(Some(timestamp))
            .with_partition(partition);
        self.stage(ctx, Stage::WriteEvent, |_| self.writer.write(&event))?;

        Ok(Receipt {
            request_id: ctx.request_id.clone(),
            team_id: team.id,
            dataset: dataset.name.clone(),
            partition,
            timestamp,
            schema_cache_hit: check.hit,
        })
    }

    fn stage<T>(
        &self,
        ctx: &mut RequestContext,
        stage: Stage,
        f: impl FnOnce(&mut RequestContext) -> Result<T, GatekeeperError>,
    ) -> Result<T, GatekeeperError> {
        let started = Instant::now();
        let result = f(ctx);
        self.report(ctx, stage, started.elapsed(), &result);
        result
    }

    fn report<T>(
        &self,
        ctx: &RequestContext,
        stage: Stage,
        elapsed: Duration,
        result: &Result<T, GatekeeperError>,
    ) {
        let outcome = match result {
            Ok(_) => StageOutcome::Ok,
            Err(e) => StageOutcome::Rejected(e.kind()),
        };
        self.telemetry.record_stage(ctx, stage, elapsed, outcome);
    }

    /// Use the supplied time if present and non-zero, otherwise now.
    /// Drift between the two is recorded but never rejects the event.
    fn normalize_timestamp(&self, ctx: &mut RequestContext, raw: Option<&str>) -> i64 {
        let now = self.clock.now_ms();

        match parse_event_time(raw) {
            Ok(Some(timestamp)) => {
                if let Some(drift_ms) = now.checked_sub(timestamp) {
                    ctx.add_field("event_time_delta_sec", drift_ms as f64 / 1000.0);
                }
                ctx.add_field("event_time", timestamp);
                timestamp
            }
            Ok(None) => {
                ctx.add_field("event_time", now);
                now
            }
            Err(msg) => {
                ctx.add_field("error_time_parsing", msg);
                ctx.add_field("event_time", now);
                now
            }
        }
    }
}

impl std::fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatekeeper")
            .field("selector", &self.selector)
            .field("schema", &self.schema)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

/// Parse the sample-rate header: absent or empty means `1`, otherwise
/// digits only.
pub fn parse_sample_rate(raw: Option<&str>) -> Result<u64, GatekeeperError> {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => DEFAULT_SAMPLE_RATE,
    };

    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatekeeperError::BadSampleRate(raw.to_string()));
    }
    raw.parse::<u64>()
        .map_err(|_| GatekeeperError::BadSampleRate(raw.to_string()))
}

/// Parse the event-time header.
///
/// `Ok(None)` for absent, empty or zero; `Err` with a note for anything that
/// is neither epoch milliseconds nor RFC 3339.
pub fn parse_event_time(raw: Option<&str>) -> Result<Option<i64>, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    if let Ok(ms) = raw.parse::<i64>() {
        return Ok((ms != 0).then_some(ms));
    }

    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|t| Some(t.timestamp_millis()))
        .map_err(|e| format!("unparseable event time '{}': {}", raw, e))
}

fn is_gzip(content_encoding: Option<&str>) -> bool {
    content_encoding
        .map(|e| e.trim().eq_ignore_ascii_case("gzip"))
        .unwrap_or(false)
}

fn decode_body(body: &[u8], gzipped: bool) -> Result<serde_json::Value, GatekeeperError> {
    if gzipped {
        let mut plain = Vec::new();
        GzDecoder::new(body)
            .read_to_end(&mut plain)
            .map_err(|e| GatekeeperError::MalformedBody(format!("bad gzip stream: {}", e)))?;
        return serde_json::from_slice(&plain)
            .map_err(|e| GatekeeperError::MalformedBody(e.to_string()));
    }

    serde_json::from_slice(body).map_err(|e| GatekeeperError::MalformedBody(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CredentialRegistry, Dataset, DatasetRegistry, RegistryConfig, Team};
    use crate::schema::SchemaCacheConfig;
    use crate::sim::{ManualClock, RecordingLatency, SequenceRandom};
    use crate::pipeline::telemetry::RecordingSink;
    use crate::error::RejectionKind;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const NOW_MS: i64 = 1_700_000_000_000;

    /// Counts resolver calls before delegating
    struct CountingResolver {
        inner: DatasetRegistry,
        calls: AtomicUsize,
    }

    impl DatasetResolver for CountingResolver {
        fn resolve(&self, name: &str) -> Result<Arc<Dataset>, GatekeeperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(name)
        }
    }

    struct Fixture {
        gatekeeper: Gatekeeper,
        resolver: Arc<CountingResolver>,
        sink: Arc<RecordingSink>,
        _temp_dir: TempDir,
    }

    /// Built-in registries plus an empty-partition dataset, no schema faults,
    /// no real latency, a fixed clock
    fn fixture() -> Fixture {
        let mut config = RegistryConfig::builtin();
        config.datasets.push(Dataset::new(7, "empty", vec![]));
        let (credentials, datasets) = config.build().unwrap();

        let resolver = Arc::new(CountingResolver {
            inner: datasets,
            calls: AtomicUsize::new(0),
        });
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::new(NOW_MS));
        let temp_dir = TempDir::new().unwrap();

        let schema = SchemaCache::with_sources(
            SchemaCacheConfig::default().with_fault_one_in(0),
            clock.clone(),
            Arc::new(RecordingLatency::new()),
            Arc::new(SequenceRandom::constant(0)),
        );

        let gatekeeper = Gatekeeper::new(
            Arc::new(credentials),
            resolver.clone(),
            Arc::new(EventWriter::new(temp_dir.path()).unwrap()),
        )
        .with_schema_cache(Arc::new(schema))
        .with_telemetry(sink.clone())
        .with_clock(clock);

        Fixture {
            gatekeeper,
            resolver,
            sink,
            _temp_dir: temp_dir,
        }
    }

    fn valid_request(dataset: &str) -> IngestRequest {
        IngestRequest::new(dataset, r#"{"k":1}"#).with_write_key("abcd123EFGH")
    }

    #[tokio::test]
    async fn test_accepted_event_is_written() {
        let f = fixture();

        let receipt = f.gatekeeper.submit(valid_request("wade")).await.unwrap();

        assert_eq!(receipt.team_id, 1);
        assert_eq!(receipt.dataset, "wade");
        assert!([1, 2, 3].contains(&receipt.partition));
        assert_eq!(receipt.timestamp, NOW_MS);

        let records = f.gatekeeper.writer().read_partition(receipt.partition).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, json!({"k": 1}));
        assert_eq!(records[0].sample_rate, 1);
        assert_eq!(records[0].write_key, "abcd123EFGH");
        assert_eq!(records[0].chosen_partition, Some(receipt.partition));
    }

    #[tokio::test]
    async fn test_sample_rate_handling() {
        let f = fixture();

        // Omitted: defaults to 1
        let receipt = f.gatekeeper.submit(valid_request("wade")).await.unwrap();
        let records = f.gatekeeper.writer().read_partition(receipt.partition).unwrap();
        assert_eq!(records.last().unwrap().sample_rate, 1);

        // Zero is non-negative and accepted
        let receipt = f
            .gatekeeper
            .submit(valid_request("wade").with_sample_rate("0"))
            .await
            .unwrap();
        let records = f.gatekeeper.writer().read_partition(receipt.partition).unwrap();
        assert_eq!(records.last().unwrap().sample_rate, 0);

        for bad in ["-1", "abc", "1.5", " 2", "99999999999999999999999"] {
            let result = f.gatekeeper.submit(valid_request("wade").with_sample_rate(bad)).await;
            assert!(
                matches!(result, Err(GatekeeperError::BadSampleRate(_))),
                "expected BadSampleRate for {:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_write_key_halts_before_resolution() {
        let f = fixture();

        let request = IngestRequest::new("wade", r#"{"k":1}"#).with_write_key("not valid!!");
        let result = f.gatekeeper.submit(request).await;

        assert!(matches!(result, Err(GatekeeperError::AuthMalformed)));
        assert_eq!(f.resolver.calls.load(Ordering::SeqCst), 0);

        let stages: Vec<Stage> = f.sink.stages().iter().map(|r| r.stage).collect();
        assert_eq!(
            stages,
            vec![Stage::ParseSampleRate, Stage::ParseBody, Stage::Authenticate]
        );
    }

    #[tokio::test]
    async fn test_missing_write_key_is_malformed() {
        let f = fixture();

        let result = f.gatekeeper.submit(IngestRequest::new("wade", "{}")).await;
        assert!(matches!(result, Err(GatekeeperError::AuthMalformed)));
    }

    #[tokio::test]
    async fn test_unknown_write_key() {
        let f = fixture();

        let request = IngestRequest::new("wade", "{}").with_write_key("nobody000");
        let result = f.gatekeeper.submit(request).await;

        assert!(matches!(result, Err(GatekeeperError::AuthUnknown)));
        assert_eq!(f.resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_dataset() {
        let f = fixture();

        let result = f.gatekeeper.submit(valid_request("ghost")).await;

        assert!(matches!(result, Err(GatekeeperError::DatasetNotFound(name)) if name == "ghost"));
        assert_eq!(f.resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            f.sink.requests()[0].1,
            StageOutcome::Rejected(RejectionKind::DatasetNotFound)
        );
    }

    #[tokio::test]
    async fn test_dataset_without_partitions() {
        let f = fixture();

        let result = f.gatekeeper.submit(valid_request("empty")).await;
        assert!(matches!(result, Err(GatekeeperError::NoPartitionsAvailable(_))));
        assert!(f.gatekeeper.writer().stats().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let f = fixture();

        for body in ["", "{not json", "{\"k\":"] {
            let request = IngestRequest::new("wade", body).with_write_key("abcd123EFGH");
            let result = f.gatekeeper.submit(request).await;
            assert!(matches!(result, Err(GatekeeperError::MalformedBody(_))));
        }
        // Body is checked before credentials
        let request = IngestRequest::new("wade", "nope").with_write_key("bad key");
        assert!(matches!(
            f.gatekeeper.submit(request).await,
            Err(GatekeeperError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_gzip_body() {
        let f = fixture();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"zipped":true}"#).unwrap();
        let body = encoder.finish().unwrap();

        let request = IngestRequest::new("helen", body)
            .with_write_key("ijkl456MNOP")
            .with_content_encoding("gzip");
        let receipt = f.gatekeeper.submit(request).await.unwrap();

        let records = f.gatekeeper.writer().read_partition(receipt.partition).unwrap();
        assert_eq!(records[0].payload, json!({"zipped": true}));

        let request = IngestRequest::new("helen", r#"{"plain":1}"#)
            .with_write_key("ijkl456MNOP")
            .with_content_encoding("gzip");
        assert!(matches!(
            f.gatekeeper.submit(request).await,
            Err(GatekeeperError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_supplied_timestamp_kept() {
        let f = fixture();

        let supplied = NOW_MS - 5_000;
        let receipt = f
            .gatekeeper
            .submit(valid_request("wade").with_event_time(supplied.to_string()))
            .await
            .unwrap();
        assert_eq!(receipt.timestamp, supplied);

        let receipt = f
            .gatekeeper
            .submit(valid_request("wade").with_event_time("2023-11-14T22:13:20Z"))
            .await
            .unwrap();
        assert_eq!(receipt.timestamp, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_extreme_timestamps_accepted() {
        let f = fixture();

        for supplied in [i64::MIN, i64::MAX, -1] {
            let receipt = f
                .gatekeeper
                .submit(valid_request("wade").with_event_time(supplied.to_string()))
                .await
                .unwrap();
            assert_eq!(receipt.timestamp, supplied);

            let records = f.gatekeeper.writer().read_partition(receipt.partition).unwrap();
            assert_eq!(records.last().unwrap().timestamp, Some(supplied));
        }
    }

    #[tokio::test]
    async fn test_zero_or_garbage_timestamp_uses_now() {
        let f = fixture();

        for raw in ["0", "", "yesterday"] {
            let receipt = f
                .gatekeeper
                .submit(valid_request("wade").with_event_time(raw))
                .await
                .unwrap();
            assert_eq!(receipt.timestamp, NOW_MS);
        }
    }

    #[tokio::test]
    async fn test_schema_failure_rejects_without_writing() {
        let clock = Arc::new(ManualClock::new(NOW_MS));
        let (credentials, datasets) = RegistryConfig::builtin().build().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let schema = SchemaCache::with_sources(
            SchemaCacheConfig::default(),
            clock.clone(),
            Arc::new(RecordingLatency::new()),
            // Fault draw of 0 fails the first call
            Arc::new(SequenceRandom::new([0], 1)),
        );
        let gatekeeper = Gatekeeper::new(
            Arc::new(credentials),
            Arc::new(datasets),
            Arc::new(EventWriter::new(temp_dir.path()).unwrap()),
        )
        .with_selector(PartitionSelector::with_random(Arc::new(SequenceRandom::constant(0))))
        .with_schema_cache(Arc::new(schema))
        .with_clock(clock);

        let result = gatekeeper.submit(valid_request("wade")).await;
        assert!(matches!(result, Err(GatekeeperError::SchemaLookupFailure(_))));
        assert!(gatekeeper.writer().read_partition(1).unwrap().is_empty());

        // Next call passes and lands on the first partition
        let receipt = gatekeeper.submit(valid_request("wade")).await.unwrap();
        assert_eq!(receipt.partition, 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_io_failure() {
        let (credentials, datasets) = RegistryConfig::builtin().build().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");
        let writer = Arc::new(EventWriter::new(&log_dir).unwrap());
        std::fs::remove_dir_all(&log_dir).unwrap();

        let gatekeeper = Gatekeeper::new(Arc::new(credentials), Arc::new(datasets), writer)
            .with_schema_cache(Arc::new(SchemaCache::with_config(
                SchemaCacheConfig::default().with_fault_one_in(0),
            )))
            .with_telemetry(Arc::new(crate::pipeline::telemetry::NoopSink));

        let result = gatekeeper.submit(valid_request("wade")).await;
        assert!(matches!(result, Err(GatekeeperError::IoFailure(_))));
    }

    #[tokio::test]
    async fn test_every_stage_reported_on_success() {
        let f = fixture();

        let receipt = f.gatekeeper.submit(valid_request("wade")).await.unwrap();

        let reports = f.sink.stages();
        let stages: Vec<Stage> = reports.iter().map(|r| r.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::ParseSampleRate,
                Stage::ParseBody,
                Stage::Authenticate,
                Stage::ResolveDataset,
                Stage::ChoosePartition,
                Stage::NormalizeTimestamp,
                Stage::CheckSchema,
                Stage::WriteEvent,
            ]
        );
        assert!(reports.iter().all(|r| r.outcome == StageOutcome::Ok));
        assert!(reports.iter().all(|r| r.request_id == receipt.request_id));
        assert_eq!(f.sink.requests(), vec![(receipt.request_id, StageOutcome::Ok)]);
    }

    #[tokio::test]
    async fn test_concurrent_submissions() {
        let f = fixture();
        let gatekeeper = Arc::new(f.gatekeeper);

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let gatekeeper = Arc::clone(&gatekeeper);
                tokio::spawn(async move {
                    let body = format!(r#"{{"i":{}}}"#, i);
                    let request = IngestRequest::new("wade", body).with_write_key("abcd123EFGH");
                    gatekeeper.submit(request).await.unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let total: usize = [1, 2, 3]
            .iter()
            .map(|&p| gatekeeper.writer().read_partition(p).unwrap().len())
            .sum();
        assert_eq!(total, 50);
    }

    #[test]
    fn test_parse_sample_rate() {
        assert_eq!(parse_sample_rate(None).unwrap(), 1);
        assert_eq!(parse_sample_rate(Some("")).unwrap(), 1);
        assert_eq!(parse_sample_rate(Some("0")).unwrap(), 0);
        assert_eq!(parse_sample_rate(Some("20")).unwrap(), 20);
        assert!(parse_sample_rate(Some("+3")).is_err());
        assert!(parse_sample_rate(Some("-1")).is_err());
    }

    #[test]
    fn test_parse_event_time() {
        assert_eq!(parse_event_time(None), Ok(None));
        assert_eq!(parse_event_time(Some("0")), Ok(None));
        assert_eq!(parse_event_time(Some("1544712660000")), Ok(Some(1_544_712_660_000)));
        assert_eq!(
            parse_event_time(Some("2018-12-13T14:51:00.5Z")),
            Ok(Some(1_544_712_660_500))
        );
        assert!(parse_event_time(Some("last tuesday")).is_err());
    }

    #[test]
    fn test_team_lookup_via_trait_object() {
        let registry: Arc<dyn CredentialValidator> = Arc::new(
            CredentialRegistry::new(vec![Team::new(5, "five", "five5")]).unwrap(),
        );
        assert_eq!(registry.authenticate("five5").unwrap().id, 5);
    }
}
