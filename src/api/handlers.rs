use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{GatekeeperError, RejectionKind};
use crate::pipeline::{Gatekeeper, IngestRequest, Receipt};
use crate::schema::SchemaCacheStats;
use crate::storage::PartitionStats;

pub const HEADER_WRITE_KEY: &str = "x-honeycomb-team";
pub const HEADER_EVENT_TIME: &str = "x-honeycomb-event-time";
pub const HEADER_SAMPLE_RATE: &str = "x-honeycomb-samplerate";

/// Application state shared across handlers
pub struct AppState {
    pub gatekeeper: Arc<Gatekeeper>,
}

// ============================================================================
// Landing page & health
// ============================================================================

const HOME_HTML: &str = r#"<html>
  <body>
    <h1>Gatekeeper</h1>
    <p>POST JSON events to <code>/1/events/{dataset}</code> with an
    <code>X-Honeycomb-Team</code> write key header.</p>
  </body>
</html>
"#;

pub async fn home() -> Html<&'static str> {
    Html(HOME_HTML)
}

#[derive(Serialize)]
pub struct AliveResponse {
    pub alive: &'static str,
}

pub async fn alive() -> Json<AliveResponse> {
    Json(AliveResponse { alive: "yes" })
}

// ============================================================================
// Events
// ============================================================================

#[derive(Serialize)]
pub struct EventResponse {
    pub partition: u32,
    pub timestamp: i64,
}

impl From<Receipt> for EventResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            partition: receipt.partition,
            timestamp: receipt.timestamp,
        }
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    // Lossy so that non-UTF-8 bytes still fail validation downstream
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    Path(dataset_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let request = IngestRequest {
        dataset: dataset_name,
        write_key: header_string(&headers, HEADER_WRITE_KEY),
        event_time: header_string(&headers, HEADER_EVENT_TIME),
        sample_rate: header_string(&headers, HEADER_SAMPLE_RATE),
        content_encoding: header_string(&headers, "content-encoding"),
        body: body.to_vec(),
    };

    let receipt = state.gatekeeper.submit(request).await?;

    Ok((StatusCode::ACCEPTED, Json(receipt.into())))
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Serialize)]
pub struct StatsResponse {
    pub schema_cache: SchemaCacheStats,
    pub partitions: Vec<PartitionStats>,
    pub total_records: u64,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let partitions = state.gatekeeper.writer().stats();
    let total_records = partitions.iter().map(|p| p.records_appended).sum();

    Json(StatsResponse {
        schema_cache: state.gatekeeper.schema_cache().stats(),
        partitions,
        total_records,
    })
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Rejected(GatekeeperError),
}

impl From<GatekeeperError> for ApiError {
    fn from(err: GatekeeperError) -> Self {
        ApiError::Rejected(err)
    }
}

/// HTTP status for each rejection kind
pub fn status_for(kind: RejectionKind) -> StatusCode {
    match kind {
        RejectionKind::AuthMalformed => StatusCode::UNAUTHORIZED,
        RejectionKind::BadSampleRate
        | RejectionKind::MalformedBody
        | RejectionKind::AuthUnknown
        | RejectionKind::DatasetNotFound
        | RejectionKind::NoPartitionsAvailable => StatusCode::BAD_REQUEST,
        RejectionKind::SchemaLookupFailure | RejectionKind::IoFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let ApiError::Rejected(err) = self;
        let kind = err.kind();

        // Don't leak filesystem details to clients
        let message = match &err {
            GatekeeperError::IoFailure(_) => "failed to write event".to_string(),
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
            "kind": kind,
        });

        (status_for(kind), Json(body)).into_response()
    }
}
