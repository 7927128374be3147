//! Rejection taxonomy for the gatekeeper pipeline

use serde::Serialize;

/// Why a request was rejected. Every pipeline stage fails fast with one of these.
#[derive(Debug, thiserror::Error)]
pub enum GatekeeperError {
    #[error("sample rate must be a non-negative integer, got '{0}'")]
    BadSampleRate(String),

    #[error("failed to unmarshal JSON body: {0}")]
    MalformedBody(String),

    #[error("writekey malformed - expect only letters and numbers")]
    AuthMalformed,

    #[error("writekey didn't match valid credentials")]
    AuthUnknown,

    #[error("failed to resolve dataset object '{0}'")]
    DatasetNotFound(String),

    #[error("no partitions available for dataset '{0}'")]
    NoPartitionsAvailable(String),

    #[error("failed to resolve schema for dataset '{0}'")]
    SchemaLookupFailure(String),

    #[error("failed to write event: {0}")]
    IoFailure(#[from] std::io::Error),
}

impl GatekeeperError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            GatekeeperError::BadSampleRate(_) => RejectionKind::BadSampleRate,
            GatekeeperError::MalformedBody(_) => RejectionKind::MalformedBody,
            GatekeeperError::AuthMalformed => RejectionKind::AuthMalformed,
            GatekeeperError::AuthUnknown => RejectionKind::AuthUnknown,
            GatekeeperError::DatasetNotFound(_) => RejectionKind::DatasetNotFound,
            GatekeeperError::NoPartitionsAvailable(_) => RejectionKind::NoPartitionsAvailable,
            GatekeeperError::SchemaLookupFailure(_) => RejectionKind::SchemaLookupFailure,
            GatekeeperError::IoFailure(_) => RejectionKind::IoFailure,
        }
    }

    /// Backend conditions a caller may choose to retry. Everything else is
    /// permanent for the given input.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            RejectionKind::SchemaLookupFailure | RejectionKind::IoFailure
        )
    }
}

/// Fieldless mirror of [`GatekeeperError`], used for telemetry and responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RejectionKind {
    BadSampleRate,
    MalformedBody,
    AuthMalformed,
    AuthUnknown,
    DatasetNotFound,
    NoPartitionsAvailable,
    SchemaLookupFailure,
    #[serde(rename = "IOFailure")]
    IoFailure,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::BadSampleRate => "BadSampleRate",
            RejectionKind::MalformedBody => "MalformedBody",
            RejectionKind::AuthMalformed => "AuthMalformed",
            RejectionKind::AuthUnknown => "AuthUnknown",
            RejectionKind::DatasetNotFound => "DatasetNotFound",
            RejectionKind::NoPartitionsAvailable => "NoPartitionsAvailable",
            RejectionKind::SchemaLookupFailure => "SchemaLookupFailure",
            RejectionKind::IoFailure => "IOFailure",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
