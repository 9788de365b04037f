use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a single export request.
///
/// `Received → Validated → Fetched → Stored → Done`, with `Rejected` reachable
/// from `Received` and `FetchFailed` from `Validated`. `Stored` is skipped when
/// the upload fails; it never gates `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Received,
    Validated,
    Fetched,
    Stored,
    Done,
    Rejected,
    FetchFailed,
}

impl ExportStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Rejected | Self::FetchFailed)
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Validated => write!(f, "validated"),
            Self::Fetched => write!(f, "fetched"),
            Self::Stored => write!(f, "stored"),
            Self::Done => write!(f, "done"),
            Self::Rejected => write!(f, "rejected"),
            Self::FetchFailed => write!(f, "fetch_failed"),
        }
    }
}

/// Per-message values carried through the pipeline and attached to its span.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: Uuid,
    pub message_id: String,
    pub request_id: String,
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(message_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            message_id: message_id.into(),
            request_id: request_id.into(),
            received_at: Utc::now(),
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.received_at).num_milliseconds()
    }

    pub fn span(&self, environment: &str) -> tracing::Span {
        tracing::info_span!(
            "export_request",
            correlation_id = %self.correlation_id,
            message_id = %self.message_id,
            request_id = %self.request_id,
            environment = %environment,
        )
    }
}
