use crate::context::ExportStage;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Export endpoint unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Export endpoint reported a data error for snapshot {snapshot_id}")]
    UpstreamDataError { snapshot_id: String },

    #[error("Unable to upload {key} to {bucket}: {reason}")]
    StorageWriteFailed {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Unable to send notification to {queue}: {reason}")]
    NotificationSendFailed { queue: String, reason: String },

    #[error("No SQS message passed to function")]
    EmptyBatch,
}

impl ExportError {
    /// Terminal stage a request is left in when this error aborts it.
    pub fn stage(&self) -> ExportStage {
        match self {
            Self::InvalidRequest(_) | Self::InvalidInput(_) | Self::EmptyBatch => {
                ExportStage::Rejected
            }
            Self::UpstreamUnavailable(_) | Self::UpstreamDataError { .. } => {
                ExportStage::FetchFailed
            }
            // Best-effort failures never abort a request.
            Self::StorageWriteFailed { .. } | Self::NotificationSendFailed { .. } => {
                ExportStage::Done
            }
        }
    }
}
