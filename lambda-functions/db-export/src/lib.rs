pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod model;
pub mod notifier;
pub mod relay;
pub mod source;
pub mod storage;
pub mod storage_key;

pub use config::ExportConfig;
pub use context::{ExportStage, RequestContext};
pub use error::ExportError;
pub use handler::{function_handler, process_records};
pub use model::{ExportNotification, ExportRequest, SurveyPeriod, FAILED_LOCATION};
pub use notifier::{NotificationSink, SqsNotifier};
pub use relay::{validate_request, AwsExportRelay, ExportOutcome, ExportRelay};
pub use source::{is_upstream_error, ExportSource, HttpExportSource, UPSTREAM_ERROR_SENTINEL};
pub use storage::{ObjectStore, S3ObjectStore};
pub use storage_key::StorageKey;
