use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sqs::Client as SqsClient;
use tracing::{error, info, warn};

use crate::config::ExportConfig;
use crate::context::{ExportStage, RequestContext};
use crate::error::ExportError;
use crate::model::{ExportNotification, ExportRequest};
use crate::notifier::{NotificationSink, SqsNotifier};
use crate::source::{is_upstream_error, ExportSource, HttpExportSource};
use crate::storage::{ObjectStore, S3ObjectStore};
use crate::storage_key::StorageKey;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub snapshot_id: String,
    pub storage_key: StorageKey,
    pub location: String,
    /// Whether the best-effort upload succeeded. Not reflected in the notification.
    pub stored: bool,
    pub stage: ExportStage,
}

/// Checks the required fields of an inbound request.
pub fn validate_request(request: ExportRequest) -> Result<ExportRequest, ExportError> {
    if request.snapshot_id.is_empty() {
        return Err(ExportError::InvalidRequest(
            "No SnapshotID given in message".to_string(),
        ));
    }
    if request.surveyperiods.is_empty() {
        return Err(ExportError::InvalidRequest(
            "No Survey/period combinations given in message".to_string(),
        ));
    }
    Ok(request)
}

/// Relays one export request from the input queue to storage and the output queue.
pub struct ExportRelay<S, O, N> {
    source: S,
    store: O,
    notifier: N,
    bucket: String,
}

pub type AwsExportRelay = ExportRelay<HttpExportSource, S3ObjectStore, SqsNotifier>;

impl AwsExportRelay {
    pub async fn from_config(config: &ExportConfig) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        ExportRelay::new(
            HttpExportSource::new(&config.endpoint),
            S3ObjectStore::new(S3Client::new(&aws_config), &config.bucket),
            SqsNotifier::new(SqsClient::new(&aws_config), &config.output_queue),
            &config.bucket,
        )
    }
}

impl<S, O, N> ExportRelay<S, O, N>
where
    S: ExportSource,
    O: ObjectStore,
    N: NotificationSink,
{
    pub fn new(source: S, store: O, notifier: N, bucket: impl Into<String>) -> Self {
        Self {
            source,
            store,
            notifier,
            bucket: bucket.into(),
        }
    }

    pub async fn process_message(
        &self,
        ctx: &RequestContext,
        body: &str,
    ) -> Result<ExportOutcome, ExportError> {
        info!(stage = %ExportStage::Received, "Processing export message");

        let request = self.validate(body).await?;
        info!(
            stage = %ExportStage::Validated,
            snapshot_id = %request.snapshot_id,
            survey_periods = request.surveyperiods.len(),
            "Export request validated"
        );

        let storage_key = StorageKey::build(&request.snapshot_id, &request.surveyperiods)?;
        info!("Storage key: {}", storage_key);

        let payload = self
            .fetch(body, &request.snapshot_id, &storage_key)
            .await?;
        info!(stage = %ExportStage::Fetched, bytes = payload.len(), "Export data received");

        let stored = self.write_export(&storage_key, payload).await;
        if stored {
            info!(stage = %ExportStage::Stored, "Export stored");
        }

        info!(
            stage = %ExportStage::Done,
            elapsed_ms = ctx.elapsed_ms(),
            "Export request complete"
        );

        Ok(ExportOutcome {
            location: storage_key.location(&self.bucket),
            snapshot_id: request.snapshot_id,
            storage_key,
            stored,
            stage: ExportStage::Done,
        })
    }

    /// Parses and validates a message body, sending a failure notification on rejection.
    pub async fn validate(&self, body: &str) -> Result<ExportRequest, ExportError> {
        let request = match ExportRequest::from_body(body) {
            Ok(request) => request,
            Err(e) => {
                error!("Error with JSON from input queue: {}", e);
                self.notify(ExportNotification::failure("")).await;
                return Err(ExportError::InvalidRequest(format!(
                    "malformed message: {}",
                    e
                )));
            }
        };

        let snapshot_id = request.snapshot_id.clone();
        match validate_request(request) {
            Ok(request) => Ok(request),
            Err(e) => {
                warn!(stage = %ExportStage::Rejected, "{}", e);
                self.notify(ExportNotification::failure(&snapshot_id)).await;
                Err(e)
            }
        }
    }

    /// Calls the export endpoint and reports the fetch outcome on the output queue.
    pub async fn fetch(
        &self,
        message: &str,
        snapshot_id: &str,
        storage_key: &StorageKey,
    ) -> Result<String, ExportError> {
        let body = match self.source.fetch_export(message).await {
            Ok(body) => body,
            Err(e) => {
                error!(stage = %ExportStage::FetchFailed, "The HTTP request failed with error: {}", e);
                self.notify(ExportNotification::failure(snapshot_id)).await;
                return Err(e);
            }
        };

        if is_upstream_error(&body) {
            error!(stage = %ExportStage::FetchFailed, "Error with export endpoint: {}", body);
            self.notify(ExportNotification::failure(snapshot_id)).await;
            return Err(ExportError::UpstreamDataError {
                snapshot_id: snapshot_id.to_string(),
            });
        }

        self.notify(ExportNotification::success(
            snapshot_id,
            &storage_key.location(&self.bucket),
        ))
        .await;

        Ok(body)
    }

    async fn write_export(&self, storage_key: &StorageKey, payload: String) -> bool {
        match self.store.put_export(storage_key, payload).await {
            Ok(()) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    async fn notify(&self, notification: ExportNotification) {
        if let Err(e) = self.notifier.send(&notification).await {
            error!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SurveyPeriod;
    use crate::notifier::MockNotificationSink;
    use crate::source::MockExportSource;
    use crate::storage::MockObjectStore;

    const BUCKET: &str = "spp-export";
    const VALID_MESSAGE: &str = r#"{"snapshot_id": "fwwekfnsdn", "surveyperiods": [{"survey": "066", "period": "201902"}, {"survey": "023", "period": "201902"}]}"#;
    const EXPECTED_KEY: &str = "snapshot-066_201902-023_201902-fwwekfnsdn";

    fn relay(
        source: MockExportSource,
        store: MockObjectStore,
        notifier: MockNotificationSink,
    ) -> ExportRelay<MockExportSource, MockObjectStore, MockNotificationSink> {
        ExportRelay::new(source, store, notifier, BUCKET)
    }

    fn ctx() -> RequestContext {
        RequestContext::new("msg-1", "req-1")
    }

    fn expect_failure_notification(notifier: &mut MockNotificationSink, snapshot_id: &'static str) {
        notifier
            .expect_send()
            .withf(move |n| {
                n.snapshot_id == snapshot_id && n.location == "null" && !n.successful
            })
            .times(1)
            .returning(|_| Ok(()));
    }

    #[test]
    fn test_validate_request() {
        let request = ExportRequest {
            snapshot_id: "abc".to_string(),
            surveyperiods: vec![SurveyPeriod::new("023", "201904")],
        };
        assert_eq!(validate_request(request.clone()).unwrap(), request);

        let no_snapshot = ExportRequest {
            snapshot_id: String::new(),
            surveyperiods: vec![SurveyPeriod::new("023", "201904")],
        };
        assert!(matches!(
            validate_request(no_snapshot),
            Err(ExportError::InvalidRequest(_))
        ));

        let no_pairs = ExportRequest {
            snapshot_id: "abc".to_string(),
            surveyperiods: vec![],
        };
        assert!(matches!(
            validate_request(no_pairs),
            Err(ExportError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_successful_export() {
        let mut source = MockExportSource::new();
        source
            .expect_fetch_export()
            .withf(|message| message == VALID_MESSAGE)
            .times(1)
            .returning(|_| Ok("export-data".to_string()));

        let mut store = MockObjectStore::new();
        store
            .expect_put_export()
            .withf(|key, payload| key.as_str() == EXPECTED_KEY && payload.as_str() == "export-data")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut notifier = MockNotificationSink::new();
        notifier
            .expect_send()
            .withf(|n| {
                n.snapshot_id == "fwwekfnsdn"
                    && n.location == format!("s3://{}/{}", BUCKET, EXPECTED_KEY)
                    && n.successful
            })
            .times(1)
            .returning(|_| Ok(()));

        let outcome = relay(source, store, notifier)
            .process_message(&ctx(), VALID_MESSAGE)
            .await
            .unwrap();

        assert_eq!(outcome.storage_key.as_str(), EXPECTED_KEY);
        assert_eq!(outcome.snapshot_id, "fwwekfnsdn");
        assert!(outcome.stored);
        assert_eq!(outcome.stage, ExportStage::Done);
    }

    #[tokio::test]
    async fn test_empty_snapshot_id_rejected() {
        let mut source = MockExportSource::new();
        source.expect_fetch_export().times(0);
        let mut store = MockObjectStore::new();
        store.expect_put_export().times(0);
        let mut notifier = MockNotificationSink::new();
        expect_failure_notification(&mut notifier, "");

        let message = r#"{"snapshot_id": "", "surveyperiods": [{"survey": "023", "period": "201904"}]}"#;
        let err = relay(source, store, notifier)
            .process_message(&ctx(), message)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::InvalidRequest(_)));
        assert_eq!(err.stage(), ExportStage::Rejected);
    }

    #[tokio::test]
    async fn test_missing_survey_periods_rejected() {
        for message in [
            r#"{"snapshot_id": "abc", "surveyperiods": []}"#,
            r#"{"snapshot_id": "abc", "surveyperiods": null}"#,
            r#"{"snapshot_id": "abc"}"#,
        ] {
            let mut source = MockExportSource::new();
            source.expect_fetch_export().times(0);
            let mut store = MockObjectStore::new();
            store.expect_put_export().times(0);
            let mut notifier = MockNotificationSink::new();
            expect_failure_notification(&mut notifier, "abc");

            let err = relay(source, store, notifier)
                .process_message(&ctx(), message)
                .await
                .unwrap_err();
            assert!(matches!(err, ExportError::InvalidRequest(_)));
        }
    }

    #[tokio::test]
    async fn test_malformed_message_rejected() {
        let mut source = MockExportSource::new();
        source.expect_fetch_export().times(0);
        let mut store = MockObjectStore::new();
        store.expect_put_export().times(0);
        let mut notifier = MockNotificationSink::new();
        expect_failure_notification(&mut notifier, "");

        let err = relay(source, store, notifier)
            .process_message(&ctx(), "{not json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("malformed message"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let mut source = MockExportSource::new();
        source
            .expect_fetch_export()
            .times(1)
            .returning(|_| Err(ExportError::UpstreamUnavailable("connection refused".into())));
        let mut store = MockObjectStore::new();
        store.expect_put_export().times(0);
        let mut notifier = MockNotificationSink::new();
        expect_failure_notification(&mut notifier, "fwwekfnsdn");

        let err = relay(source, store, notifier)
            .process_message(&ctx(), VALID_MESSAGE)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::UpstreamUnavailable(_)));
        assert_eq!(err.stage(), ExportStage::FetchFailed);
    }

    #[tokio::test]
    async fn test_upstream_sentinel_never_stored() {
        let mut source = MockExportSource::new();
        source
            .expect_fetch_export()
            .times(1)
            .returning(|_| Ok("Error loading data for db Export".to_string()));
        let mut store = MockObjectStore::new();
        store.expect_put_export().times(0);
        let mut notifier = MockNotificationSink::new();
        expect_failure_notification(&mut notifier, "fwwekfnsdn");

        let err = relay(source, store, notifier)
            .process_message(&ctx(), VALID_MESSAGE)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::UpstreamDataError { ref snapshot_id } if snapshot_id == "fwwekfnsdn"
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_success_notification() {
        let mut source = MockExportSource::new();
        source
            .expect_fetch_export()
            .times(1)
            .returning(|_| Ok("export-data".to_string()));
        let mut store = MockObjectStore::new();
        store.expect_put_export().times(1).returning(|key, _| {
            Err(ExportError::StorageWriteFailed {
                bucket: BUCKET.to_string(),
                key: key.to_string(),
                reason: "access denied".to_string(),
            })
        });
        let mut notifier = MockNotificationSink::new();
        notifier
            .expect_send()
            .withf(|n| n.successful)
            .times(1)
            .returning(|_| Ok(()));

        let outcome = relay(source, store, notifier)
            .process_message(&ctx(), VALID_MESSAGE)
            .await
            .unwrap();
        assert!(!outcome.stored);
        assert_eq!(outcome.stage, ExportStage::Done);
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let mut source = MockExportSource::new();
        source
            .expect_fetch_export()
            .times(1)
            .returning(|_| Ok("export-data".to_string()));
        let mut store = MockObjectStore::new();
        store.expect_put_export().times(1).returning(|_, _| Ok(()));
        let mut notifier = MockNotificationSink::new();
        notifier.expect_send().times(1).returning(|_| {
            Err(ExportError::NotificationSendFailed {
                queue: "export-output".to_string(),
                reason: "queue does not exist".to_string(),
            })
        });

        let outcome = relay(source, store, notifier)
            .process_message(&ctx(), VALID_MESSAGE)
            .await
            .unwrap();
        assert!(outcome.stored);
    }
}
