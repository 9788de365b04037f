use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use tracing::info;

use crate::error::ExportError;
use crate::model::ExportNotification;

/// Output channel for export outcome notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &ExportNotification) -> Result<(), ExportError>;
}

pub struct SqsNotifier {
    sqs_client: SqsClient,
    queue_name: String,
}

impl SqsNotifier {
    pub fn new(sqs_client: SqsClient, queue_name: impl Into<String>) -> Self {
        Self {
            sqs_client,
            queue_name: queue_name.into(),
        }
    }

    fn send_error(&self, reason: impl ToString) -> ExportError {
        ExportError::NotificationSendFailed {
            queue: self.queue_name.clone(),
            reason: reason.to_string(),
        }
    }

    async fn queue_url(&self) -> Result<String, ExportError> {
        let output = self
            .sqs_client
            .get_queue_url()
            .queue_name(&self.queue_name)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        output
            .queue_url
            .ok_or_else(|| self.send_error("queue URL missing from GetQueueUrl response"))
    }
}

#[async_trait]
impl NotificationSink for SqsNotifier {
    async fn send(&self, notification: &ExportNotification) -> Result<(), ExportError> {
        let queue_url = self.queue_url().await?;
        let body = notification.to_json().map_err(|e| self.send_error(e))?;

        self.sqs_client
            .send_message()
            .queue_url(queue_url)
            .message_body(&body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        info!("Sent notification to {}: {}", self.queue_name, body);

        Ok(())
    }
}
