use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use lambda_runtime::{Error, LambdaEvent};
use tracing::{error, info, Instrument};

use crate::context::RequestContext;
use crate::error::ExportError;
use crate::notifier::NotificationSink;
use crate::relay::{ExportOutcome, ExportRelay};
use crate::source::ExportSource;
use crate::storage::ObjectStore;

/// Processes an SQS batch in delivery order, stopping at the first failed message.
pub async fn process_records<S, O, N>(
    relay: &ExportRelay<S, O, N>,
    environment: &str,
    request_id: &str,
    records: &[SqsMessage],
) -> Result<Vec<ExportOutcome>, ExportError>
where
    S: ExportSource,
    O: ObjectStore,
    N: NotificationSink,
{
    if records.is_empty() {
        error!("An error occurred, no SQS message passed to function");
        return Err(ExportError::EmptyBatch);
    }

    let mut outcomes = Vec::with_capacity(records.len());

    for record in records {
        let message_id = record.message_id.as_deref().unwrap_or_default();
        let body = record.body.as_deref().unwrap_or_default();
        let ctx = RequestContext::new(message_id, request_id);
        let span = ctx.span(environment);

        let outcome = relay
            .process_message(&ctx, body)
            .instrument(span)
            .await?;
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

pub async fn function_handler<S, O, N>(
    relay: &ExportRelay<S, O, N>,
    environment: &str,
    event: LambdaEvent<SqsEvent>,
) -> Result<(), Error>
where
    S: ExportSource,
    O: ObjectStore,
    N: NotificationSink,
{
    let records = &event.payload.records;
    info!("Application starting, {} message(s) received", records.len());

    let outcomes = process_records(relay, environment, &event.context.request_id, records).await?;

    let stored = outcomes.iter().filter(|outcome| outcome.stored).count();
    info!(
        "Processed {} export request(s), {} stored",
        outcomes.len(),
        stored
    );

    Ok(())
}
