use aws_lambda_events::event::sqs::SqsEvent;
use db_export::{function_handler, AwsExportRelay, ExportConfig};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ExportConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ExportConfig::from_env()?;
    init_tracing(&config);

    let relay = &AwsExportRelay::from_config(&config).await;
    let environment = config.environment();

    info!(
        "db-export starting in {} (bucket {}, output queue {})",
        environment, config.bucket, config.output_queue
    );

    run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        function_handler(relay, environment, event).await
    }))
    .await
}
