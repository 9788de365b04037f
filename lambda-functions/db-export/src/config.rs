use anyhow::{anyhow, Result};
use bon::Builder;

pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_FUNCTION_NAME: &str = "db-export";

/// Settings read once at startup and shared by reference with every component.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(on(String, into))]
pub struct ExportConfig {
    #[builder(default = DEFAULT_REGION.to_string())]
    pub region: String,

    pub bucket: String,

    /// Downstream endpoint that assembles the export payload.
    pub endpoint: String,

    /// Name of the output queue; the URL is resolved on send.
    pub output_queue: String,

    #[builder(default = DEFAULT_LOG_LEVEL.to_string())]
    pub log_level: String,

    #[builder(default = DEFAULT_FUNCTION_NAME.to_string())]
    pub function_name: String,
}

impl ExportConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("{} must be configured", name))
        };

        Ok(Self::builder()
            .bucket(required("S3_BUCKET")?)
            .endpoint(required("GRAPHQL_ENDPOINT")?)
            .output_queue(required("DB_EXPORT_OUTPUT_QUEUE")?)
            .maybe_region(lookup("AWS_REGION"))
            .maybe_log_level(lookup("LOG_LEVEL"))
            .maybe_function_name(lookup("AWS_LAMBDA_FUNCTION_NAME"))
            .build())
    }

    /// Deployment environment, encoded as the fifth `-` segment of the function name.
    pub fn environment(&self) -> &str {
        self.function_name.split('-').nth(4).unwrap_or("unknown")
    }
}
