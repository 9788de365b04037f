use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use tracing::info;

use crate::error::ExportError;
use crate::storage_key::StorageKey;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_export(&self, key: &StorageKey, payload: String) -> Result<(), ExportError>;
}

pub struct S3ObjectStore {
    s3_client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(s3_client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            s3_client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_export(&self, key: &StorageKey, payload: String) -> Result<(), ExportError> {
        let size = payload.len();

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(payload.into_bytes().into())
            .send()
            .await
            .map_err(|e| ExportError::StorageWriteFailed {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        info!("Uploaded {} ({} bytes) to s3 bucket {}", key, size, self.bucket);

        Ok(())
    }
}
