//! S3-compatible object store client.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

use super::{ObjectInfo, ObjectStore, StorageError};
use crate::config::ObjectStoreConfig;

/// Client for an S3-compatible endpoint (MinIO, Ceph, Akave O3, ...),
/// scoped to a single bucket. Always uses path-style addressing, which
/// custom endpoints require.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn connect(config: &ObjectStoreConfig) -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "loggate",
            ))
            .endpoint_url(config.endpoint.clone())
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&base)
            .force_path_style(true)
            .build();
        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        let head = self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await;
        if head.is_ok() {
            return Ok(());
        }

        // HeadBucket failed (404 NoSuchBucket or similar); try to create.
        match self
            .client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                if let Some(service_err) = err.as_service_error() {
                    if service_err.is_bucket_already_owned_by_you()
                        || service_err.is_bucket_already_exists()
                    {
                        return Ok(());
                    }
                }
                Err(StorageError::Request(format!(
                    "create bucket {}: {err}",
                    self.bucket
                )))
            }
        }
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| StorageError::Request(format!("put {key}: {err}")))?;
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let out = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|err| StorageError::Request(format!("list {prefix}: {err}")))?;

        Ok(out
            .contents()
            .iter()
            .map(|object| ObjectInfo {
                key: object.key().unwrap_or_default().to_string(),
                size: object.size().unwrap_or(0),
                last_modified: object.last_modified().and_then(|ts| {
                    DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos())
                }),
            })
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let out = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::Request(format!("get {key}: {err}")))?;
        let body = out
            .body
            .collect()
            .await
            .map_err(|err| StorageError::Request(format!("read {key}: {err}")))?;
        Ok(body.to_vec())
    }
}
