use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::{ImageStore, ObjectMetadata};
use crate::error::StoreError;
use crate::fetch::CacheKey;
use crate::transform::ImageFormat;

/// S3-backed implementation of `ImageStore`.
///
/// The bucket comes from each request, so one store serves every bucket the
/// credentials can reach. Variants are written next to their original under
/// [`CacheKey::modified_object_key`].
#[derive(Clone)]
pub struct S3ImageStore {
    client: Client,
}

impl S3ImageStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                let is_no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                classify_error(is_no_such_key, status, e.to_string(), bucket, key)
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .into_bytes();

        Ok(data)
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn head(&self, bucket: &str, image_id: &str) -> Result<ObjectMetadata, StoreError> {
        let head = self
            .client
            .head_object()
            .bucket(bucket)
            .key(image_id)
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                let is_not_found = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                classify_error(is_not_found, status, e.to_string(), bucket, image_id)
            })?;

        Ok(ObjectMetadata::new(head.content_type().map(str::to_string)))
    }

    async fn read_original(&self, bucket: &str, image_id: &str) -> Result<Bytes, StoreError> {
        self.get(bucket, image_id).await
    }

    async fn read_modified(&self, key: &CacheKey) -> Result<Bytes, StoreError> {
        self.get(&key.bucket, &key.modified_object_key()).await
    }

    async fn write_modified(&self, key: &CacheKey, data: Bytes) -> Result<(), StoreError> {
        let object_key = key.modified_object_key();
        let content_type = ImageFormat::sniff(&data).content_type();
        let size = data.len();

        self.client
            .put_object()
            .bucket(key.bucket.as_ref())
            .key(&object_key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;

        debug!(bucket = %key.bucket, key = %object_key, size, "Wrote modified image");
        Ok(())
    }
}

/// Map an SDK failure to a `StoreError`.
///
/// S3-compatible services do not all report missing objects the same way,
/// so the typed error, the raw status and the message are all checked.
fn classify_error(
    typed_not_found: bool,
    status: Option<u16>,
    message: String,
    bucket: &str,
    key: &str,
) -> StoreError {
    if typed_not_found
        || status == Some(404)
        || message.contains("NotFound")
        || message.contains("NoSuchKey")
    {
        return StoreError::NotFound(format!("s3://{}/{}", bucket, key));
    }

    if status.is_none() {
        // No response at all: the request never reached the service
        return StoreError::Connection(message);
    }

    StoreError::S3(message)
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
///
/// For AWS S3, pass `None` to use the default endpoint:
/// ```ignore
/// let client = create_s3_client(None, "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
