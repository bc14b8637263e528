//! S3 object store
//!
//! Works against AWS S3 and S3-compatible storage (Cloudflare R2, MinIO,
//! DigitalOcean Spaces) when `endpoint` is set.

use super::{normalize_key, ObjectMeta, ObjectStore};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};
use updraft_core::types::S3StoreConfig;
use updraft_core::{Error, Result};

/// Bucket-backed object store
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    /// Prepended to every key
    prefix: String,
}

impl S3ObjectStore {
    pub async fn new(config: &S3StoreConfig) -> Result<Self> {
        let client = Self::create_client(&config.region, config.endpoint.as_deref()).await;
        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            prefix: normalize_prefix(&config.prefix),
        })
    }

    /// Create an S3 client with the given region and optional endpoint
    async fn create_client(region: &str, endpoint: Option<&str>) -> Client {
        let region = Region::new(region.to_string());

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(endpoint_url) = endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint_url);
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint_url)
                .force_path_style(true); // Required for MinIO and many S3-compatible services
        }

        Client::from_conf(s3_config_builder.build())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn make_key(&self, key: &str) -> Option<String> {
        normalize_key(key).map(|k| format!("{}{}", self.prefix, k))
    }
}

/// `""` stays empty; anything else ends with exactly one `/`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, meta: &ObjectMeta) -> Result<()> {
        let full_key = self
            .make_key(key)
            .ok_or_else(|| Error::store(key, "invalid object key"))?;
        let size = bytes.len();
        debug!(
            "Uploading {} bytes: s3://{}/{}",
            size, self.bucket, full_key
        );

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .body(ByteStream::from(bytes))
            .content_type(&meta.content_type);
        if let Some(cache_control) = &meta.cache_control {
            request = request.cache_control(cache_control);
        }

        request
            .send()
            .await
            .map_err(|e| Error::store(key, e.into_service_error().to_string()))?;

        info!("Uploaded s3://{}/{} ({} bytes)", self.bucket, full_key, size);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let full_key = self
            .make_key(key)
            .ok_or_else(|| Error::not_found(format!("object {}", key)))?;
        debug!("Downloading s3://{}/{}", self.bucket, full_key);

        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Err(Error::not_found(format!("object {}", key)));
                }
                return Err(Error::store(key, service_error.to_string()));
            }
        };

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| Error::store(key, format!("Failed to read response body: {}", e)))?;

        Ok(body.into_bytes().to_vec())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let full_prefix = format!("{}{}", self.prefix, prefix);
        debug!("Listing s3://{}/{}", self.bucket, full_prefix);

        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&full_prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| Error::store(prefix, e.into_service_error().to_string()))?;

            for object in resp.contents.unwrap_or_default() {
                if let Some(key) = object.key {
                    if let Some(stripped) = key.strip_prefix(&self.prefix) {
                        keys.push(stripped.to_string());
                    }
                }
            }

            if resp.is_truncated == Some(true) {
                continuation_token = resp.next_continuation_token;
            } else {
                break;
            }
        }

        keys.sort();
        debug!("Found {} objects under {}", keys.len(), full_prefix);
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_key = self
            .make_key(key)
            .ok_or_else(|| Error::store(key, "invalid object key"))?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| Error::store(key, e.into_service_error().to_string()))?;

        info!("Deleted s3://{}/{}", self.bucket, full_key);
        Ok(())
    }
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
