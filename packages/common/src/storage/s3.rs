use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;

use super::error::StorageError;
use super::traits::{BlobStore, StoredObject};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint (MinIO, R2, Supabase storage). AWS is used when absent.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

fn default_region() -> String {
    "us-east-1".into()
}

/// Blob store backed by a single S3-compatible bucket.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
}

impl S3BlobStore {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .with_path_style();

        Ok(Self { bucket })
    }
}

fn check_status(key: &str, status: u16, body: &[u8]) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        _ => Err(StorageError::Backend(format!(
            "HTTP {status}: {}",
            String::from_utf8_lossy(body)
        ))),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(key, response.status_code(), response.as_slice())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(key, response.status_code(), response.as_slice())?;

        let content_type = response
            .headers()
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty());

        Ok(StoredObject {
            data: response.to_vec(),
            content_type,
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        match check_status(key, response.status_code(), response.as_slice()) {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let (_, status) = self
            .bucket
            .head_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        match status {
            200..=299 => Ok(true),
            404 => Ok(false),
            other => Err(StorageError::Backend(format!("HTTP {other} on HEAD {key}"))),
        }
    }
}
