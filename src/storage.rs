//! Object-storage collaborator holding finalized recordings.

use async_trait::async_trait;
use tracing::info;

use crate::config::StorageConfig;
use crate::error::{Result, ServiceError};

/// Durable blob storage addressed by key, served from a public URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// [`ObjectStore`] over an S3-style HTTP gateway: objects are PUT to
/// `{endpoint}/{bucket}/{key}` and read back from the public base URL.
pub struct HttpObjectStore {
    endpoint: String,
    bucket: String,
    public_base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http: reqwest::Client::new(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let size = bytes.len();

        let response = self
            .http
            .put(self.object_url(key))
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ServiceError::upstream("object upload", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream(format!(
                "object upload returned {status}: {body}"
            )));
        }

        info!("Uploaded {} ({} bytes)", key, size);
        Ok(self.public_url(key))
    }
}

impl std::fmt::Debug for HttpObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpObjectStore")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("api_key", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> StorageConfig {
        StorageConfig {
            endpoint: "https://store.example.com/".into(),
            bucket: "recordings".into(),
            public_base_url: "https://cdn.example.com/".into(),
            api_key: "store-key".into(),
        }
    }

    #[test]
    fn urls_are_built_from_bucket_and_key() {
        let store = HttpObjectStore::new(&test_config());
        assert_eq!(
            store.object_url("recordings/abc.wav"),
            "https://store.example.com/recordings/recordings/abc.wav"
        );
        assert_eq!(
            store.public_url("recordings/abc.wav"),
            "https://cdn.example.com/recordings/abc.wav"
        );
    }

    #[test]
    fn debug_masks_api_key() {
        let store = HttpObjectStore::new(&test_config());
        let debug = format!("{store:?}");
        assert!(!debug.contains("store-key"));
    }
}
