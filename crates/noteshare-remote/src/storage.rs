//! Remote object storage client.
//!
//! Storage-API-compatible surface: binary upload with no-overwrite, public
//! URL derivation from an object path, listing, and removal. Removal exists
//! only for the upload orchestrator's compensating cleanup; the application
//! never deletes user content otherwise.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use noteshare_core::{Error, Result, ServiceConfig};

use crate::error::{classify_response, Service};

/// Handle to a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key within the bucket.
    pub path: String,
}

/// One entry from a bucket listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
}

/// Remote storage service operations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a binary object at `path`, refusing to overwrite.
    async fn upload_object(
        &self,
        access_token: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject>;

    /// Derive the public URL for an object path. `None` when the bucket
    /// issues no public URLs (private bucket).
    fn public_url(&self, path: &str) -> Option<String>;

    /// List up to `limit` objects under `prefix`.
    async fn list_objects(&self, prefix: &str, limit: usize) -> Result<Vec<ObjectEntry>>;

    /// Remove an object. Compensating cleanup only.
    async fn remove_object(&self, access_token: &str, path: &str) -> Result<()>;
}

// =============================================================================
// REST CLIENT
// =============================================================================

/// Storage-API-compatible REST client, scoped to one bucket.
pub struct RestStorageBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

#[derive(Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
}

/// Upload response; `Key` is `{bucket}/{path}`.
#[derive(Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

impl RestStorageBackend {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/storage/v1", config.base()),
            anon_key: config.anon_key.clone(),
            bucket: config.bucket.clone(),
        }
    }

    /// Percent-encode each path segment, keeping the separators.
    fn encode_path(path: &str) -> String {
        path.split('/')
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    async fn read_failure(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_response(Service::Storage, status, &body)
    }
}

#[async_trait]
impl StorageBackend for RestStorageBackend {
    #[instrument(skip(self, bytes), fields(subsystem = "storage", component = "rest_storage", op = "upload_object", object_path = %path, file_size = bytes.len()))]
    async fn upload_object(
        &self,
        access_token: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject> {
        let response = self
            .client
            .post(format!(
                "{}/object/{}/{}",
                self.base_url,
                self.bucket,
                Self::encode_path(path)
            ))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        let uploaded: UploadResponse = response.json().await?;
        let key = uploaded
            .key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Request("Upload returned no object path.".into()))?;

        // The service reports the key with the bucket prefixed.
        let path = key
            .strip_prefix(&format!("{}/", self.bucket))
            .unwrap_or(&key)
            .to_string();

        debug!(object_path = %path, "Upload complete");
        Ok(StoredObject { path })
    }

    fn public_url(&self, path: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }
        Some(format!(
            "{}/object/public/{}/{}",
            self.base_url,
            self.bucket,
            Self::encode_path(path)
        ))
    }

    #[instrument(skip(self), fields(subsystem = "storage", component = "rest_storage", op = "list_objects"))]
    async fn list_objects(&self, prefix: &str, limit: usize) -> Result<Vec<ObjectEntry>> {
        let response = self
            .client
            .post(format!("{}/object/list/{}", self.base_url, self.bucket))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&ListRequest {
                prefix,
                limit,
                offset: 0,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        Ok(response.json().await?)
    }

    #[instrument(skip(self), fields(subsystem = "storage", component = "rest_storage", op = "remove_object", object_path = %path))]
    async fn remove_object(&self, access_token: &str, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!(
                "{}/object/{}/{}",
                self.base_url,
                self.bucket,
                Self::encode_path(path)
            ))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = self.read_failure(response).await;
            warn!(error = %err, "Object removal failed");
            return Err(err);
        }
        Ok(())
    }
}
