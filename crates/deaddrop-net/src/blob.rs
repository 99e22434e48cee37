//! The blob-store capability and its HTTP implementation.
//!
//! The store holds opaque ciphertext blobs with an expiry and hands
//! back absolute URLs. It learns nothing about content; integrity is
//! checked by the receiver against the hash carried in the payload
//! reference.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{NetError, Result};

/// Blob upload and retrieval.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `content`, to be retained until `expires_utc`. Returns the
    /// absolute URL the blob is readable from.
    async fn upload(
        &self,
        content: &[u8],
        expires_utc: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Url>;

    /// Fetch a blob. An expired blob is [`NetError::NotFound`].
    async fn fetch(&self, location: &Url, cancel: &CancellationToken) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UploadResponse {
    location: Url,
}

/// Production blob store client over HTTPS.
///
/// Uploads POST to the store's base URL with an `expires` query
/// parameter and receive `{ "Location": "<url>" }`; fetches are plain
/// unauthenticated GETs of the returned URL.
#[derive(Clone, Debug)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    base: Url,
}

impl HttpBlobStore {
    /// Create a store client for the service at `base`.
    pub fn new(base: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    /// Create a store client with a caller-configured HTTP client.
    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response> {
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(NetError::Cancelled),
            result = request.send() => result?,
        };
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(NetError::NotFound(response.url().clone()));
        }
        if !status.is_success() {
            return Err(NetError::Status {
                status: status.as_u16(),
                url: response.url().clone(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(
        &self,
        content: &[u8],
        expires_utc: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Url> {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair(
            "expires",
            &expires_utc.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        debug!(%url, bytes = content.len(), "uploading blob");
        let response = self
            .send(self.client.post(url).body(content.to_vec()), cancel)
            .await?;
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(NetError::Cancelled),
            result = response.bytes() => result?,
        };
        let uploaded: UploadResponse = serde_json::from_slice(&body)
            .map_err(|e| NetError::InvalidResponse(e.to_string()))?;
        Ok(uploaded.location)
    }

    async fn fetch(&self, location: &Url, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let response = self.send(self.client.get(location.clone()), cancel).await?;
        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(NetError::Cancelled),
            result = response.bytes() => result?,
        };
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_parses() {
        let json = r#"{ "Location": "https://blobs.example/a1b2c3" }"#;
        let parsed: UploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.location.as_str(), "https://blobs.example/a1b2c3");
    }
}
