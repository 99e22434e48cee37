//! The inbox relay capability and its HTTP implementation.
//!
//! The relay is untrusted: it hosts inboxes, accepts unauthenticated
//! notification POSTs, and requires the owner code (a bearer secret
//! issued at inbox creation) for listing, fetching and deletion. All
//! confidentiality and integrity comes from the envelope format, not
//! from the relay.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use deaddrop_protocol::IncomingList;

use crate::error::{NetError, Result};

/// Authentication scheme carrying the inbox owner code.
///
/// Part of the relay wire contract; the relay accepts
/// `Authorization: InboxOwner <code>` on list, fetch and delete.
pub const OWNER_CODE_SCHEME: &str = "InboxOwner";

/// The grant issued by the relay when an inbox is created.
#[derive(Clone, Debug)]
pub struct InboxGrant {
    /// Where peers post notifications and the owner lists them.
    pub inbox_url: Url,
    /// Bearer secret proving list/delete authority.
    pub owner_code: String,
}

/// Inbox operations against the relay.
///
/// Every method observes the caller's cancellation token at its
/// suspension point and reports cancellation as
/// [`NetError::Cancelled`].
#[async_trait]
pub trait InboxRelay: Send + Sync {
    /// Create a new inbox under `base`, returning its URL and owner code.
    async fn create_inbox(&self, base: &Url, cancel: &CancellationToken) -> Result<InboxGrant>;

    /// List pending inbox items, optionally long-polling until the
    /// relay has something or disconnects.
    async fn list(
        &self,
        inbox_url: &Url,
        owner_code: &str,
        long_poll: bool,
        cancel: &CancellationToken,
    ) -> Result<IncomingList>;

    /// Fetch a notification body. A relay-expired item is
    /// [`NetError::NotFound`].
    async fn fetch_item(
        &self,
        location: &Url,
        owner_code: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>>;

    /// Post a notification body into a recipient's inbox.
    ///
    /// `lifetime_minutes` tells the relay when it may drop the item.
    /// Posting is unauthenticated.
    async fn post_notification(
        &self,
        inbox_url: &Url,
        body: Vec<u8>,
        lifetime_minutes: u64,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Delete an inbox item. Absence is success.
    async fn delete_item(
        &self,
        inbox_url: &Url,
        owner_code: &str,
        notification: &Url,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateInboxResponse {
    message_receiving_endpoint: Url,
    inbox_owner_code: String,
}

/// Production relay client over HTTPS.
#[derive(Clone, Debug, Default)]
pub struct HttpRelay {
    client: reqwest::Client,
}

impl HttpRelay {
    /// Create a relay client with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a relay client with a caller-configured HTTP client
    /// (timeouts, proxies, test routing).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn owner_header(owner_code: &str) -> String {
        format!("{OWNER_CODE_SCHEME} {owner_code}")
    }

    /// Send a request, racing it against the cancellation token, and
    /// translate the status line.
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

    async fn read_bytes(
        response: reqwest::Response,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(NetError::Cancelled),
            result = response.bytes() => result?,
        };
        Ok(bytes.to_vec())
    }
}

fn join_segment(base: &Url, segment: &str) -> Result<Url> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), segment);
    Url::parse(&joined).map_err(|e| NetError::InvalidUrl(e.to_string()))
}

#[async_trait]
impl InboxRelay for HttpRelay {
    async fn create_inbox(&self, base: &Url, cancel: &CancellationToken) -> Result<InboxGrant> {
        let url = join_segment(base, "create")?;
        debug!(%url, "creating inbox");
        let response = self.send(self.client.post(url), cancel).await?;
        let body = Self::read_bytes(response, cancel).await?;
        let created: CreateInboxResponse = serde_json::from_slice(&body)
            .map_err(|e| NetError::InvalidResponse(e.to_string()))?;
        Ok(InboxGrant {
            inbox_url: created.message_receiving_endpoint,
            owner_code: created.inbox_owner_code,
        })
    }

    async fn list(
        &self,
        inbox_url: &Url,
        owner_code: &str,
        long_poll: bool,
        cancel: &CancellationToken,
    ) -> Result<IncomingList> {
        let mut url = inbox_url.clone();
        if long_poll {
            url.query_pairs_mut().append_pair("longPoll", "true");
        }
        let request = self
            .client
            .get(url)
            .header(AUTHORIZATION, Self::owner_header(owner_code));
        let response = self.send(request, cancel).await?;
        let body = Self::read_bytes(response, cancel).await?;
        serde_json::from_slice(&body).map_err(|e| NetError::InvalidResponse(e.to_string()))
    }

    async fn fetch_item(
        &self,
        location: &Url,
        owner_code: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let request = self
            .client
            .get(location.clone())
            .header(AUTHORIZATION, Self::owner_header(owner_code));
        let response = self.send(request, cancel).await?;
        Self::read_bytes(response, cancel).await
    }

    async fn post_notification(
        &self,
        inbox_url: &Url,
        body: Vec<u8>,
        lifetime_minutes: u64,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut url = inbox_url.clone();
        url.query_pairs_mut()
            .append_pair("lifetime", &lifetime_minutes.to_string());
        debug!(%url, bytes = body.len(), "posting notification");
        self.send(self.client.post(url).body(body), cancel).await?;
        Ok(())
    }

    async fn delete_item(
        &self,
        inbox_url: &Url,
        owner_code: &str,
        notification: &Url,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut url = inbox_url.clone();
        url.query_pairs_mut()
            .append_pair("notification", notification.as_str());
        let request = self
            .client
            .delete(url)
            .header(AUTHORIZATION, Self::owner_header(owner_code));
        match self.send(request, cancel).await {
            Ok(_) => Ok(()),
            // Already gone; deletion is idempotent.
            Err(NetError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
