//! The channel: one endpoint's handle on the delivery system.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use deaddrop_crypto::CryptoProvider;
use deaddrop_net::{BlobStore, InboxRelay};
use deaddrop_protocol::{create_address_book_entry, AddressBookEntry, Endpoint, OwnEndpoint};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};

/// A secure channel for one endpoint.
///
/// Owns the endpoint's key material and the capability handles (crypto
/// provider, blob store, inbox relay). The capabilities are read-only
/// after construction and shared with the per-recipient fan-out tasks;
/// the endpoint sits behind a lock because inbox creation populates its
/// inbox URL and owner code.
///
/// The channel is `Send + Sync` and can be shared across tasks behind
/// an `Arc`.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use deaddrop_core::{Channel, ChannelConfig, Payload, ReceiveOptions};
/// use deaddrop_crypto::SoftwareCryptoProvider;
/// use deaddrop_net::{HttpBlobStore, HttpRelay};
/// use deaddrop_protocol::OwnEndpoint;
/// use tokio_util::sync::CancellationToken;
///
/// let crypto = Arc::new(SoftwareCryptoProvider::new());
/// let own = OwnEndpoint::generate(crypto.as_ref())?;
/// let channel = Channel::new(
///     crypto,
///     Arc::new(HttpBlobStore::new(blob_base)),
///     Arc::new(HttpRelay::new()),
///     own,
///     ChannelConfig::default(),
/// );
///
/// let cancel = CancellationToken::new();
/// channel.create_inbox(&relay_base, &cancel).await?;
/// channel.post(&Payload::new(message), &recipients, expires, &cancel).await?;
/// let received = channel.receive(&ReceiveOptions::default(), &cancel).await?;
/// ```
pub struct Channel {
    pub(crate) crypto: Arc<dyn CryptoProvider>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) relay: Arc<dyn InboxRelay>,
    pub(crate) own: Arc<RwLock<OwnEndpoint>>,
    pub(crate) config: ChannelConfig,
}

impl Channel {
    /// Create a channel around an endpoint and its capabilities.
    pub fn new(
        crypto: Arc<dyn CryptoProvider>,
        blobs: Arc<dyn BlobStore>,
        relay: Arc<dyn InboxRelay>,
        own: OwnEndpoint,
        config: ChannelConfig,
    ) -> Self {
        Self {
            crypto,
            blobs,
            relay,
            own: Arc::new(RwLock::new(own)),
            config,
        }
    }

    /// The channel's public endpoint.
    pub async fn endpoint(&self) -> Endpoint {
        self.own.read().await.public().clone()
    }

    /// The channel's identity thumbprint.
    pub async fn thumbprint(&self) -> String {
        self.own.read().await.thumbprint(self.crypto.as_ref())
    }

    /// Create this endpoint's inbox on the relay at `base`.
    ///
    /// Populates the endpoint's inbox URL and owner code from the grant.
    ///
    /// # Errors
    ///
    /// `InboxAlreadyCreated` if the endpoint already has an inbox.
    pub async fn create_inbox(&self, base: &Url, cancel: &CancellationToken) -> Result<Url> {
        let mut own = self.own.write().await;
        if own.public().inbox_url.is_some() {
            return Err(ChannelError::InboxAlreadyCreated);
        }
        let grant = self.relay.create_inbox(base, cancel).await?;
        info!(inbox = %grant.inbox_url, "inbox created");
        own.set_inbox(grant.inbox_url.clone(), grant.owner_code);
        Ok(grant.inbox_url)
    }

    /// Serialize and sign the public endpoint for publication.
    pub async fn create_address_book_entry(&self) -> Result<AddressBookEntry> {
        let own = self.own.read().await;
        Ok(create_address_book_entry(self.crypto.as_ref(), &own)?)
    }

    /// Persist the private endpoint to a stream.
    pub async fn save_endpoint<W: Write>(&self, sink: &mut W) -> Result<()> {
        let own = self.own.read().await;
        own.save(sink, &self.config.frame_limits)?;
        Ok(())
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
