//! The inbound pipeline: list, fetch, verify, decrypt, hash-check.
//!
//! Every byte handled here is attacker-controlled until it has been
//! decrypted, signature-verified and hash-checked. Failures classify
//! into the malformed/invalid-message taxonomy and abort the batch by
//! default; expired items (404s) are cleanup, not failures.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use deaddrop_net::NetError;
use deaddrop_protocol::{
    framing::decode_record, open_notification, IncomingItem, Payload, ProtocolError,
};

use crate::channel::Channel;
use crate::error::{ChannelError, InvalidMessageKind, Result};

/// Progress reported while a receive batch is consumed.
#[derive(Clone, Debug)]
pub enum ReceiveEvent {
    /// One payload was verified, decrypted and appended to the results.
    Opened {
        /// Position of the item in the inbox listing.
        index: usize,
        /// Number of items in the listing.
        total: usize,
    },
    /// An invalid item was skipped (only with
    /// [`crate::ChannelConfig::continue_on_invalid`]).
    Skipped {
        /// Inbox item that was skipped.
        location: Url,
        /// Why it was rejected.
        reason: String,
    },
}

/// Callback receiving [`ReceiveEvent`]s.
pub type ProgressFn = Arc<dyn Fn(&ReceiveEvent) + Send + Sync>;

/// Options for [`Channel::receive`].
#[derive(Clone, Default)]
pub struct ReceiveOptions {
    /// Ask the relay to hold the listing request open until something
    /// arrives or it disconnects.
    pub long_poll: bool,
    /// Progress callback, invoked once per opened payload.
    pub progress: Option<ProgressFn>,
}

impl ReceiveOptions {
    /// Enable long-polling.
    pub fn long_poll(mut self) -> Self {
        self.long_poll = true;
        self
    }

    /// Install a progress callback.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl std::fmt::Debug for ReceiveOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiveOptions")
            .field("long_poll", &self.long_poll)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Channel {
    /// Drain the inbox: list, then fetch, verify and decrypt each item.
    ///
    /// Items the relay has already expired (404 on the notification or
    /// on the payload blob) have their inbox pointers deleted and are
    /// skipped. Successfully opened payloads are *not* deleted; call
    /// [`Channel::delete_inbox_item`] to acknowledge them.
    ///
    /// Under `long_poll`, a transport timeout on the listing request is
    /// the relay's idle disconnect and is retried silently for as long
    /// as `cancel` is unset.
    ///
    /// # Errors
    ///
    /// Per-item `Malformed` / `InvalidMessage` failures abort the batch
    /// unless the channel was configured with `continue_on_invalid`, in
    /// which case they are reported through the progress callback and
    /// skipped. Cancellation always aborts with `Cancelled`.
    pub async fn receive(
        &self,
        options: &ReceiveOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Payload>> {
        let (inbox_url, owner_code) = self.inbox_credentials().await?;

        let listing = loop {
            match self
                .relay
                .list(&inbox_url, &owner_code, options.long_poll, cancel)
                .await
            {
                Ok(listing) => break listing,
                Err(error) if cancel.is_cancelled() => {
                    return Err(match error {
                        NetError::Cancelled | NetError::Timeout => ChannelError::Cancelled,
                        other => other.into(),
                    });
                }
                Err(NetError::Timeout) | Err(NetError::Cancelled) => {
                    debug!("inbox listing timed out without caller cancellation; retrying");
                    continue;
                }
                Err(error) => return Err(error.into()),
            }
        };

        let total = listing.items.len();
        debug!(total, "inbox listed");
        let mut payloads = Vec::new();

        for (index, item) in listing.items.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ChannelError::Cancelled);
            }
            match self.open_item(item, &owner_code, cancel).await {
                Ok(payload) => {
                    payloads.push(payload);
                    if let Some(progress) = &options.progress {
                        progress(&ReceiveEvent::Opened { index, total });
                    }
                }
                Err(ChannelError::Transport(NetError::NotFound(gone))) => {
                    warn!(%gone, item = %item.location, "inbox item expired; deleting pointer");
                    self.relay
                        .delete_item(&inbox_url, &owner_code, &item.location, cancel)
                        .await?;
                }
                Err(ChannelError::Cancelled) => return Err(ChannelError::Cancelled),
                Err(error @ (ChannelError::Malformed(_) | ChannelError::InvalidMessage(_)))
                    if self.config.continue_on_invalid =>
                {
                    warn!(item = %item.location, %error, "skipping invalid inbox item");
                    if let Some(progress) = &options.progress {
                        progress(&ReceiveEvent::Skipped {
                            location: item.location.clone(),
                            reason: error.to_string(),
                        });
                    }
                }
                Err(error) => return Err(error),
            }
        }

        Ok(payloads)
    }

    /// Acknowledge a received payload by deleting its inbox item.
    ///
    /// Absence (the relay already dropped the item) is success.
    pub async fn delete_inbox_item(
        &self,
        payload: &Payload,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let reference_uri = payload
            .reference_uri
            .clone()
            .ok_or(ChannelError::MissingReferenceLocation)?;
        let (inbox_url, owner_code) = self.inbox_credentials().await?;
        self.relay
            .delete_item(&inbox_url, &owner_code, &reference_uri, cancel)
            .await?;
        debug!(item = %reference_uri, "inbox item deleted");
        Ok(())
    }

    async fn inbox_credentials(&self) -> Result<(Url, String)> {
        let own = self.own.read().await;
        let inbox_url = own
            .public()
            .inbox_url
            .clone()
            .ok_or(ChannelError::InboxNotCreated)?;
        let owner_code = own
            .inbox_owner_code()
            .ok_or(ChannelError::MissingOwnerCode)?
            .to_owned();
        Ok((inbox_url, owner_code))
    }

    /// Fetch, verify and decrypt one inbox item.
    async fn open_item(
        &self,
        item: &IncomingItem,
        owner_code: &str,
        cancel: &CancellationToken,
    ) -> Result<Payload> {
        let wire = self
            .relay
            .fetch_item(&item.location, owner_code, cancel)
            .await?;

        let opened = {
            let own = self.own.read().await;
            open_notification(
                self.crypto.as_ref(),
                &own.public().signing_pub,
                own.encryption_priv(),
                &wire,
                &self.config.frame_limits,
            )?
        };

        let mut reference = opened.reference;
        reference.reference_location = Some(item.location.clone());

        let blob = self.blobs.fetch(&reference.location, cancel).await?;
        let digest = self.crypto.hash(&blob);
        if !bool::from(digest.as_slice().ct_eq(reference.hash.as_slice())) {
            return Err(ChannelError::InvalidMessage(InvalidMessageKind::HashMismatch));
        }

        let plain = self
            .crypto
            .decrypt(reference.sym_key.as_bytes(), &reference.sym_iv, &blob)
            .map_err(|e| ChannelError::Malformed(ProtocolError::Crypto(e)))?;
        let mut payload: Payload = decode_record(&plain)?;
        payload.reference_uri = Some(item.location.clone());
        debug!(item = %item.location, author = %opened.author.thumbprint(self.crypto.as_ref()), "payload opened");
        Ok(payload)
    }
}
