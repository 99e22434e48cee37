//! The outbound pipeline: payload envelope and per-recipient fan-out.
//!
//! A post is two stages with a strict order between them: the payload
//! is encrypted and uploaded once, then every recipient independently
//! gets a freshly sealed notification carrying the resulting reference.
//! Recipient tasks run concurrently and do not share buffers; one
//! recipient's failure never stops the others, and the aggregate error
//! names exactly the recipients that failed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use deaddrop_crypto::CryptoProvider;
use deaddrop_net::InboxRelay;
use deaddrop_protocol::{
    framing::encode_record, seal_notification, Endpoint, FrameLimits, OwnEndpoint, Payload,
    PayloadReference,
};

use crate::channel::Channel;
use crate::error::{ChannelError, DeliveryFailure, Result};

impl Channel {
    /// Post a payload to a set of recipients.
    ///
    /// Uploads the encrypted payload once, then fans out one
    /// notification per recipient. Returns the payload reference that
    /// was delivered.
    ///
    /// # Errors
    ///
    /// - `NoRecipients` / `RecipientNotAddressable`: precondition
    ///   failures checked before anything is uploaded
    /// - `Delivery`: the upload succeeded but one or more recipient
    ///   POSTs failed; the error lists them by thumbprint
    /// - `Cancelled`: the token fired; already-uploaded blobs are left
    ///   to expire on their own
    pub async fn post(
        &self,
        payload: &Payload,
        recipients: &[Endpoint],
        expires_utc: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<PayloadReference> {
        if recipients.is_empty() {
            return Err(ChannelError::NoRecipients);
        }
        for recipient in recipients {
            if !recipient.can_receive() {
                return Err(ChannelError::RecipientNotAddressable(
                    recipient.thumbprint(self.crypto.as_ref()),
                ));
            }
        }

        let reference = self.post_payload(payload, expires_utc, cancel).await?;
        self.post_reference(&reference, recipients, cancel).await?;
        Ok(reference)
    }

    /// Encrypt and upload a payload, returning its reference.
    ///
    /// The payload record is encrypted under a fresh one-time key, the
    /// ciphertext is hashed and uploaded with the given expiry, and the
    /// key and IV go into the returned reference. They are published
    /// nowhere else.
    pub async fn post_payload(
        &self,
        payload: &Payload,
        expires_utc: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<PayloadReference> {
        let record = encode_record(payload)?;
        let encrypted = self.crypto.encrypt(&record)?;
        let hash = self.crypto.hash(&encrypted.ciphertext);
        let location = self
            .blobs
            .upload(&encrypted.ciphertext, expires_utc, cancel)
            .await?;
        debug!(%location, bytes = encrypted.ciphertext.len(), "payload uploaded");

        Ok(PayloadReference {
            location,
            hash,
            sym_key: encrypted.key,
            sym_iv: encrypted.iv,
            expires_utc,
            reference_location: None,
        })
    }

    /// Fan a payload reference out to recipients, one notification each.
    ///
    /// Every recipient task seals its own envelope (fresh symmetric key,
    /// recipient-bound plaintext) and POSTs it to that recipient's
    /// inbox. All tasks run to completion even when siblings fail.
    pub async fn post_reference(
        &self,
        reference: &PayloadReference,
        recipients: &[Endpoint],
        cancel: &CancellationToken,
    ) -> Result<()> {
        if recipients.is_empty() {
            return Err(ChannelError::NoRecipients);
        }

        let mut tasks = JoinSet::new();
        for recipient in recipients {
            let crypto = Arc::clone(&self.crypto);
            let relay = Arc::clone(&self.relay);
            let own = Arc::clone(&self.own);
            let recipient = recipient.clone();
            let reference = reference.clone();
            let cancel = cancel.clone();
            let limits = self.config.frame_limits;
            tasks.spawn(async move {
                let thumbprint = recipient.thumbprint(crypto.as_ref());
                let outcome = notify_recipient(
                    crypto, relay, own, &recipient, &reference, limits, &cancel,
                )
                .await;
                (thumbprint, outcome)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((thumbprint, Err(error))) => failures.push(DeliveryFailure {
                    recipient: thumbprint,
                    error: error.to_string(),
                }),
                Err(error) => return Err(ChannelError::Task(error.to_string())),
            }
        }

        if cancel.is_cancelled() {
            return Err(ChannelError::Cancelled);
        }
        if !failures.is_empty() {
            warn!(failed = failures.len(), "notification fan-out incomplete");
            return Err(ChannelError::Delivery(failures));
        }
        Ok(())
    }
}

async fn notify_recipient(
    crypto: Arc<dyn CryptoProvider>,
    relay: Arc<dyn InboxRelay>,
    own: Arc<RwLock<OwnEndpoint>>,
    recipient: &Endpoint,
    reference: &PayloadReference,
    limits: FrameLimits,
    cancel: &CancellationToken,
) -> Result<()> {
    let inbox = recipient.inbox_url.clone().ok_or_else(|| {
        ChannelError::RecipientNotAddressable(recipient.thumbprint(crypto.as_ref()))
    })?;

    let wire = {
        let own = own.read().await;
        seal_notification(
            crypto.as_ref(),
            own.public(),
            own.signing_priv(),
            recipient,
            reference,
            Utc::now(),
            &limits,
        )?
    };

    let lifetime = lifetime_minutes(reference.expires_utc, Utc::now());
    relay
        .post_notification(&inbox, wire, lifetime, cancel)
        .await?;
    debug!(%inbox, lifetime, "notification posted");
    Ok(())
}

/// Whole minutes until `expires_utc`, clamped at zero.
fn lifetime_minutes(expires_utc: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (expires_utc - now).num_minutes().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> DateTime<Utc> {
        text.parse().unwrap()
    }

    #[test]
    fn test_lifetime_floors_to_whole_minutes() {
        let now = at("2026-01-01T00:00:00Z");
        assert_eq!(lifetime_minutes(at("2026-01-01T00:10:00Z"), now), 10);
        assert_eq!(lifetime_minutes(at("2026-01-01T00:10:59Z"), now), 10);
        assert_eq!(lifetime_minutes(at("2026-01-01T00:00:30Z"), now), 0);
    }

    #[test]
    fn test_lifetime_clamps_negative_to_zero() {
        let now = at("2026-01-01T00:10:00Z");
        assert_eq!(lifetime_minutes(at("2026-01-01T00:00:00Z"), now), 0);
    }
}
