//! Payloads, payload references and inbox listings.

use chrono::{DateTime, Utc};
use deaddrop_crypto::SecretBytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// The compact pointer a notification carries.
///
/// When decrypted it lets the recipient fetch the payload blob, check
/// its hash, and open it with the one-time symmetric key. The key is
/// zeroized with the reference.
///
/// `reference_location` is populated by the receiver (the inbox item the
/// notification was fetched from) and never appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayloadReference {
    /// Absolute URL of the uploaded ciphertext blob.
    pub location: Url,
    /// Hash of the ciphertext blob at `location`.
    pub hash: Vec<u8>,
    /// One-time symmetric key for the blob.
    pub sym_key: SecretBytes,
    /// IV the blob was encrypted under.
    pub sym_iv: Vec<u8>,
    /// When the blob store expires the blob.
    pub expires_utc: DateTime<Utc>,
    /// Inbox item this reference was fetched from. Receiver-populated.
    #[serde(skip)]
    pub reference_location: Option<Url>,
}

/// Opaque application bytes moving through the channel.
///
/// `reference_uri` is populated by the receiver after decryption (the
/// inbox item location) so the caller can later delete the inbox item;
/// it never appears on the wire.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Application content.
    pub content: Vec<u8>,
    /// Inbox item this payload arrived through. Receiver-populated.
    #[serde(skip)]
    pub reference_uri: Option<Url>,
}

impl Payload {
    /// Wrap application bytes for sending.
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            reference_uri: None,
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("content", &format!("[{} bytes]", self.content.len()))
            .field("reference_uri", &self.reference_uri)
            .finish()
    }
}

/// One entry of an inbox listing, as reported by the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncomingItem {
    /// Where to fetch the notification body.
    pub location: Url,
    /// When the relay accepted the notification.
    pub received_utc: DateTime<Utc>,
}

/// An inbox listing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncomingList {
    /// Pending items, in relay order.
    pub items: Vec<IncomingItem>,
}
