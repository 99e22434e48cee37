//! The caller-facing error taxonomy of the channel.

use thiserror::Error;

use deaddrop_net::NetError;
use deaddrop_protocol::ProtocolError;

/// Why a cryptographically invalid message was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidMessageKind {
    /// The notification signature does not verify under the embedded
    /// author endpoint.
    BadSignature,
    /// The notification is bound to a different recipient's signing key.
    Misdirected,
    /// The payload blob does not hash to the value in the reference.
    HashMismatch,
}

impl std::fmt::Display for InvalidMessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidMessageKind::BadSignature => write!(f, "bad signature"),
            InvalidMessageKind::Misdirected => write!(f, "misdirected"),
            InvalidMessageKind::HashMismatch => write!(f, "payload hash mismatch"),
        }
    }
}

/// One failed recipient of a notification fan-out.
#[derive(Clone, Debug)]
pub struct DeliveryFailure {
    /// Thumbprint of the recipient whose POST failed.
    pub recipient: String,
    /// What went wrong for that recipient.
    pub error: String,
}

/// Errors that can occur during channel operations.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Untrusted input failed framing, length-ceiling, decoding or
    /// decryption. The originating cause is retained.
    #[error("Malformed message: {0}")]
    Malformed(#[source] ProtocolError),

    /// A message parsed but failed cryptographic validation.
    #[error("Invalid message: {0}")]
    InvalidMessage(InvalidMessageKind),

    /// The relay or blob store could not be reached or answered with an
    /// error status.
    #[error("Transport error: {0}")]
    Transport(#[source] NetError),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// This endpoint already has an inbox.
    #[error("Inbox already created")]
    InboxAlreadyCreated,

    /// This endpoint has no inbox yet.
    #[error("Inbox not created")]
    InboxNotCreated,

    /// The endpoint has an inbox URL but no owner code.
    #[error("Inbox owner code missing")]
    MissingOwnerCode,

    /// A post was attempted with no recipients.
    #[error("No recipients given")]
    NoRecipients,

    /// A recipient endpoint has no inbox URL to post to.
    #[error("Recipient {0} has no inbox")]
    RecipientNotAddressable(String),

    /// The payload was not received through an inbox, so there is no
    /// item to delete.
    #[error("Payload carries no inbox reference")]
    MissingReferenceLocation,

    /// One or more recipients of a fan-out could not be notified.
    #[error("Delivery failed for {} recipient(s)", .0.len())]
    Delivery(Vec<DeliveryFailure>),

    /// A cryptographic operation failed on locally produced data.
    #[error("Crypto error: {0}")]
    Crypto(#[from] deaddrop_crypto::CryptoError),

    /// A fan-out task could not be joined. Wrapped verbatim.
    #[error("Task failed: {0}")]
    Task(String),
}

impl From<ProtocolError> for ChannelError {
    fn from(error: ProtocolError) -> Self {
        match error {
            ProtocolError::BadSignature => {
                ChannelError::InvalidMessage(InvalidMessageKind::BadSignature)
            }
            ProtocolError::Misdirected => {
                ChannelError::InvalidMessage(InvalidMessageKind::Misdirected)
            }
            other => ChannelError::Malformed(other),
        }
    }
}

impl From<NetError> for ChannelError {
    fn from(error: NetError) -> Self {
        match error {
            NetError::Cancelled => ChannelError::Cancelled,
            other => ChannelError::Transport(other),
        }
    }
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_verification_errors_map_to_invalid_message() {
        assert!(matches!(
            ChannelError::from(ProtocolError::BadSignature),
            ChannelError::InvalidMessage(InvalidMessageKind::BadSignature)
        ));
        assert!(matches!(
            ChannelError::from(ProtocolError::Misdirected),
            ChannelError::InvalidMessage(InvalidMessageKind::Misdirected)
        ));
    }

    #[test]
    fn test_protocol_framing_errors_map_to_malformed() {
        let error = ChannelError::from(ProtocolError::Truncated {
            needed: 8,
            remaining: 2,
        });
        assert!(matches!(
            error,
            ChannelError::Malformed(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_net_cancellation_maps_to_cancelled() {
        assert!(matches!(
            ChannelError::from(NetError::Cancelled),
            ChannelError::Cancelled
        ));
        assert!(matches!(
            ChannelError::from(NetError::Timeout),
            ChannelError::Transport(NetError::Timeout)
        ));
    }
}
