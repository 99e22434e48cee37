//! Error types for wire-format operations.

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire data.
///
/// Everything except `BadSignature` and `Misdirected` is a malformation
/// of untrusted input; the channel maps those two to its
/// invalid-message taxonomy and the rest to its malformed taxonomy.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A size-and-buffer frame declared a length over the ceiling.
    #[error("Frame too large: declared {declared} bytes, ceiling is {max}")]
    FrameTooLarge {
        /// Length declared by the frame header.
        declared: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// The input ended before a declared length was satisfied.
    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the current read required.
        needed: usize,
        /// Bytes actually remaining.
        remaining: usize,
    },

    /// Record or field decoding failed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Record encoding failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// The notification signature does not verify under the embedded
    /// author endpoint.
    #[error("Notification signature verification failed")]
    BadSignature,

    /// The notification binds a different recipient's signing key.
    #[error("Notification is bound to a different recipient")]
    Misdirected,

    /// Cryptographic operation failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] deaddrop_crypto::CryptoError),

    /// Stream I/O failed during endpoint save or open.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
