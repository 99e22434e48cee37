//! # deaddrop-core
//!
//! The deaddrop secure channel: end-to-end encrypted, asynchronous
//! message delivery between endpoints that never need to be online at
//! the same time.
//!
//! Senders encrypt a payload once, upload the ciphertext to a blob
//! store, and deposit a small encrypted payload reference into each
//! recipient's inbox on an untrusted relay. Recipients poll their
//! inbox, decrypt and verify each reference, fetch and hash-check the
//! blob, and acknowledge by deleting the inbox item.
//!
//! ```text
//! send:    payload ──encrypt──► blob store
//!                      │
//!                  reference ──seal per recipient──► inboxes
//!
//! receive: inbox list ──► fetch ──► verify + decrypt ──► blob fetch
//!                                                           │
//!                                  payload ◄──hash-check────┘
//! ```
//!
//! The [`Channel`] is the entry point; it composes the crypto provider,
//! blob store and relay capabilities. See [`Channel::post`] and
//! [`Channel::receive`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod error;
pub mod inbound;
pub mod outbound;

pub use channel::Channel;
pub use config::ChannelConfig;
pub use error::{ChannelError, DeliveryFailure, InvalidMessageKind, Result};
pub use inbound::{ProgressFn, ReceiveEvent, ReceiveOptions};

pub use deaddrop_crypto::{CryptoProvider, SoftwareCryptoProvider};
pub use deaddrop_net::{BlobStore, HttpBlobStore, HttpRelay, InboxRelay};
pub use deaddrop_protocol::{
    AddressBookEntry, Endpoint, IncomingItem, IncomingList, OwnEndpoint, Payload, PayloadReference,
};

pub use tokio_util::sync::CancellationToken;
