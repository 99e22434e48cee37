//! # deaddrop-protocol
//!
//! The wire layer of the deaddrop channel. Everything here is pure:
//! bytes in, bytes or typed records out. Network and storage I/O live in
//! `deaddrop-net`; orchestration lives in `deaddrop-core`.
//!
//! ## Wire primitives
//!
//! - **size-and-buffer**: a 4-byte little-endian length followed by that
//!   many bytes, bounded by a configurable ceiling before allocation
//!   ([`framing`])
//! - **record**: canonical binary encoding of the typed records
//!   (endpoints, payload references, payloads, address-book entries,
//!   inbox listings)
//!
//! ## Envelope
//!
//! The notification envelope ([`notification`]) is built inside-out:
//!
//! ```text
//! +--------------------------------------------+
//! | Wire body W                                |
//! |  frame: sealed symmetric key               |
//! |  frame: IV                                 |
//! |  frame: ciphertext of S  ----------------+ |
//! +------------------------------------------|-+
//!                                            v
//! +--------------------------------------------+
//! | Signed envelope S                          |
//! |  frame: signature over B                   |
//! |  raw:   bound plaintext B  --------------+ |
//! +------------------------------------------|-+
//!                                            v
//! +--------------------------------------------+
//! | Bound plaintext B                          |
//! |  frame: recipient signing key (binding)    |
//! |  int64: creation timestamp (UTC millis)    |
//! |  record: author endpoint                   |
//! |  record: payload reference                 |
//! +--------------------------------------------+
//! ```
//!
//! The signature covers the recipient binding, so a relay cannot re-wrap
//! a captured notification for a different victim.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod endpoint;
pub mod error;
pub mod framing;
pub mod limits;
pub mod notification;
pub mod reference;

pub use endpoint::{create_address_book_entry, AddressBookEntry, Endpoint, OwnEndpoint};
pub use error::{ProtocolError, Result};
pub use framing::{FrameReader, FrameWriter};
pub use limits::{FrameLimits, MAX_FRAME_LEN};
pub use notification::{open_notification, seal_notification, OpenedNotification};
pub use reference::{IncomingItem, IncomingList, Payload, PayloadReference};
