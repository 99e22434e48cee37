//! # deaddrop-net
//!
//! Transport capabilities for the deaddrop channel.
//!
//! The channel talks to two external services, both modeled as traits so
//! tests can plug in-memory fakes:
//!
//! - [`InboxRelay`]: the untrusted relay hosting inboxes
//!   (create / list / fetch / post / delete)
//! - [`BlobStore`]: the content store holding encrypted payload blobs
//!   (upload with expiry / fetch)
//!
//! [`HttpRelay`] and [`HttpBlobStore`] are the production
//! implementations over `reqwest`. Every request races the caller's
//! cancellation token; transport timeouts and caller cancellation stay
//! distinguishable so long-poll retry logic can tell them apart.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod blob;
pub mod error;
pub mod relay;

pub use blob::{BlobStore, HttpBlobStore};
pub use error::{NetError, Result};
pub use relay::{HttpRelay, InboxGrant, InboxRelay};
