//! # deaddrop-crypto
//!
//! Cryptographic primitives for the deaddrop channel.
//!
//! This crate provides the operations the channel composes into its
//! envelope format:
//!
//! - **Hashing**: BLAKE3 content hashes and signing-key thumbprints
//! - **Signatures**: Ed25519 over the bound notification plaintext
//! - **Sealed boxes**: X25519 + XChaCha20-Poly1305 asymmetric encryption
//!   of per-notification symmetric keys
//! - **Symmetric encryption**: one-shot XChaCha20-Poly1305 with a fresh
//!   key and nonce per payload and per notification
//!
//! The channel never calls the primitives directly; it goes through the
//! [`CryptoProvider`] capability so tests and alternative backends can be
//! injected. [`SoftwareCryptoProvider`] is the default implementation.
//!
//! ## Security
//!
//! All secret data implements `Zeroize` for memory cleanup on drop.
//! Hash and tag comparisons on untrusted input are constant-time.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod hash;
pub mod provider;
pub mod sealed;
pub mod secret;
pub mod signing;
pub mod symmetric;

pub use error::{CryptoError, Result};
pub use hash::{thumbprint, ContentHash};
pub use provider::{CryptoProvider, KeyPair, SoftwareCryptoProvider};
pub use secret::SecretBytes;
pub use symmetric::SymmetricEncryption;
