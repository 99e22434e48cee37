//! Notification envelope construction and its inverse.
//!
//! A notification carries a [`PayloadReference`] to one recipient. The
//! envelope is built inside-out: the bound plaintext opens with the
//! recipient's signing key so a relay cannot re-target a captured
//! notification, the author's signature covers that binding, and the
//! whole signed envelope is encrypted under a fresh symmetric key that
//! only the recipient can unseal.
//!
//! Opening inverts the construction and ingests attacker-controlled
//! bytes at every step; each step fails closed.

use chrono::{DateTime, Utc};
use deaddrop_crypto::CryptoProvider;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::endpoint::Endpoint;
use crate::error::{ProtocolError, Result};
use crate::framing::{FrameReader, FrameWriter};
use crate::limits::FrameLimits;
use crate::reference::PayloadReference;

/// A notification after decryption and verification.
#[derive(Debug)]
pub struct OpenedNotification {
    /// The sender's public endpoint, as embedded in the signed region.
    pub author: Endpoint,
    /// The payload reference the notification delivers.
    pub reference: PayloadReference,
    /// When the sender built the notification.
    pub created_utc: DateTime<Utc>,
}

/// Build the wire body of a notification for one recipient.
///
/// Layout, inside-out:
///
/// 1. bound plaintext `B`: framed recipient signing key, 8-byte LE
///    creation timestamp (Unix milliseconds), author endpoint record,
///    payload reference record
/// 2. signed envelope `S`: framed signature over `B`, then `B` itself
/// 3. wire body `W`: framed sealed symmetric key, framed IV, framed
///    ciphertext of `S`
///
/// The symmetric key and IV are fresh per recipient.
pub fn seal_notification(
    crypto: &dyn CryptoProvider,
    author: &Endpoint,
    author_signing_priv: &[u8],
    recipient: &Endpoint,
    reference: &PayloadReference,
    created_utc: DateTime<Utc>,
    limits: &FrameLimits,
) -> Result<Vec<u8>> {
    let mut bound = FrameWriter::new(*limits);
    bound.write_frame(&recipient.signing_pub)?;
    bound.write_i64_le(created_utc.timestamp_millis());
    bound.write_record(author)?;
    bound.write_record(reference)?;
    let bound = bound.into_bytes();

    let signature = crypto.sign(author_signing_priv, &bound)?;
    let mut signed = FrameWriter::new(*limits);
    signed.write_frame(&signature)?;
    signed.write_raw(&bound);
    let signed = signed.into_bytes();

    let encrypted = crypto.encrypt(&signed)?;
    let sealed_key = crypto.seal(&recipient.encryption_pub, encrypted.key.as_bytes())?;

    let mut wire = FrameWriter::new(*limits);
    wire.write_frame(&sealed_key)?;
    wire.write_frame(&encrypted.iv)?;
    wire.write_frame(&encrypted.ciphertext)?;
    Ok(wire.into_bytes())
}

/// Decrypt and verify a notification wire body.
///
/// Inverts [`seal_notification`]: parse the three wire frames, unseal
/// the symmetric key, decrypt the signed envelope, verify the author's
/// signature over the bound region, then check the recipient binding
/// against `recipient_signing_pub` (in constant time).
///
/// # Errors
///
/// - framing and record failures: the malformation variants
/// - signature failure: [`ProtocolError::BadSignature`]
/// - binding mismatch: [`ProtocolError::Misdirected`]
pub fn open_notification(
    crypto: &dyn CryptoProvider,
    recipient_signing_pub: &[u8],
    recipient_encryption_priv: &[u8],
    wire: &[u8],
    limits: &FrameLimits,
) -> Result<OpenedNotification> {
    let mut reader = FrameReader::new(wire, *limits);
    let sealed_key = reader.read_frame()?;
    let iv = reader.read_frame()?;
    let ciphertext = reader.read_frame()?;
    reader.expect_end()?;

    let key = Zeroizing::new(crypto.unseal(recipient_encryption_priv, sealed_key)?);
    let signed = Zeroizing::new(crypto.decrypt(&key, iv, ciphertext)?);

    let mut reader = FrameReader::new(&signed, *limits);
    let signature = reader.read_frame()?;
    let bound = reader.rest();

    let mut fields = FrameReader::new(bound, *limits);
    let declared_recipient = fields.read_frame()?;
    let created_millis = fields.read_i64_le()?;
    let author: Endpoint = fields.read_record()?;
    let reference: PayloadReference = fields.read_record()?;
    fields.expect_end()?;

    crypto
        .verify(&author.signing_pub, bound, signature)
        .map_err(|_| ProtocolError::BadSignature)?;

    if !bool::from(declared_recipient.ct_eq(recipient_signing_pub)) {
        return Err(ProtocolError::Misdirected);
    }

    let created_utc = DateTime::<Utc>::from_timestamp_millis(created_millis)
        .ok_or_else(|| ProtocolError::Decode("creation timestamp out of range".into()))?;

    Ok(OpenedNotification {
        author,
        reference,
        created_utc,
    })
}
