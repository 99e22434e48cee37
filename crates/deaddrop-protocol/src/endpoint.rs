//! Endpoint identities and their published and persisted forms.
//!
//! An [`Endpoint`] is the public half of an addressable identity: a
//! signing public key, an encryption public key, and the inbox URL peers
//! post notifications to. Its identity is the thumbprint of the signing
//! key. An [`OwnEndpoint`] adds the private key halves and the inbox
//! owner code; that material leaves the process only through
//! [`OwnEndpoint::save`].

use std::io::{Read, Write};

use deaddrop_crypto::{CryptoProvider, SecretBytes};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ProtocolError, Result};
use crate::framing::{decode_record, encode_record};
use crate::limits::{FrameLimits, FRAME_HEADER_LEN};

/// The public half of an addressable identity.
///
/// Immutable once populated; peers obtain it from a published
/// address-book entry and post notifications to `inbox_url`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Signing public key. The endpoint's identity.
    pub signing_pub: Vec<u8>,
    /// Encryption public key notification keys are sealed to.
    pub encryption_pub: Vec<u8>,
    /// Inbox to post notifications to. Absent until an inbox is created.
    pub inbox_url: Option<Url>,
}

impl Endpoint {
    /// Thumbprint identifying this endpoint.
    pub fn thumbprint(&self, crypto: &dyn CryptoProvider) -> String {
        crypto.thumbprint(&self.signing_pub)
    }

    /// Whether peers can post to this endpoint.
    pub fn can_receive(&self) -> bool {
        self.inbox_url.is_some()
    }
}

/// An endpoint together with its private key material.
#[derive(Clone, Serialize, Deserialize)]
pub struct OwnEndpoint {
    endpoint: Endpoint,
    signing_priv: SecretBytes,
    encryption_priv: SecretBytes,
    inbox_owner_code: Option<String>,
}

impl OwnEndpoint {
    /// Mint a new endpoint with fresh signing and encryption key pairs.
    pub fn generate(crypto: &dyn CryptoProvider) -> Result<Self> {
        let signing = crypto.generate_signing_keys()?;
        let encryption = crypto.generate_encryption_keys()?;
        Ok(Self {
            endpoint: Endpoint {
                signing_pub: signing.public,
                encryption_pub: encryption.public,
                inbox_url: None,
            },
            signing_priv: signing.private,
            encryption_priv: encryption.private,
            inbox_owner_code: None,
        })
    }

    /// The public endpoint.
    pub fn public(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Signing private key bytes.
    ///
    /// # Security
    ///
    /// Handle with care; avoid logging or copying beyond the signing
    /// call site.
    pub fn signing_priv(&self) -> &[u8] {
        self.signing_priv.as_bytes()
    }

    /// Encryption private key bytes.
    ///
    /// # Security
    ///
    /// Handle with care; avoid logging or copying beyond the unseal
    /// call site.
    pub fn encryption_priv(&self) -> &[u8] {
        self.encryption_priv.as_bytes()
    }

    /// The bearer secret proving list/delete authority over the inbox.
    pub fn inbox_owner_code(&self) -> Option<&str> {
        self.inbox_owner_code.as_deref()
    }

    /// Record the inbox grant issued by the relay.
    pub fn set_inbox(&mut self, inbox_url: Url, owner_code: String) {
        self.endpoint.inbox_url = Some(inbox_url);
        self.inbox_owner_code = Some(owner_code);
    }

    /// Thumbprint identifying this endpoint.
    pub fn thumbprint(&self, crypto: &dyn CryptoProvider) -> String {
        self.endpoint.thumbprint(crypto)
    }

    /// Persist the private endpoint to a stream.
    ///
    /// The stream holds one size-and-buffer frame containing the record
    /// form of the endpoint; [`OwnEndpoint::open`] inverts it.
    pub fn save<W: Write>(&self, sink: &mut W, limits: &FrameLimits) -> Result<()> {
        let record = encode_record(self)?;
        if record.len() > limits.max_frame {
            return Err(ProtocolError::FrameTooLarge {
                declared: record.len(),
                max: limits.max_frame,
            });
        }
        sink.write_all(&(record.len() as u32).to_le_bytes())?;
        sink.write_all(&record)?;
        Ok(())
    }

    /// Load a private endpoint from a stream produced by
    /// [`OwnEndpoint::save`].
    ///
    /// # Errors
    ///
    /// Any framing or deserialization failure is reported as a
    /// malformation; the stream is untrusted until it parses.
    pub fn open<R: Read>(source: &mut R) -> Result<Self> {
        Self::open_with_limits(source, &FrameLimits::default())
    }

    /// [`OwnEndpoint::open`] with explicit framing limits.
    pub fn open_with_limits<R: Read>(source: &mut R, limits: &FrameLimits) -> Result<Self> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        source.read_exact(&mut header)?;
        let declared = u32::from_le_bytes(header) as usize;
        if declared > limits.max_frame {
            return Err(ProtocolError::FrameTooLarge {
                declared,
                max: limits.max_frame,
            });
        }
        let mut record = vec![0u8; declared];
        source.read_exact(&mut record)?;
        decode_record(&record)
    }
}

impl std::fmt::Debug for OwnEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnEndpoint")
            .field("endpoint", &self.endpoint)
            .field("signing_priv", &self.signing_priv)
            .field("encryption_priv", &self.encryption_priv)
            .field(
                "inbox_owner_code",
                &self.inbox_owner_code.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// A signed, publishable record of a public endpoint.
///
/// Published as unpadded URL-safe base64 of its record form, with the
/// endpoint thumbprint appended as the URL fragment so consumers can
/// verify they resolved the intended identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressBookEntry {
    /// Record form of the public endpoint.
    pub serialized_endpoint: Vec<u8>,
    /// Signature over `serialized_endpoint` by the endpoint's signing key.
    pub signature: Vec<u8>,
}

/// Serialize and sign `own`'s public endpoint for publication.
pub fn create_address_book_entry(
    crypto: &dyn CryptoProvider,
    own: &OwnEndpoint,
) -> Result<AddressBookEntry> {
    let serialized_endpoint = encode_record(own.public())?;
    let signature = crypto.sign(own.signing_priv(), &serialized_endpoint)?;
    Ok(AddressBookEntry {
        serialized_endpoint,
        signature,
    })
}

impl AddressBookEntry {
    /// Verify the entry and recover the endpoint it publishes.
    ///
    /// # Errors
    ///
    /// `BadSignature` when the signature does not verify under the
    /// embedded signing key; `Decode` when the endpoint record is
    /// malformed.
    pub fn verify(&self, crypto: &dyn CryptoProvider) -> Result<Endpoint> {
        let endpoint: Endpoint = decode_record(&self.serialized_endpoint)?;
        crypto
            .verify(&endpoint.signing_pub, &self.serialized_endpoint, &self.signature)
            .map_err(|_| ProtocolError::BadSignature)?;
        Ok(endpoint)
    }

    /// The publishable base64url form of this entry.
    pub fn to_base64url(&self) -> Result<String> {
        Ok(crate::framing::encode_base64url(&encode_record(self)?))
    }

    /// Parse an entry from its publishable form.
    pub fn from_base64url(text: &str) -> Result<Self> {
        decode_record(&crate::framing::decode_base64url(text)?)
    }

    /// The thumbprint fragment appended to the published URL.
    pub fn fragment(&self, crypto: &dyn CryptoProvider) -> Result<String> {
        let endpoint: Endpoint = decode_record(&self.serialized_endpoint)?;
        Ok(endpoint.thumbprint(crypto))
    }
}
