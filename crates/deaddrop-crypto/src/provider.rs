//! The crypto capability consumed by the channel.
//!
//! The channel treats cryptography as an injected capability: the
//! envelope format fixes *where* each operation happens, the provider
//! fixes *how*. [`SoftwareCryptoProvider`] is the production default;
//! tests may substitute deterministic or failing providers.
//!
//! All key material crosses this boundary as raw bytes because the
//! endpoint records on the wire carry raw key bytes.

use crate::hash::{thumbprint, ContentHash};
use crate::secret::SecretBytes;
use crate::symmetric::SymmetricEncryption;
use crate::{sealed, signing, symmetric, Result};

/// A freshly generated key pair.
///
/// The private half is zeroized on drop.
#[derive(Debug)]
pub struct KeyPair {
    /// Public key bytes, as carried in endpoint records.
    pub public: Vec<u8>,
    /// Private key bytes.
    pub private: SecretBytes,
}

/// Cryptographic operations the channel composes into its envelopes.
///
/// Implementations must be safe to share across tasks; the channel holds
/// the provider behind an `Arc` and calls it from concurrent per-recipient
/// fan-out tasks.
pub trait CryptoProvider: Send + Sync {
    /// Generate a signing key pair for a new endpoint.
    fn generate_signing_keys(&self) -> Result<KeyPair>;

    /// Generate an encryption key pair for a new endpoint.
    fn generate_encryption_keys(&self) -> Result<KeyPair>;

    /// Hash arbitrary bytes (payload blob integrity, thumbprints).
    fn hash(&self, data: &[u8]) -> Vec<u8>;

    /// Thumbprint of a signing public key (URL-safe base64 of its hash).
    fn thumbprint(&self, signing_pub: &[u8]) -> String;

    /// Sign `data` with a signing private key.
    fn sign(&self, signing_priv: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature over `data` under a signing public key.
    fn verify(&self, signing_pub: &[u8], data: &[u8], signature: &[u8]) -> Result<()>;

    /// Asymmetrically encrypt a small plaintext to an encryption public key.
    fn seal(&self, encryption_pub: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Invert [`CryptoProvider::seal`] with the matching private key.
    fn unseal(&self, encryption_priv: &[u8], sealed: &[u8]) -> Result<Vec<u8>>;

    /// Symmetrically encrypt under a fresh one-time key and IV.
    fn encrypt(&self, plaintext: &[u8]) -> Result<SymmetricEncryption>;

    /// Invert [`CryptoProvider::encrypt`] given the key and IV.
    fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// The default software provider.
///
/// BLAKE3 hashing, Ed25519 signatures, X25519 sealed boxes and
/// XChaCha20-Poly1305 authenticated symmetric encryption.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareCryptoProvider;

impl SoftwareCryptoProvider {
    /// Create the default provider.
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for SoftwareCryptoProvider {
    fn generate_signing_keys(&self) -> Result<KeyPair> {
        let (public, private) = signing::generate_keys();
        Ok(KeyPair { public, private })
    }

    fn generate_encryption_keys(&self) -> Result<KeyPair> {
        let (public, private) = sealed::generate_keys();
        Ok(KeyPair { public, private })
    }

    fn hash(&self, data: &[u8]) -> Vec<u8> {
        ContentHash::digest(data).to_vec()
    }

    fn thumbprint(&self, signing_pub: &[u8]) -> String {
        thumbprint(signing_pub)
    }

    fn sign(&self, signing_priv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        signing::sign(signing_priv, data)
    }

    fn verify(&self, signing_pub: &[u8], data: &[u8], signature: &[u8]) -> Result<()> {
        signing::verify(signing_pub, data, signature)
    }

    fn seal(&self, encryption_pub: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        sealed::seal(encryption_pub, plaintext)
    }

    fn unseal(&self, encryption_priv: &[u8], sealed_bytes: &[u8]) -> Result<Vec<u8>> {
        sealed::unseal(encryption_priv, sealed_bytes)
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<SymmetricEncryption> {
        symmetric::encrypt(plaintext)
    }

    fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        symmetric::decrypt(key, iv, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_full_envelope_path() {
        // Exercise the provider the way the channel does: symmetric
        // encryption of a body, sealing of the key, signing of the result.
        let provider = SoftwareCryptoProvider::new();
        let signing = provider.generate_signing_keys().unwrap();
        let encryption = provider.generate_encryption_keys().unwrap();

        let body = provider.encrypt(b"payload").unwrap();
        let sealed_key = provider
            .seal(&encryption.public, body.key.as_bytes())
            .unwrap();
        let signature = provider
            .sign(signing.private.as_bytes(), &body.ciphertext)
            .unwrap();

        provider
            .verify(&signing.public, &body.ciphertext, &signature)
            .unwrap();
        let key = provider
            .unseal(encryption.private.as_bytes(), &sealed_key)
            .unwrap();
        let plain = provider.decrypt(&key, &body.iv, &body.ciphertext).unwrap();
        assert_eq!(plain, b"payload");
    }

    #[test]
    fn test_hash_matches_content_hash() {
        let provider = SoftwareCryptoProvider::new();
        assert_eq!(
            provider.hash(b"blob"),
            ContentHash::digest(b"blob").to_vec()
        );
        assert_eq!(provider.hash(b"blob").len(), ContentHash::SIZE);
    }

    #[test]
    fn test_provider_is_object_safe() {
        let provider: Box<dyn CryptoProvider> = Box::new(SoftwareCryptoProvider::new());
        let keys = provider.generate_signing_keys().unwrap();
        assert_eq!(keys.public.len(), 32);
        assert_eq!(provider.thumbprint(&keys.public).len(), 43);
    }
}
