//! Sealed-box asymmetric encryption.
//!
//! Encrypts a small plaintext (the per-notification symmetric key) to a
//! recipient's static X25519 public key. The sender generates a one-use
//! ephemeral key pair, performs Diffie-Hellman with the recipient's
//! static key, derives an XChaCha20-Poly1305 key from the shared secret,
//! and prepends the ephemeral public key and nonce to the ciphertext:
//!
//! ```text
//! [ephemeral_pub: 32][nonce: 24][ciphertext + tag]
//! ```

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::secret::SecretBytes;
use crate::symmetric::NONCE_SIZE;
use crate::{CryptoError, Result};

/// Size of an X25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an X25519 private key in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Fixed overhead of a sealed box over its plaintext.
pub const SEALED_OVERHEAD: usize = PUBLIC_KEY_SIZE + NONCE_SIZE + 16;

/// Key-derivation context binding derived keys to this construction.
const SEAL_CONTEXT: &str = "deaddrop sealed box v1";

/// Generate a fresh X25519 key pair.
///
/// Returns `(public, private)` as raw byte buffers; the private half is
/// wrapped in [`SecretBytes`] so it is zeroized on drop.
pub fn generate_keys() -> (Vec<u8>, SecretBytes) {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    (
        public.to_bytes().to_vec(),
        SecretBytes::new(secret.to_bytes().to_vec()),
    )
}

fn derive_key(shared: &[u8; 32], ephemeral_pub: &[u8; 32], recipient_pub: &[u8; 32]) -> [u8; 32] {
    // Bind the derived key to both public halves of the exchange.
    let mut material = Zeroizing::new(Vec::with_capacity(96));
    material.extend_from_slice(shared);
    material.extend_from_slice(ephemeral_pub);
    material.extend_from_slice(recipient_pub);
    blake3::derive_key(SEAL_CONTEXT, &material)
}

/// Encrypt `plaintext` to the holder of `recipient_pub`.
///
/// # Errors
///
/// Returns a length error for a malformed public key and
/// `CryptoError::Encryption` if the AEAD fails.
pub fn seal(recipient_pub: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let recipient: [u8; PUBLIC_KEY_SIZE] =
        recipient_pub
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_SIZE,
                actual: recipient_pub.len(),
            })?;

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_pub = PublicKey::from(&ephemeral).to_bytes();
    let shared = ephemeral.diffie_hellman(&PublicKey::from(recipient));
    let key = Zeroizing::new(derive_key(shared.as_bytes(), &ephemeral_pub, &recipient));

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new((&*key).into());
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Encryption("sealed box encryption failed".into()))?;

    let mut sealed = Vec::with_capacity(SEALED_OVERHEAD + plaintext.len());
    sealed.extend_from_slice(&ephemeral_pub);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a sealed box with the recipient's private key.
///
/// # Errors
///
/// Returns `CryptoError::InvalidSealedBox` when the input is too short
/// and `CryptoError::Decryption` when authentication fails.
pub fn unseal(recipient_priv: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    let private: [u8; PRIVATE_KEY_SIZE] =
        recipient_priv
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: PRIVATE_KEY_SIZE,
                actual: recipient_priv.len(),
            })?;

    if sealed.len() < SEALED_OVERHEAD {
        return Err(CryptoError::InvalidSealedBox(format!(
            "{} bytes, need at least {}",
            sealed.len(),
            SEALED_OVERHEAD
        )));
    }

    let mut ephemeral_pub = [0u8; PUBLIC_KEY_SIZE];
    ephemeral_pub.copy_from_slice(&sealed[..PUBLIC_KEY_SIZE]);
    let nonce = &sealed[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + NONCE_SIZE];
    let ciphertext = &sealed[PUBLIC_KEY_SIZE + NONCE_SIZE..];

    let secret = StaticSecret::from(private);
    let recipient_pub = PublicKey::from(&secret).to_bytes();
    let shared = secret.diffie_hellman(&PublicKey::from(ephemeral_pub));
    let key = Zeroizing::new(derive_key(shared.as_bytes(), &ephemeral_pub, &recipient_pub));

    let cipher = XChaCha20Poly1305::new((&*key).into());
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_unseal_roundtrip() {
        let (public, private) = generate_keys();
        let sealed = seal(&public, b"notification key").unwrap();
        let plain = unseal(private.as_bytes(), &sealed).unwrap();
        assert_eq!(plain, b"notification key");
    }

    #[test]
    fn test_unseal_rejects_wrong_key() {
        let (public, _) = generate_keys();
        let (_, other_private) = generate_keys();
        let sealed = seal(&public, b"notification key").unwrap();
        let result = unseal(other_private.as_bytes(), &sealed);
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_unseal_rejects_tampered_box() {
        let (public, private) = generate_keys();
        let mut sealed = seal(&public, b"notification key").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(unseal(private.as_bytes(), &sealed).is_err());
    }

    #[test]
    fn test_unseal_rejects_truncated_box() {
        let (_, private) = generate_keys();
        let result = unseal(private.as_bytes(), &[0u8; 10]);
        assert!(matches!(result, Err(CryptoError::InvalidSealedBox(_))));
    }

    #[test]
    fn test_seal_is_randomized() {
        let (public, _) = generate_keys();
        let a = seal(&public, b"same").unwrap();
        let b = seal(&public, b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_seal_rejects_short_public_key() {
        let result = seal(&[0u8; 16], b"data");
        assert!(matches!(result, Err(CryptoError::InvalidKeyLength { .. })));
    }

    #[test]
    fn test_sealed_overhead() {
        let (public, _) = generate_keys();
        let sealed = seal(&public, b"12345").unwrap();
        assert_eq!(sealed.len(), 5 + SEALED_OVERHEAD);
    }
}
