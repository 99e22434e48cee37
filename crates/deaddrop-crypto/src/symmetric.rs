//! One-shot XChaCha20-Poly1305 symmetric encryption.
//!
//! Every payload blob and every notification is encrypted under a fresh
//! random key and nonce. The key travels only inside the (separately
//! protected) payload reference or sealed notification key; the nonce
//! travels in the clear next to the ciphertext.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::secret::SecretBytes;
use crate::{CryptoError, Result};

/// Size of a symmetric key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of a nonce in bytes (192 bits for XChaCha20).
pub const NONCE_SIZE: usize = 24;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// The result of a one-shot symmetric encryption.
///
/// Key, IV and ciphertext are kept separate because the channel routes
/// them differently: the ciphertext is published, the IV rides next to
/// it on the wire, and the key is only ever carried inside an encrypted
/// envelope. The key is zeroized on drop.
#[derive(Clone, Debug)]
pub struct SymmetricEncryption {
    /// Fresh random key, never reused.
    pub key: SecretBytes,
    /// Fresh random nonce.
    pub iv: Vec<u8>,
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under a freshly generated key and nonce.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the AEAD fails.
pub fn encrypt(plaintext: &[u8]) -> Result<SymmetricEncryption> {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new((&key).into());
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Encryption("XChaCha20-Poly1305 encryption failed".into()))?;

    Ok(SymmetricEncryption {
        key: SecretBytes::new(key.to_vec()),
        iv: nonce.to_vec(),
        ciphertext,
    })
}

/// Decrypt a ciphertext produced by [`encrypt`].
///
/// # Errors
///
/// Returns a length error for malformed key or nonce, and
/// `CryptoError::Decryption` when authentication fails.
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let key: [u8; KEY_SIZE] = key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_SIZE,
        actual: key.len(),
    })?;
    if iv.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidNonceLength {
            expected: NONCE_SIZE,
            actual: iv.len(),
        });
    }

    let cipher = XChaCha20Poly1305::new((&key).into());
    cipher
        .decrypt(XNonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let sealed = encrypt(b"payload record bytes").unwrap();
        let plain = decrypt(sealed.key.as_bytes(), &sealed.iv, &sealed.ciphertext).unwrap();
        assert_eq!(plain, b"payload record bytes");
    }

    #[test]
    fn test_fresh_key_per_call() {
        let a = encrypt(b"same plaintext").unwrap();
        let b = encrypt(b"same plaintext").unwrap();
        assert_ne!(a.key.as_bytes(), b.key.as_bytes());
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_decrypt_rejects_tampered_ciphertext() {
        let mut sealed = encrypt(b"secret").unwrap();
        sealed.ciphertext[0] ^= 0xFF;
        let result = decrypt(sealed.key.as_bytes(), &sealed.iv, &sealed.ciphertext);
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_decrypt_rejects_wrong_key() {
        let sealed = encrypt(b"secret").unwrap();
        let other = encrypt(b"other").unwrap();
        let result = decrypt(other.key.as_bytes(), &sealed.iv, &sealed.ciphertext);
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_decrypt_rejects_short_key() {
        let sealed = encrypt(b"secret").unwrap();
        let result = decrypt(&[0u8; 8], &sealed.iv, &sealed.ciphertext);
        assert!(matches!(result, Err(CryptoError::InvalidKeyLength { .. })));
    }

    #[test]
    fn test_decrypt_rejects_short_iv() {
        let sealed = encrypt(b"secret").unwrap();
        let result = decrypt(sealed.key.as_bytes(), &[0u8; 12], &sealed.ciphertext);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidNonceLength { .. })
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let sealed = encrypt(b"").unwrap();
        let plain = decrypt(sealed.key.as_bytes(), &sealed.iv, &sealed.ciphertext).unwrap();
        assert!(plain.is_empty());
    }

    #[test]
    fn test_ciphertext_length() {
        let sealed = encrypt(b"hello").unwrap();
        assert_eq!(sealed.ciphertext.len(), 5 + TAG_SIZE);
        assert_eq!(sealed.iv.len(), NONCE_SIZE);
        assert_eq!(sealed.key.len(), KEY_SIZE);
    }
}
