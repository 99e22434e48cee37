//! Ed25519 signatures over notification plaintexts and address-book entries.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::secret::SecretBytes;
use crate::{CryptoError, Result};

/// Size of a signing public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of a signing private key in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Generate a fresh Ed25519 key pair.
///
/// Returns `(public, private)` as raw byte buffers; the private half is
/// wrapped in [`SecretBytes`] so it is zeroized on drop.
pub fn generate_keys() -> (Vec<u8>, SecretBytes) {
    let mut csprng = OsRng;
    let signing = SigningKey::generate(&mut csprng);
    (
        signing.verifying_key().to_bytes().to_vec(),
        SecretBytes::new(signing.to_bytes().to_vec()),
    )
}

/// Sign `data` with an Ed25519 private key.
///
/// # Errors
///
/// Returns an error if the private key is not exactly 32 bytes.
pub fn sign(private: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let key: [u8; PRIVATE_KEY_SIZE] =
        private
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: PRIVATE_KEY_SIZE,
                actual: private.len(),
            })?;
    let signing = SigningKey::from_bytes(&key);
    Ok(signing.sign(data).to_bytes().to_vec())
}

/// Verify an Ed25519 signature.
///
/// # Errors
///
/// Returns `CryptoError::SignatureVerification` when the signature does
/// not verify, and a length error when the key or signature bytes have
/// the wrong size.
pub fn verify(public: &[u8], data: &[u8], signature: &[u8]) -> Result<()> {
    let key: [u8; PUBLIC_KEY_SIZE] = public
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: PUBLIC_KEY_SIZE,
            actual: public.len(),
        })?;
    let verifying =
        VerifyingKey::from_bytes(&key).map_err(|_| CryptoError::SignatureVerification)?;
    let sig: [u8; SIGNATURE_SIZE] =
        signature
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength {
                expected: SIGNATURE_SIZE,
                actual: signature.len(),
            })?;
    verifying
        .verify(data, &Signature::from_bytes(&sig))
        .map_err(|_| CryptoError::SignatureVerification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let (public, private) = generate_keys();
        let sig = sign(private.as_bytes(), b"bound plaintext").unwrap();
        verify(&public, b"bound plaintext", &sig).unwrap();
    }

    #[test]
    fn test_verify_rejects_altered_data() {
        let (public, private) = generate_keys();
        let sig = sign(private.as_bytes(), b"bound plaintext").unwrap();
        let result = verify(&public, b"bound plaintexT", &sig);
        assert!(matches!(result, Err(CryptoError::SignatureVerification)));
    }

    #[test]
    fn test_verify_rejects_altered_signature() {
        let (public, private) = generate_keys();
        let mut sig = sign(private.as_bytes(), b"data").unwrap();
        sig[0] ^= 0x01;
        assert!(verify(&public, b"data", &sig).is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let (_, private) = generate_keys();
        let (other_public, _) = generate_keys();
        let sig = sign(private.as_bytes(), b"data").unwrap();
        assert!(verify(&other_public, b"data", &sig).is_err());
    }

    #[test]
    fn test_sign_rejects_short_key() {
        let result = sign(&[0u8; 16], b"data");
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeyLength {
                expected: PRIVATE_KEY_SIZE,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_verify_rejects_short_signature() {
        let (public, _) = generate_keys();
        let result = verify(&public, b"data", &[0u8; 10]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidSignatureLength { .. })
        ));
    }
}
