//! The symmetric authenticated-encryption black box
//!
//! A thin wrapper over ChaCha20-Poly1305: a [`Cipher`] is a key plus a
//! nonce, sealing a byte blob into `ciphertext || tag`. The protocol
//! uses it to deliver MAC tag shares that are opened only at
//! verification time, when the cipher itself is revealed.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::Rng;

use crate::error::CoreError;

/// Byte length of a serialized cipher (key plus nonce)
pub const CIPHER_BYTES: usize = 44;

/// A symmetric AEAD context: key and nonce
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cipher {
    /// The 256-bit key
    key: [u8; 32],
    /// The 96-bit nonce
    nonce: [u8; 12],
}

impl Cipher {
    /// A fresh random cipher
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut key = [0u8; 32];
        let mut nonce = [0u8; 12];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut nonce);
        Self { key, nonce }
    }

    /// Seal a byte blob into `ciphertext || tag`
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
        ChaCha20Poly1305::new(Key::from_slice(&self.key))
            .encrypt(Nonce::from_slice(&self.nonce), plaintext)
            .map_err(|_| CoreError::CipherFailed)
    }

    /// Open a sealed blob, verifying its tag
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CoreError> {
        ChaCha20Poly1305::new(Key::from_slice(&self.key))
            .decrypt(Nonce::from_slice(&self.nonce), sealed)
            .map_err(|_| CoreError::CipherFailed)
    }

    /// Serialize key and nonce for opening the cipher to a verifier
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CIPHER_BYTES);
        out.extend_from_slice(&self.key);
        out.extend_from_slice(&self.nonce);
        out
    }

    /// Rebuild a cipher from its serialized form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() != CIPHER_BYTES {
            return Err(CoreError::CipherFailed);
        }
        let mut key = [0u8; 32];
        let mut nonce = [0u8; 12];
        key.copy_from_slice(&bytes[..32]);
        nonce.copy_from_slice(&bytes[32..]);
        Ok(Self { key, nonce })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let cipher = Cipher::random(&mut rng);

        let message = b"tag share bytes".to_vec();
        let sealed = cipher.seal(&message).unwrap();
        assert_ne!(sealed, message);
        assert_eq!(cipher.open(&sealed).unwrap(), message);
    }

    #[test]
    fn test_tamper_detected() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let cipher = Cipher::random(&mut rng);

        let mut sealed = cipher.seal(b"payload").unwrap();
        sealed[0] ^= 1;
        assert_eq!(cipher.open(&sealed), Err(CoreError::CipherFailed));
    }

    #[test]
    fn test_serialized_cipher_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let cipher = Cipher::random(&mut rng);
        let restored = Cipher::from_bytes(&cipher.to_bytes()).unwrap();
        assert_eq!(restored, cipher);

        let sealed = cipher.seal(b"x").unwrap();
        assert_eq!(restored.open(&sealed).unwrap(), b"x".to_vec());
    }
}
