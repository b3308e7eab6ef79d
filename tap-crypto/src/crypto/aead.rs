//! AEAD ciphers with embedded nonce framing
//!
//! Both ciphers emit `nonce || ciphertext || tag`. The nonce is freshly drawn
//! from the OS RNG for every call.

use crate::error::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::{rngs::OsRng, RngCore};

/// Key size shared by both AEAD ciphers
pub const AEAD_KEY_SIZE: usize = 32;

/// AES-GCM nonce (IV) size
pub const AES_GCM_NONCE_SIZE: usize = 12;

/// XChaCha20-Poly1305 extended nonce size
pub const XCHACHA20_POLY1305_NONCE_SIZE: usize = 24;

/// Authentication tag size shared by both AEAD ciphers
pub const AEAD_TAG_SIZE: usize = 16;

/// AEAD cipher algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    /// AES-GCM with a 256-bit key
    Aes256Gcm,
    /// XChaCha20-Poly1305
    XChaCha20Poly1305,
}

impl AeadAlgorithm {
    /// Returns the algorithm identifier as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AeadAlgorithm::Aes256Gcm => "A256GCM",
            AeadAlgorithm::XChaCha20Poly1305 => "XC20P",
        }
    }

    /// Nonce size embedded in this cipher's output
    pub fn nonce_size(&self) -> usize {
        match self {
            AeadAlgorithm::Aes256Gcm => AES_GCM_NONCE_SIZE,
            AeadAlgorithm::XChaCha20Poly1305 => XCHACHA20_POLY1305_NONCE_SIZE,
        }
    }

    /// Encrypt `plaintext`, returning `nonce || ciphertext || tag`
    pub fn seal(&self, key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = vec![0u8; self.nonce_size()];
        OsRng.fill_bytes(&mut nonce);
        let payload = Payload {
            msg: plaintext,
            aad,
        };

        let sealed = match self {
            AeadAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|e| {
                    Error::EncryptionFailed(format!("Failed to create AES-GCM cipher: {}", e))
                })?
                .encrypt(Nonce::from_slice(&nonce), payload),
            AeadAlgorithm::XChaCha20Poly1305 => XChaCha20Poly1305::new_from_slice(key)
                .map_err(|e| {
                    Error::EncryptionFailed(format!(
                        "Failed to create XChaCha20-Poly1305 cipher: {}",
                        e
                    ))
                })?
                .encrypt(XNonce::from_slice(&nonce), payload),
        }
        .map_err(|e| {
            Error::EncryptionFailed(format!("{} encryption failed: {}", self.as_str(), e))
        })?;

        let mut out = Vec::with_capacity(nonce.len() + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Decrypt `nonce || ciphertext || tag`.
    ///
    /// All failures, including a wrong key length, are reported as the same
    /// [`Error::DecryptionFailed`].
    pub fn open(&self, key: &[u8], sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let nonce_size = self.nonce_size();
        if sealed.len() < nonce_size + AEAD_TAG_SIZE {
            return Err(Error::DecryptionFailed("aead_open"));
        }
        let (nonce, ciphertext) = sealed.split_at(nonce_size);
        let payload = Payload {
            msg: ciphertext,
            aad,
        };

        match self {
            AeadAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| Error::DecryptionFailed("aead_open"))?
                .decrypt(Nonce::from_slice(nonce), payload),
            AeadAlgorithm::XChaCha20Poly1305 => XChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| Error::DecryptionFailed("aead_open"))?
                .decrypt(XNonce::from_slice(nonce), payload),
        }
        .map_err(|_| Error::DecryptionFailed("aead_open"))
    }
}
