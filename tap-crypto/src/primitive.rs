//! Keyset primitives
//!
//! Each primitive is built from a [`KeyHandle`] and writes with the primary
//! entry, prefixing its output with that entry's output prefix. Reading goes
//! the other way: the first [`NON_RAW_PREFIX_SIZE`] bytes select candidate
//! entries, then entries with a `Raw` prefix are tried against the whole
//! input. Disabled entries are never used.

use crate::crypto::envelope;
use crate::error::{Error, Result};
use crate::keyset::{
    AeadKey, KeyEntry, KeyHandle, KeyMaterial, SigningKeyMaterial, SymmetricKey,
    NON_RAW_PREFIX_SIZE,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 tag size
pub const MAC_TAG_SIZE: usize = 32;

/// Candidate entries for `input`: prefix matches first (with the prefix
/// stripped), then raw entries over the whole input.
fn candidates<'a>(
    handle: &'a KeyHandle,
    input: &'a [u8],
) -> impl Iterator<Item = (&'a KeyEntry, &'a [u8])> + 'a {
    let prefixed = (input.len() >= NON_RAW_PREFIX_SIZE)
        .then(move || {
            let (prefix, body) = input.split_at(NON_RAW_PREFIX_SIZE);
            handle.entries_with_prefix(prefix).map(move |e| (e, body))
        })
        .into_iter()
        .flatten();
    prefixed.chain(handle.raw_entries().map(move |e| (e, input)))
}

/// AEAD primitive over a keyset
#[derive(Debug)]
pub struct AeadPrimitive<'a> {
    handle: &'a KeyHandle,
    primary: &'a AeadKey,
}

impl<'a> AeadPrimitive<'a> {
    /// Build the primitive. The primary entry must be an AEAD key.
    pub fn new(handle: &'a KeyHandle) -> Result<Self> {
        match handle.primary().material() {
            KeyMaterial::Aead(primary) => Ok(Self { handle, primary }),
            other => Err(Error::InvalidKeyHandle(format!(
                "aead: primary key is a {}, expected an AEAD key",
                other.kind()
            ))),
        }
    }

    /// Output prefix of the primary entry
    pub fn primary_prefix(&self) -> Vec<u8> {
        self.handle.primary().output_prefix()
    }

    /// Nonce size embedded by the primary entry
    pub fn primary_nonce_size(&self) -> usize {
        envelope::nonce_size(self.handle.primary().material())
    }

    /// Encrypt with the primary key: `prefix || nonce || ciphertext || tag`
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let sealed = self
            .primary
            .algorithm()
            .seal(self.primary.key().as_bytes(), plaintext, aad)?;
        let mut out = self.primary_prefix();
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Decrypt with whichever active entry authenticates `framed`
    pub fn decrypt(&self, framed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        for (entry, body) in candidates(self.handle, framed) {
            if let KeyMaterial::Aead(key) = entry.material() {
                match key.algorithm().open(key.key().as_bytes(), body, aad) {
                    Ok(plaintext) => return Ok(plaintext),
                    Err(_) => debug!("decrypt: key {} did not authenticate", entry.key_id()),
                }
            }
        }
        Err(Error::DecryptionFailed("decrypt"))
    }
}

/// HMAC-SHA256 primitive over a keyset
#[derive(Debug)]
pub struct MacPrimitive<'a> {
    handle: &'a KeyHandle,
    primary: &'a SymmetricKey,
}

impl<'a> MacPrimitive<'a> {
    /// Build the primitive. The primary entry must be an HMAC key.
    pub fn new(handle: &'a KeyHandle) -> Result<Self> {
        match handle.primary().material() {
            KeyMaterial::HmacSha256(primary) => Ok(Self { handle, primary }),
            other => Err(Error::InvalidKeyHandle(format!(
                "mac: primary key is a {}, expected an HMAC key",
                other.kind()
            ))),
        }
    }

    /// Compute `prefix || HMAC-SHA256(key, data)` with the primary key
    pub fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(self.primary.as_bytes())
            .map_err(|e| Error::InvalidKey(format!("compute_mac: {}", e)))?;
        mac.update(data);

        let mut out = self.handle.primary().output_prefix();
        out.extend_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }

    /// Check `tag` over `data` against every active entry, in constant time
    /// per candidate
    pub fn verify_mac(&self, tag: &[u8], data: &[u8]) -> Result<()> {
        for (entry, body) in candidates(self.handle, tag) {
            if let KeyMaterial::HmacSha256(key) = entry.material() {
                let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
                    continue;
                };
                mac.update(data);
                if mac.verify_slice(body).is_ok() {
                    return Ok(());
                }
            }
        }
        Err(Error::VerificationFailed("verify_mac"))
    }
}

/// Signing primitive over a keyset
#[derive(Debug)]
pub struct SignerPrimitive<'a> {
    handle: &'a KeyHandle,
    primary: &'a SigningKeyMaterial,
}

impl<'a> SignerPrimitive<'a> {
    /// Build the primitive. The primary entry must be a private signing key.
    pub fn new(handle: &'a KeyHandle) -> Result<Self> {
        match handle.primary().material() {
            KeyMaterial::Signing(primary) => Ok(Self { handle, primary }),
            other => Err(Error::InvalidKeyHandle(format!(
                "sign: primary key is a {}, expected a signing key",
                other.kind()
            ))),
        }
    }

    /// Sign `msg` with the primary key: `prefix || signature`
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        let mut out = self.handle.primary().output_prefix();
        out.extend_from_slice(&self.primary.sign(msg));
        out
    }
}

/// Verification primitive over a keyset of signing or verifying keys
#[derive(Debug)]
pub struct VerifierPrimitive<'a> {
    handle: &'a KeyHandle,
}

impl<'a> VerifierPrimitive<'a> {
    /// Build the primitive. The primary entry must be a signing or
    /// verifying key.
    pub fn new(handle: &'a KeyHandle) -> Result<Self> {
        match handle.primary().material().verifying_key() {
            Some(_) => Ok(Self { handle }),
            None => Err(Error::InvalidKeyHandle(format!(
                "verify: primary key is a {}, expected a signature key",
                handle.primary().material().kind()
            ))),
        }
    }

    /// Check `signature` over `msg` against every active entry
    pub fn verify(&self, signature: &[u8], msg: &[u8]) -> Result<()> {
        let verified = candidates(self.handle, signature).any(|(entry, body)| {
            entry
                .material()
                .verifying_key()
                .is_some_and(|key| key.verify(msg, body))
        });
        if verified {
            Ok(())
        } else {
            Err(Error::VerificationFailed("verify"))
        }
    }
}
