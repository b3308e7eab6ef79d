//! AEAD envelope adapter
//!
//! Keyset AEAD primitives emit `prefix || nonce || ciphertext || tag`. The
//! adapter splits that into a `(ciphertext, nonce)` pair that does not depend
//! on the key's output prefix, and puts it back together for decryption.

use crate::crypto::aead::AES_GCM_NONCE_SIZE;
use crate::error::{Error, Result};
use crate::keyset::KeyMaterial;
use tracing::warn;

/// Split framed AEAD output into `(ciphertext, nonce)`.
///
/// The nonce is `framed[prefix_len..prefix_len + nonce_size]`, the ciphertext
/// (tag included) is everything after it. Prefix bytes are discarded.
pub fn strip(framed: &[u8], prefix_len: usize, nonce_size: usize) -> Result<(Vec<u8>, Vec<u8>)> {
    let header_len = prefix_len + nonce_size;
    if framed.len() < header_len {
        return Err(Error::EncryptionFailed(format!(
            "strip: framed output of {} bytes is shorter than prefix and nonce ({} bytes)",
            framed.len(),
            header_len
        )));
    }

    let nonce = framed[prefix_len..header_len].to_vec();
    let ciphertext = framed[header_len..].to_vec();
    Ok((ciphertext, nonce))
}

/// Rebuild framed AEAD input as `prefix || nonce || ciphertext`
pub fn reassemble(prefix: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(prefix.len() + nonce.len() + ciphertext.len());
    framed.extend_from_slice(prefix);
    framed.extend_from_slice(nonce);
    framed.extend_from_slice(ciphertext);
    framed
}

/// Nonce size embedded by the primitive built from `material`.
///
/// Non-AEAD material falls back to the AES-GCM nonce size.
pub fn nonce_size(material: &KeyMaterial) -> usize {
    match material {
        KeyMaterial::Aead(key) => key.algorithm().nonce_size(),
        other => {
            warn!(
                "nonce_size: {} is not an AEAD key, using {}-byte nonce",
                other.kind(),
                AES_GCM_NONCE_SIZE
            );
            AES_GCM_NONCE_SIZE
        }
    }
}
