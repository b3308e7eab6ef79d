//! Crypto service
//!
//! [`Crypto`] is the single entry point for callers: AEAD, signatures, MACs
//! and key wrapping, each parameterized by a [`KeyHandle`].

use crate::config::WrapKeyOptions;
use crate::crypto::{envelope, key_wrap};
use crate::error::Result;
use crate::key::{PublicKey, RecipientWrappedKey};
use crate::keyset::KeyHandle;
use crate::primitive::{AeadPrimitive, MacPrimitive, SignerPrimitive, VerifierPrimitive};
use std::fmt::Debug;
use tracing::debug;

/// Crypto operations over key handles
pub trait Crypto: Debug + Send + Sync {
    /// Encrypt `msg` with the handle's primary AEAD key.
    ///
    /// # Returns
    /// `(ciphertext, nonce)`, where the ciphertext includes the tag and
    /// neither carries the key's output prefix
    fn encrypt(&self, msg: &[u8], aad: &[u8], kh: &KeyHandle) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Decrypt a `(ciphertext, nonce)` pair produced by [`Crypto::encrypt`]
    fn decrypt(
        &self,
        ciphertext: &[u8],
        aad: &[u8],
        nonce: &[u8],
        kh: &KeyHandle,
    ) -> Result<Vec<u8>>;

    /// Sign `msg` with the handle's primary signing key
    fn sign(&self, msg: &[u8], kh: &KeyHandle) -> Result<Vec<u8>>;

    /// Verify `signature` over `msg`. `kh` may be private or public.
    fn verify(&self, signature: &[u8], msg: &[u8], kh: &KeyHandle) -> Result<()>;

    /// Compute a MAC over `data` with the handle's primary MAC key
    fn compute_mac(&self, data: &[u8], kh: &KeyHandle) -> Result<Vec<u8>>;

    /// Verify `mac` over `data`
    fn verify_mac(&self, mac: &[u8], data: &[u8], kh: &KeyHandle) -> Result<()>;

    /// Wrap `cek` for `recipient` with ECDH-ES, or ECDH-1PU when `opts`
    /// carries a sender
    fn wrap_key(
        &self,
        cek: &[u8],
        apu: &[u8],
        apv: &[u8],
        recipient: Option<&PublicKey>,
        opts: WrapKeyOptions<'_>,
    ) -> Result<RecipientWrappedKey>;

    /// Unwrap a CEK with the recipient's private key handle
    fn unwrap_key(
        &self,
        wrapped: &RecipientWrappedKey,
        recipient: &KeyHandle,
        opts: WrapKeyOptions<'_>,
    ) -> Result<Vec<u8>>;
}

/// Default [`Crypto`] implementation. Stateless and safe to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCrypto;

impl DefaultCrypto {
    /// Creates a new crypto service
    pub fn new() -> Self {
        Self
    }
}

impl Crypto for DefaultCrypto {
    fn encrypt(&self, msg: &[u8], aad: &[u8], kh: &KeyHandle) -> Result<(Vec<u8>, Vec<u8>)> {
        let aead = AeadPrimitive::new(kh)?;
        let framed = aead.encrypt(msg, aad)?;
        envelope::strip(
            &framed,
            aead.primary_prefix().len(),
            aead.primary_nonce_size(),
        )
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        aad: &[u8],
        nonce: &[u8],
        kh: &KeyHandle,
    ) -> Result<Vec<u8>> {
        let aead = AeadPrimitive::new(kh)?;
        let framed = envelope::reassemble(&aead.primary_prefix(), nonce, ciphertext);
        aead.decrypt(&framed, aad)
    }

    fn sign(&self, msg: &[u8], kh: &KeyHandle) -> Result<Vec<u8>> {
        Ok(SignerPrimitive::new(kh)?.sign(msg))
    }

    fn verify(&self, signature: &[u8], msg: &[u8], kh: &KeyHandle) -> Result<()> {
        VerifierPrimitive::new(kh)?.verify(signature, msg)
    }

    fn compute_mac(&self, data: &[u8], kh: &KeyHandle) -> Result<Vec<u8>> {
        MacPrimitive::new(kh)?.compute_mac(data)
    }

    fn verify_mac(&self, mac: &[u8], data: &[u8], kh: &KeyHandle) -> Result<()> {
        MacPrimitive::new(kh)?.verify_mac(mac, data)
    }

    fn wrap_key(
        &self,
        cek: &[u8],
        apu: &[u8],
        apv: &[u8],
        recipient: Option<&PublicKey>,
        opts: WrapKeyOptions<'_>,
    ) -> Result<RecipientWrappedKey> {
        key_wrap::wrap_key(cek, apu, apv, recipient, opts).map_err(|e| {
            debug!("wrap_key failed: {}", e);
            e
        })
    }

    fn unwrap_key(
        &self,
        wrapped: &RecipientWrappedKey,
        recipient: &KeyHandle,
        opts: WrapKeyOptions<'_>,
    ) -> Result<Vec<u8>> {
        key_wrap::unwrap_key(wrapped, recipient, opts).map_err(|e| {
            debug!("unwrap_key failed: {}", e);
            e
        })
    }
}

