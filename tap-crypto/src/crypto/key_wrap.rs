//! ECDH-ES / ECDH-1PU key wrapping
//!
//! Wraps a content encryption key (CEK) for one recipient:
//!
//! 1. An ephemeral key pair is generated on the recipient's curve and agreed
//!    with the recipient's public key (`Ze`).
//! 2. For ECDH-1PU the sender's static key is also agreed with the recipient
//!    (`Zs`) and `Z = Ze || Zs`, otherwise `Z = Ze`.
//! 3. A 256-bit KEK is derived from `Z` with Concat KDF, using the algorithm
//!    literal, `apu` and `apv` as context.
//! 4. The CEK is sealed with the KEK using AES-256-GCM or XChaCha20-Poly1305.
//!
//! `Z` and the KEK are zeroized before the call returns.

use crate::config::WrapKeyOptions;
use crate::crypto::aead::AeadAlgorithm;
use crate::crypto::curve::{self, EcdhPrivateKey};
use crate::crypto::kdf::concat_kdf;
use crate::error::{Error, Result};
use crate::key::{AgreementMode, KeyWrapAlgorithm, PublicKey, RecipientWrappedKey, WrapCipher};
use crate::keyset::KeyHandle;
use tracing::debug;
use zeroize::Zeroizing;

/// KEK length in bits for every supported wrapping cipher
const KEK_LEN_BITS: usize = 256;

/// Wrap `cek` for `recipient`.
///
/// # Arguments
/// * `cek` - Content encryption key to protect, must not be empty
/// * `apu` - Agreement PartyUInfo, bound into the KDF
/// * `apv` - Agreement PartyVInfo, bound into the KDF
/// * `recipient` - Recipient's public agreement key
/// * `opts` - Sender key (ECDH-1PU) and wrapping cipher selection
///
/// # Returns
/// The wrapped key, carrying the ephemeral public key and algorithm literal
/// the recipient needs to unwrap it
pub fn wrap_key(
    cek: &[u8],
    apu: &[u8],
    apv: &[u8],
    recipient: Option<&PublicKey>,
    opts: WrapKeyOptions<'_>,
) -> Result<RecipientWrappedKey> {
    let recipient = recipient.ok_or(Error::MissingRecipientKey("wrap_key"))?;
    if cek.is_empty() {
        return Err(Error::InvalidLength(
            "wrap_key: CEK must not be empty".to_string(),
        ));
    }

    let mode = match opts.sender() {
        Some(_) => AgreementMode::OnePu,
        None => AgreementMode::Es,
    };
    let alg = KeyWrapAlgorithm::new(mode, wrap_cipher(&opts));
    let agreement = curve::resolve(recipient)?;
    debug!(
        "wrap_key: {} for {} recipient {}",
        alg,
        agreement.curve().as_str(),
        recipient.kid.as_deref().unwrap_or("<no kid>")
    );

    let (ze, epk) = agreement.ephemeral_agreement(recipient)?;
    let z = match opts.sender() {
        Some(sender) => {
            let sender_key = sender_private_key(sender)?;
            let zs = sender_key.diffie_hellman(recipient)?;
            concat_secrets(&ze, &zs)
        }
        None => ze,
    };

    let kek = concat_kdf(&z, alg.as_str().as_bytes(), apu, apv, KEK_LEN_BITS)?;
    let encrypted_cek = aead_for(alg)
        .seal(&kek, cek, &[])
        .map_err(|e| Error::EncryptionFailed(format!("wrap_key: {}", e)))?;

    Ok(RecipientWrappedKey {
        kid: recipient.kid.clone().unwrap_or_default(),
        alg: alg.as_str().to_string(),
        encrypted_cek,
        apu: apu.to_vec(),
        apv: apv.to_vec(),
        epk,
    })
}

/// Recover the CEK from `wrapped` with the recipient's private key.
///
/// # Arguments
/// * `wrapped` - Wrapped key produced by [`wrap_key`]
/// * `recipient` - Key handle whose primary entry is the recipient's ECDH
///   private key
/// * `opts` - Sender key handle, required for ECDH-1PU and rejected for
///   ECDH-ES. Its public key is enough.
///
/// # Returns
/// The unwrapped CEK. Any authentication failure is reported as
/// [`Error::UnwrapFailed`] without further detail.
pub fn unwrap_key(
    wrapped: &RecipientWrappedKey,
    recipient: &KeyHandle,
    opts: WrapKeyOptions<'_>,
) -> Result<Vec<u8>> {
    let alg: KeyWrapAlgorithm = wrapped.alg.parse()?;
    let recipient_key = recipient.primary_ecdh_private_key("unwrap_key")?;

    let epk_curve = curve::resolve(&wrapped.epk)?;
    if epk_curve.curve() != recipient_key.curve()
        || epk_curve.key_type() != recipient_key.key_type()
    {
        return Err(Error::KeyMismatch(format!(
            "unwrap_key: ephemeral key {}/{} does not match recipient key {}/{}",
            wrapped.epk.key_type.as_str(),
            wrapped.epk.curve.as_str(),
            recipient_key.key_type().as_str(),
            recipient_key.curve().as_str()
        )));
    }
    debug!(
        "unwrap_key: {} on {} for kid {}",
        alg,
        epk_curve.curve().as_str(),
        wrapped.kid
    );

    let ze = recipient_key.diffie_hellman(&wrapped.epk)?;
    let z = match (alg.mode(), opts.sender()) {
        (AgreementMode::Es, None) => ze,
        (AgreementMode::Es, Some(_)) => {
            return Err(Error::KeyMismatch(format!(
                "unwrap_key: sender key supplied for {}",
                alg
            )))
        }
        (AgreementMode::OnePu, None) => return Err(Error::MissingSender("unwrap_key")),
        (AgreementMode::OnePu, Some(sender)) => {
            let sender_public = sender.primary_public_key()?;
            let zs = recipient_key.diffie_hellman(&sender_public)?;
            concat_secrets(&ze, &zs)
        }
    };

    let kek = concat_kdf(
        &z,
        alg.as_str().as_bytes(),
        &wrapped.apu,
        &wrapped.apv,
        KEK_LEN_BITS,
    )?;
    aead_for(alg)
        .open(&kek, &wrapped.encrypted_cek, &[])
        .map_err(|_| Error::UnwrapFailed("unwrap_key"))
}

fn wrap_cipher(opts: &WrapKeyOptions<'_>) -> WrapCipher {
    if opts.use_xc20p_kw() {
        WrapCipher::XChaCha20Poly1305
    } else {
        WrapCipher::Aes256Gcm
    }
}

fn aead_for(alg: KeyWrapAlgorithm) -> AeadAlgorithm {
    match alg.cipher() {
        WrapCipher::Aes256Gcm => AeadAlgorithm::Aes256Gcm,
        WrapCipher::XChaCha20Poly1305 => AeadAlgorithm::XChaCha20Poly1305,
    }
}

fn sender_private_key(sender: &KeyHandle) -> Result<&EcdhPrivateKey> {
    sender.primary_ecdh_private_key("wrap_key")
}

/// `Ze || Zs` in a buffer sized up front, so no unzeroized copy is left behind
/// by reallocation
fn concat_secrets(ze: &[u8], zs: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut z = Zeroizing::new(Vec::with_capacity(ze.len() + zs.len()));
    z.extend_from_slice(ze);
    z.extend_from_slice(zs);
    z
}
