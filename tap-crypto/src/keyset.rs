//! Key handles
//!
//! A [`KeyHandle`] is a read-only view over an ordered set of key entries.
//! Exactly one entry is primary and is used for encryption, signing, MAC
//! computation and key agreement. Every entry, primary or not, may be used to
//! decrypt or verify unless it is disabled.

use crate::crypto::aead::{AeadAlgorithm, AEAD_KEY_SIZE};
use crate::crypto::curve::EcdhPrivateKey;
use crate::error::{Error, Result};
use crate::key::{Curve, PublicKey};
use rand::{rngs::OsRng, RngCore};
use std::collections::HashSet;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// First byte of a `Tink` output prefix
pub const TINK_START_BYTE: u8 = 0x01;

/// Size of a non-raw output prefix: start byte + big-endian key id
pub const NON_RAW_PREFIX_SIZE: usize = 5;

/// Symmetric key bytes, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    /// Wrap existing key bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Generate `len` random bytes
    pub fn random(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({} bytes)", self.0.len())
    }
}

/// AEAD key with its algorithm
#[derive(Debug, Clone)]
pub struct AeadKey {
    algorithm: AeadAlgorithm,
    key: SymmetricKey,
}

impl AeadKey {
    /// Create an AEAD key
    pub fn new(algorithm: AeadAlgorithm, key: SymmetricKey) -> Self {
        Self { algorithm, key }
    }

    /// AEAD algorithm of this key
    pub fn algorithm(&self) -> AeadAlgorithm {
        self.algorithm
    }

    pub(crate) fn key(&self) -> &SymmetricKey {
        &self.key
    }
}

/// Private signing key
#[derive(Clone)]
pub enum SigningKeyMaterial {
    /// Ed25519
    #[cfg(feature = "crypto-ed25519")]
    Ed25519(ed25519_dalek::SigningKey),
    /// ECDSA on P-256, DER-encoded signatures
    #[cfg(feature = "crypto-p256")]
    EcdsaP256(p256::ecdsa::SigningKey),
    /// ECDSA on secp256k1, DER-encoded signatures
    #[cfg(feature = "crypto-secp256k1")]
    EcdsaSecp256k1(k256::ecdsa::SigningKey),
}

impl fmt::Debug for SigningKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKeyMaterial")
            .field(&self.scheme())
            .finish()
    }
}

impl SigningKeyMaterial {
    /// Signature scheme name
    pub fn scheme(&self) -> &'static str {
        match self {
            #[cfg(feature = "crypto-ed25519")]
            SigningKeyMaterial::Ed25519(_) => "Ed25519",
            #[cfg(feature = "crypto-p256")]
            SigningKeyMaterial::EcdsaP256(_) => "ES256",
            #[cfg(feature = "crypto-secp256k1")]
            SigningKeyMaterial::EcdsaSecp256k1(_) => "ES256K",
        }
    }

    /// Sign `msg`
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        match self {
            #[cfg(feature = "crypto-ed25519")]
            SigningKeyMaterial::Ed25519(key) => {
                let signature: ed25519_dalek::Signature = ed25519_dalek::Signer::sign(key, msg);
                signature.to_bytes().to_vec()
            }
            #[cfg(feature = "crypto-p256")]
            SigningKeyMaterial::EcdsaP256(key) => {
                let signature: p256::ecdsa::Signature =
                    p256::ecdsa::signature::Signer::sign(key, msg);
                signature.to_der().as_bytes().to_vec()
            }
            #[cfg(feature = "crypto-secp256k1")]
            SigningKeyMaterial::EcdsaSecp256k1(key) => {
                let signature: k256::ecdsa::Signature =
                    k256::ecdsa::signature::Signer::sign(key, msg);
                signature.to_der().as_bytes().to_vec()
            }
        }
    }

    /// Public verification key
    pub fn verifying_key(&self) -> VerifyingKeyMaterial {
        match self {
            #[cfg(feature = "crypto-ed25519")]
            SigningKeyMaterial::Ed25519(key) => VerifyingKeyMaterial::Ed25519(key.verifying_key()),
            #[cfg(feature = "crypto-p256")]
            SigningKeyMaterial::EcdsaP256(key) => {
                VerifyingKeyMaterial::EcdsaP256(key.verifying_key().to_owned())
            }
            #[cfg(feature = "crypto-secp256k1")]
            SigningKeyMaterial::EcdsaSecp256k1(key) => {
                VerifyingKeyMaterial::EcdsaSecp256k1(key.verifying_key().to_owned())
            }
        }
    }
}

/// Public signature verification key
#[derive(Debug, Clone)]
pub enum VerifyingKeyMaterial {
    /// Ed25519
    #[cfg(feature = "crypto-ed25519")]
    Ed25519(ed25519_dalek::VerifyingKey),
    /// ECDSA on P-256
    #[cfg(feature = "crypto-p256")]
    EcdsaP256(p256::ecdsa::VerifyingKey),
    /// ECDSA on secp256k1
    #[cfg(feature = "crypto-secp256k1")]
    EcdsaSecp256k1(k256::ecdsa::VerifyingKey),
}

impl VerifyingKeyMaterial {
    /// Check `signature` over `msg`. Malformed signatures verify as false.
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> bool {
        match self {
            #[cfg(feature = "crypto-ed25519")]
            VerifyingKeyMaterial::Ed25519(key) => {
                match ed25519_dalek::Signature::from_slice(signature) {
                    Ok(signature) => ed25519_dalek::Verifier::verify(key, msg, &signature).is_ok(),
                    Err(_) => false,
                }
            }
            #[cfg(feature = "crypto-p256")]
            VerifyingKeyMaterial::EcdsaP256(key) => {
                match p256::ecdsa::Signature::from_der(signature) {
                    Ok(signature) => {
                        p256::ecdsa::signature::Verifier::verify(key, msg, &signature).is_ok()
                    }
                    Err(_) => false,
                }
            }
            #[cfg(feature = "crypto-secp256k1")]
            VerifyingKeyMaterial::EcdsaSecp256k1(key) => {
                match k256::ecdsa::Signature::from_der(signature) {
                    Ok(signature) => {
                        k256::ecdsa::signature::Verifier::verify(key, msg, &signature).is_ok()
                    }
                    Err(_) => false,
                }
            }
        }
    }
}

/// Key material held by one keyset entry
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    /// AEAD key
    Aead(AeadKey),
    /// HMAC-SHA256 key
    HmacSha256(SymmetricKey),
    /// Private signing key
    Signing(SigningKeyMaterial),
    /// Public signature verification key
    Verifying(VerifyingKeyMaterial),
    /// Private key agreement key
    EcdhPrivate(EcdhPrivateKey),
    /// Public key agreement key
    EcdhPublic(PublicKey),
}

impl KeyMaterial {
    /// Short description of the material kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            KeyMaterial::Aead(_) => "AEAD key",
            KeyMaterial::HmacSha256(_) => "HMAC key",
            KeyMaterial::Signing(_) => "signing key",
            KeyMaterial::Verifying(_) => "verifying key",
            KeyMaterial::EcdhPrivate(_) => "ECDH private key",
            KeyMaterial::EcdhPublic(_) => "ECDH public key",
        }
    }

    /// Public counterpart of this material
    pub fn public(&self) -> Result<KeyMaterial> {
        match self {
            KeyMaterial::Signing(key) => Ok(KeyMaterial::Verifying(key.verifying_key())),
            KeyMaterial::EcdhPrivate(key) => Ok(KeyMaterial::EcdhPublic(key.public_key()?)),
            KeyMaterial::Verifying(_) | KeyMaterial::EcdhPublic(_) => Ok(self.clone()),
            KeyMaterial::Aead(_) | KeyMaterial::HmacSha256(_) => Err(Error::InvalidKeyHandle(
                format!("public: {} has no public counterpart", self.kind()),
            )),
        }
    }

    /// Verification key, derived from signing material when needed
    pub fn verifying_key(&self) -> Option<VerifyingKeyMaterial> {
        match self {
            KeyMaterial::Signing(key) => Some(key.verifying_key()),
            KeyMaterial::Verifying(key) => Some(key.clone()),
            _ => None,
        }
    }
}

/// Status of a keyset entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Used for all operations
    Primary,
    /// Used only for decryption and verification
    Enabled,
    /// Never used
    Disabled,
}

/// How primitive output is prefixed with the key id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPrefixType {
    /// `0x01 || key_id` (big-endian)
    Tink,
    /// No prefix
    Raw,
}

impl OutputPrefixType {
    /// Prefix bytes for `key_id`
    pub fn prefix(&self, key_id: u32) -> Vec<u8> {
        match self {
            OutputPrefixType::Tink => {
                let mut prefix = Vec::with_capacity(NON_RAW_PREFIX_SIZE);
                prefix.push(TINK_START_BYTE);
                prefix.extend_from_slice(&key_id.to_be_bytes());
                prefix
            }
            OutputPrefixType::Raw => Vec::new(),
        }
    }
}

/// One key in a keyset
#[derive(Debug, Clone)]
pub struct KeyEntry {
    key_id: u32,
    material: KeyMaterial,
    output_prefix_type: OutputPrefixType,
    status: KeyStatus,
}

impl KeyEntry {
    /// Create a keyset entry
    pub fn new(
        key_id: u32,
        material: KeyMaterial,
        output_prefix_type: OutputPrefixType,
        status: KeyStatus,
    ) -> Self {
        Self {
            key_id,
            material,
            output_prefix_type,
            status,
        }
    }

    /// Key id
    pub fn key_id(&self) -> u32 {
        self.key_id
    }

    /// Key material
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Output prefix type
    pub fn output_prefix_type(&self) -> OutputPrefixType {
        self.output_prefix_type
    }

    /// Entry status
    pub fn status(&self) -> KeyStatus {
        self.status
    }

    /// Output prefix bytes of this entry
    pub fn output_prefix(&self) -> Vec<u8> {
        self.output_prefix_type.prefix(self.key_id)
    }

    fn is_raw(&self) -> bool {
        self.output_prefix_type == OutputPrefixType::Raw
    }
}

/// Template for generating a single-key handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTemplate {
    /// AES-256-GCM
    Aes256Gcm,
    /// XChaCha20-Poly1305
    XChaCha20Poly1305,
    /// HMAC-SHA256 with a 32-byte key
    HmacSha256,
    /// Ed25519 signing
    #[cfg(feature = "crypto-ed25519")]
    Ed25519,
    /// ECDSA P-256 signing
    #[cfg(feature = "crypto-p256")]
    EcdsaP256,
    /// ECDSA secp256k1 signing
    #[cfg(feature = "crypto-secp256k1")]
    EcdsaSecp256k1,
    /// ECDH key agreement on the given curve
    Ecdh(Curve),
}

impl KeyTemplate {
    /// Signature templates enabled in this build
    pub fn signature_templates() -> Vec<KeyTemplate> {
        let mut templates = Vec::new();
        #[cfg(feature = "crypto-ed25519")]
        templates.push(KeyTemplate::Ed25519);
        #[cfg(feature = "crypto-p256")]
        templates.push(KeyTemplate::EcdsaP256);
        #[cfg(feature = "crypto-secp256k1")]
        templates.push(KeyTemplate::EcdsaSecp256k1);
        templates
    }
}

/// Read-only handle over a keyset
#[derive(Debug, Clone)]
pub struct KeyHandle {
    entries: Vec<KeyEntry>,
    primary: usize,
}

impl KeyHandle {
    /// Build a handle from its entries.
    ///
    /// Exactly one entry must be [`KeyStatus::Primary`] and key ids must be
    /// unique.
    pub fn new(entries: Vec<KeyEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = entries.iter().find(|e| !seen.insert(e.key_id)) {
            return Err(Error::InvalidKeyHandle(format!(
                "duplicate key id {}",
                dup.key_id
            )));
        }

        let mut primaries = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == KeyStatus::Primary)
            .map(|(i, _)| i);
        let primary = match (primaries.next(), primaries.next()) {
            (Some(i), None) => i,
            (None, _) => {
                return Err(Error::InvalidKeyHandle(
                    "keyset has no primary key".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(Error::InvalidKeyHandle(
                    "keyset has more than one primary key".to_string(),
                ))
            }
        };

        Ok(Self { entries, primary })
    }

    /// Generate a single-key handle with a `Tink` output prefix
    pub fn generate(template: KeyTemplate) -> Self {
        Self::generate_with_prefix(template, OutputPrefixType::Tink)
    }

    /// Generate a single-key handle with the given output prefix type
    pub fn generate_with_prefix(
        template: KeyTemplate,
        output_prefix_type: OutputPrefixType,
    ) -> Self {
        let material = match template {
            KeyTemplate::Aes256Gcm => KeyMaterial::Aead(AeadKey::new(
                AeadAlgorithm::Aes256Gcm,
                SymmetricKey::random(AEAD_KEY_SIZE),
            )),
            KeyTemplate::XChaCha20Poly1305 => KeyMaterial::Aead(AeadKey::new(
                AeadAlgorithm::XChaCha20Poly1305,
                SymmetricKey::random(AEAD_KEY_SIZE),
            )),
            KeyTemplate::HmacSha256 => KeyMaterial::HmacSha256(SymmetricKey::random(32)),
            #[cfg(feature = "crypto-ed25519")]
            KeyTemplate::Ed25519 => KeyMaterial::Signing(SigningKeyMaterial::Ed25519(
                ed25519_dalek::SigningKey::generate(&mut OsRng),
            )),
            #[cfg(feature = "crypto-p256")]
            KeyTemplate::EcdsaP256 => KeyMaterial::Signing(SigningKeyMaterial::EcdsaP256(
                p256::ecdsa::SigningKey::random(&mut OsRng),
            )),
            #[cfg(feature = "crypto-secp256k1")]
            KeyTemplate::EcdsaSecp256k1 => KeyMaterial::Signing(
                SigningKeyMaterial::EcdsaSecp256k1(k256::ecdsa::SigningKey::random(&mut OsRng)),
            ),
            KeyTemplate::Ecdh(curve) => KeyMaterial::EcdhPrivate(EcdhPrivateKey::generate(curve)),
        };

        Self {
            entries: vec![KeyEntry::new(
                OsRng.next_u32(),
                material,
                output_prefix_type,
                KeyStatus::Primary,
            )],
            primary: 0,
        }
    }

    /// The primary entry
    pub fn primary(&self) -> &KeyEntry {
        &self.entries[self.primary]
    }

    /// All entries in keyset order
    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    /// Entries usable for decryption or verification
    pub(crate) fn active_entries(&self) -> impl Iterator<Item = &KeyEntry> {
        self.entries
            .iter()
            .filter(|e| e.status != KeyStatus::Disabled)
    }

    /// Active entries whose output prefix equals `prefix`
    pub(crate) fn entries_with_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = &'a KeyEntry> + 'a {
        let matches = move |e: &&KeyEntry| !e.is_raw() && e.output_prefix() == prefix;
        self.active_entries().filter(matches)
    }

    /// Active entries with no output prefix
    pub(crate) fn raw_entries(&self) -> impl Iterator<Item = &KeyEntry> {
        self.active_entries().filter(|e| e.is_raw())
    }

    /// Handle holding only the public counterparts of this handle's keys
    pub fn public(&self) -> Result<KeyHandle> {
        let entries = self
            .entries
            .iter()
            .map(|e| {
                Ok(KeyEntry {
                    material: e.material.public()?,
                    ..e.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(KeyHandle {
            entries,
            primary: self.primary,
        })
    }

    /// Public agreement key of the primary entry
    pub fn primary_public_key(&self) -> Result<PublicKey> {
        match &self.primary().material {
            KeyMaterial::EcdhPrivate(key) => key.public_key(),
            KeyMaterial::EcdhPublic(key) => Ok(key.clone()),
            other => Err(Error::InvalidKeyHandle(format!(
                "primary_public_key: primary key is a {}, expected an ECDH key",
                other.kind()
            ))),
        }
    }

    /// Private agreement key of the primary entry
    pub(crate) fn primary_ecdh_private_key(&self, op: &str) -> Result<&EcdhPrivateKey> {
        match &self.primary().material {
            KeyMaterial::EcdhPrivate(key) => Ok(key),
            other => Err(Error::InvalidKeyHandle(format!(
                "{}: primary key is a {}, expected an ECDH private key",
                op,
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn aead_entry(key_id: u32, status: KeyStatus) -> KeyEntry {
        KeyEntry::new(
            key_id,
            KeyMaterial::Aead(AeadKey::new(
                AeadAlgorithm::Aes256Gcm,
                SymmetricKey::random(AEAD_KEY_SIZE),
            )),
            OutputPrefixType::Tink,
            status,
        )
    }

    #[test]
    fn test_tink_prefix_layout() {
        assert_eq!(
            OutputPrefixType::Tink.prefix(0x0102_0304),
            vec![0x01, 0x01, 0x02, 0x03, 0x04]
        );
        assert!(OutputPrefixType::Raw.prefix(42).is_empty());
    }

    #[test]
    fn test_handle_requires_single_primary() {
        assert_matches!(
            KeyHandle::new(vec![aead_entry(1, KeyStatus::Enabled)]),
            Err(Error::InvalidKeyHandle(_))
        );
        assert_matches!(
            KeyHandle::new(vec![
                aead_entry(1, KeyStatus::Primary),
                aead_entry(2, KeyStatus::Primary)
            ]),
            Err(Error::InvalidKeyHandle(_))
        );

        let handle = KeyHandle::new(vec![
            aead_entry(1, KeyStatus::Enabled),
            aead_entry(2, KeyStatus::Primary),
        ])
        .unwrap();
        assert_eq!(handle.primary().key_id(), 2);
    }

    #[test]
    fn test_handle_rejects_duplicate_ids() {
        assert_matches!(
            KeyHandle::new(vec![
                aead_entry(7, KeyStatus::Primary),
                aead_entry(7, KeyStatus::Enabled)
            ]),
            Err(Error::InvalidKeyHandle(_))
        );
    }

    #[test]
    fn test_disabled_entries_are_inactive() {
        let handle = KeyHandle::new(vec![
            aead_entry(1, KeyStatus::Primary),
            aead_entry(2, KeyStatus::Disabled),
        ])
        .unwrap();
        let prefix = OutputPrefixType::Tink.prefix(2);
        assert_eq!(handle.entries_with_prefix(&prefix).count(), 0);
        assert_eq!(handle.active_entries().count(), 1);
    }

    #[test]
    fn test_public_handle() {
        let private = KeyHandle::generate(KeyTemplate::Ecdh(Curve::P384));
        let public = private.public().unwrap();
        assert_matches!(public.primary().material(), KeyMaterial::EcdhPublic(_));
        assert_eq!(
            public.primary_public_key().unwrap(),
            private.primary_public_key().unwrap()
        );
        assert_eq!(public.primary().key_id(), private.primary().key_id());

        for template in KeyTemplate::signature_templates() {
            let signer = KeyHandle::generate(template);
            assert_matches!(
                signer.public().unwrap().primary().material(),
                KeyMaterial::Verifying(_)
            );
        }

        let aead = KeyHandle::generate(KeyTemplate::Aes256Gcm);
        assert_matches!(aead.public(), Err(Error::InvalidKeyHandle(_)));
    }

    #[test]
    fn test_primary_public_key_requires_ecdh() {
        let mac = KeyHandle::generate(KeyTemplate::HmacSha256);
        assert_matches!(mac.primary_public_key(), Err(Error::InvalidKeyHandle(_)));
    }

    #[test]
    fn test_signature_templates_follow_features() {
        let mut schemes = Vec::new();
        for template in KeyTemplate::signature_templates() {
            let handle = KeyHandle::generate(template);
            if let KeyMaterial::Signing(key) = handle.primary().material() {
                schemes.push(key.scheme());
            }
        }

        let enabled = [
            cfg!(feature = "crypto-ed25519"),
            cfg!(feature = "crypto-p256"),
            cfg!(feature = "crypto-secp256k1"),
        ];
        let expected: Vec<_> = ["Ed25519", "ES256", "ES256K"]
            .into_iter()
            .zip(enabled)
            .filter_map(|(scheme, on)| on.then_some(scheme))
            .collect();
        assert_eq!(schemes, expected);
    }

    #[test]
    fn test_symmetric_key_debug_redacted() {
        let key = SymmetricKey::new(vec![0xAA; 32]);
        assert_eq!(format!("{:?}", key), "SymmetricKey(32 bytes)");
    }
}
