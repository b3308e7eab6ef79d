//! Curve resolution and ECDH key agreement
//!
//! A [`PublicKey`] is resolved once into an [`AgreementCurve`], which then
//! drives ephemeral key generation and the Diffie-Hellman computation. NIST
//! curves go through the RustCrypto `p256`/`p384`/`p521` crates, X25519 goes
//! through `x25519-dalek`.

use crate::error::{Error, Result};
use crate::key::{Curve, KeyType, PublicKey};
use rand::rngs::OsRng;
use std::fmt;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// NIST prime curves supported for ECDH
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NistCurve {
    /// P-256
    P256,
    /// P-384
    P384,
    /// P-521
    P521,
}

/// Curve family of an agreement key, resolved from its type and curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgreementCurve {
    /// `EC` key on a NIST prime curve
    Nist(NistCurve),
    /// `OKP` key on X25519
    X25519,
}

impl AgreementCurve {
    /// The JWK curve of this agreement curve
    pub fn curve(&self) -> Curve {
        match self {
            AgreementCurve::Nist(NistCurve::P256) => Curve::P256,
            AgreementCurve::Nist(NistCurve::P384) => Curve::P384,
            AgreementCurve::Nist(NistCurve::P521) => Curve::P521,
            AgreementCurve::X25519 => Curve::X25519,
        }
    }

    /// The JWK key type of this agreement curve
    pub fn key_type(&self) -> KeyType {
        match self {
            AgreementCurve::Nist(_) => KeyType::Ec,
            AgreementCurve::X25519 => KeyType::Okp,
        }
    }

    /// Generate an ephemeral key on this curve and agree with `recipient`.
    ///
    /// Returns the shared secret and the ephemeral public key. The ephemeral
    /// private key is dropped before this function returns.
    pub fn ephemeral_agreement(
        &self,
        recipient: &PublicKey,
    ) -> Result<(Zeroizing<Vec<u8>>, PublicKey)> {
        match self {
            AgreementCurve::Nist(NistCurve::P256) => nist_p256::ephemeral_agreement(recipient),
            AgreementCurve::Nist(NistCurve::P384) => nist_p384::ephemeral_agreement(recipient),
            AgreementCurve::Nist(NistCurve::P521) => nist_p521::ephemeral_agreement(recipient),
            AgreementCurve::X25519 => {
                let public = x25519_public(recipient)?;
                let ephemeral = x25519_dalek::EphemeralSecret::random_from_rng(OsRng);
                let epk = PublicKey::x25519(X25519PublicKey::from(&ephemeral).as_bytes().to_vec());
                let shared = ephemeral.diffie_hellman(&public);
                if !shared.was_contributory() {
                    return Err(Error::InvalidKey(
                        "X25519 agreement produced a non-contributory secret".to_string(),
                    ));
                }
                Ok((Zeroizing::new(shared.as_bytes().to_vec()), epk))
            }
        }
    }
}

/// Resolve the agreement curve of a public key.
///
/// `EC` keys must be on P-256, P-384 or P-521 with both coordinates of the
/// curve's field size. `OKP` keys must be X25519 with a single 32-byte value.
pub fn resolve(key: &PublicKey) -> Result<AgreementCurve> {
    let resolved = match (key.key_type, key.curve) {
        (KeyType::Ec, Curve::P256) => AgreementCurve::Nist(NistCurve::P256),
        (KeyType::Ec, Curve::P384) => AgreementCurve::Nist(NistCurve::P384),
        (KeyType::Ec, Curve::P521) => AgreementCurve::Nist(NistCurve::P521),
        (KeyType::Okp, Curve::X25519) => {
            if key.x.len() != Curve::X25519.coordinate_size() || !key.y.is_empty() {
                return Err(Error::UnsupportedKeyType(format!(
                    "OKP X25519 key must be a single {}-byte value",
                    Curve::X25519.coordinate_size()
                )));
            }
            return Ok(AgreementCurve::X25519);
        }
        (kty, crv) => {
            return Err(Error::UnsupportedKeyType(format!(
                "kty={}, crv={}",
                kty.as_str(),
                crv.as_str()
            )))
        }
    };

    let size = key.curve.coordinate_size();
    if key.x.len() != size || key.y.len() != size {
        return Err(Error::InvalidKey(format!(
            "{} coordinates must be {} bytes each",
            key.curve.as_str(),
            size
        )));
    }
    Ok(resolved)
}

/// Private key usable for static ECDH
#[derive(Clone)]
pub enum EcdhPrivateKey {
    /// P-256 scalar
    P256(p256::SecretKey),
    /// P-384 scalar
    P384(p384::SecretKey),
    /// P-521 scalar
    P521(p521::SecretKey),
    /// X25519 static secret
    X25519(StaticSecret),
}

impl fmt::Debug for EcdhPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdhPrivateKey")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

impl EcdhPrivateKey {
    /// Generate a random private key on `curve`
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::P256 => EcdhPrivateKey::P256(p256::SecretKey::random(&mut OsRng)),
            Curve::P384 => EcdhPrivateKey::P384(p384::SecretKey::random(&mut OsRng)),
            Curve::P521 => EcdhPrivateKey::P521(p521::SecretKey::random(&mut OsRng)),
            Curve::X25519 => EcdhPrivateKey::X25519(StaticSecret::random_from_rng(OsRng)),
        }
    }

    /// Import a private key from its raw scalar bytes
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> Result<Self> {
        let invalid = |_| Error::InvalidKey(format!("invalid {} private key", curve.as_str()));
        match curve {
            Curve::P256 => p256::SecretKey::from_slice(bytes)
                .map(EcdhPrivateKey::P256)
                .map_err(invalid),
            Curve::P384 => p384::SecretKey::from_slice(bytes)
                .map(EcdhPrivateKey::P384)
                .map_err(invalid),
            Curve::P521 => p521::SecretKey::from_slice(bytes)
                .map(EcdhPrivateKey::P521)
                .map_err(invalid),
            Curve::X25519 => {
                let raw: [u8; 32] = bytes.try_into().map_err(|_| {
                    Error::InvalidKey("X25519 private key must be 32 bytes".to_string())
                })?;
                Ok(EcdhPrivateKey::X25519(StaticSecret::from(raw)))
            }
        }
    }

    /// Curve of this key
    pub fn curve(&self) -> Curve {
        match self {
            EcdhPrivateKey::P256(_) => Curve::P256,
            EcdhPrivateKey::P384(_) => Curve::P384,
            EcdhPrivateKey::P521(_) => Curve::P521,
            EcdhPrivateKey::X25519(_) => Curve::X25519,
        }
    }

    /// Key type of this key
    pub fn key_type(&self) -> KeyType {
        match self {
            EcdhPrivateKey::X25519(_) => KeyType::Okp,
            _ => KeyType::Ec,
        }
    }

    /// Public half of this key
    pub fn public_key(&self) -> Result<PublicKey> {
        match self {
            EcdhPrivateKey::P256(secret) => nist_p256::encode_public(&secret.public_key()),
            EcdhPrivateKey::P384(secret) => nist_p384::encode_public(&secret.public_key()),
            EcdhPrivateKey::P521(secret) => nist_p521::encode_public(&secret.public_key()),
            EcdhPrivateKey::X25519(secret) => Ok(PublicKey::x25519(
                X25519PublicKey::from(secret).as_bytes().to_vec(),
            )),
        }
    }

    /// Static-static Diffie-Hellman with `peer`.
    ///
    /// Fails with [`Error::KeyMismatch`] if `peer` is not on this key's curve.
    pub fn diffie_hellman(&self, peer: &PublicKey) -> Result<Zeroizing<Vec<u8>>> {
        let peer_curve = resolve(peer)?;
        if peer_curve.curve() != self.curve() || peer_curve.key_type() != self.key_type() {
            return Err(Error::KeyMismatch(format!(
                "peer key {}/{} does not match private key {}/{}",
                peer.key_type.as_str(),
                peer.curve.as_str(),
                self.key_type().as_str(),
                self.curve().as_str()
            )));
        }

        match self {
            EcdhPrivateKey::P256(secret) => nist_p256::static_agreement(secret, peer),
            EcdhPrivateKey::P384(secret) => nist_p384::static_agreement(secret, peer),
            EcdhPrivateKey::P521(secret) => nist_p521::static_agreement(secret, peer),
            EcdhPrivateKey::X25519(secret) => {
                let shared = secret.diffie_hellman(&x25519_public(peer)?);
                if !shared.was_contributory() {
                    return Err(Error::InvalidKey(
                        "X25519 agreement produced a non-contributory secret".to_string(),
                    ));
                }
                Ok(Zeroizing::new(shared.as_bytes().to_vec()))
            }
        }
    }
}

fn x25519_public(key: &PublicKey) -> Result<X25519PublicKey> {
    let raw: [u8; 32] = key
        .x
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidKey("X25519 public key must be 32 bytes".to_string()))?;
    Ok(X25519PublicKey::from(raw))
}

macro_rules! nist_ecdh {
    ($module:ident, $krate:ident, $curve:expr) => {
        mod $module {
            use super::*;
            use $krate::elliptic_curve::sec1::ToEncodedPoint;

            pub(super) fn parse_public(key: &PublicKey) -> Result<$krate::PublicKey> {
                // SEC1 uncompressed form: 0x04 || x || y
                let mut sec1 = Vec::with_capacity(1 + key.x.len() + key.y.len());
                sec1.push(0x04);
                sec1.extend_from_slice(&key.x);
                sec1.extend_from_slice(&key.y);
                $krate::PublicKey::from_sec1_bytes(&sec1).map_err(|_| {
                    Error::InvalidKey(format!("{} point is not on the curve", $curve.as_str()))
                })
            }

            pub(super) fn encode_public(key: &$krate::PublicKey) -> Result<PublicKey> {
                let point = key.to_encoded_point(false);
                match (point.x(), point.y()) {
                    (Some(x), Some(y)) => Ok(PublicKey::ec($curve, x.to_vec(), y.to_vec())),
                    _ => Err(Error::InvalidKey(format!(
                        "{} public key is the identity point",
                        $curve.as_str()
                    ))),
                }
            }

            pub(super) fn static_agreement(
                secret: &$krate::SecretKey,
                peer: &PublicKey,
            ) -> Result<Zeroizing<Vec<u8>>> {
                let public = parse_public(peer)?;
                let shared =
                    $krate::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }

            pub(super) fn ephemeral_agreement(
                recipient: &PublicKey,
            ) -> Result<(Zeroizing<Vec<u8>>, PublicKey)> {
                let public = parse_public(recipient)?;
                let ephemeral = $krate::ecdh::EphemeralSecret::random(&mut OsRng);
                let epk = encode_public(&ephemeral.public_key())?;
                let shared = ephemeral.diffie_hellman(&public);
                Ok((Zeroizing::new(shared.raw_secret_bytes().to_vec()), epk))
            }
        }
    };
}

nist_ecdh!(nist_p256, p256, Curve::P256);
nist_ecdh!(nist_p384, p384, Curve::P384);
nist_ecdh!(nist_p521, p521, Curve::P521);
