//! Public key and wrapped key data types
//!
//! These are the values exchanged with the message envelope layer: the
//! recipient's [`PublicKey`], the four key wrapping algorithm literals and the
//! [`RecipientWrappedKey`] produced by a wrap call.

use crate::crypto::curve;
use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// JWK key type of an agreement key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Elliptic curve key on a NIST prime curve
    #[serde(rename = "EC")]
    Ec,
    /// Octet key pair (X25519)
    #[serde(rename = "OKP")]
    Okp,
}

impl KeyType {
    /// Returns the JWK `kty` value
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Ec => "EC",
            KeyType::Okp => "OKP",
        }
    }
}

impl FromStr for KeyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EC" => Ok(KeyType::Ec),
            "OKP" => Ok(KeyType::Okp),
            other => Err(Error::UnsupportedKeyType(format!("kty={}", other))),
        }
    }
}

/// Curve of an agreement key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    /// NIST P-256
    #[serde(rename = "P-256")]
    P256,
    /// NIST P-384
    #[serde(rename = "P-384")]
    P384,
    /// NIST P-521
    #[serde(rename = "P-521")]
    P521,
    /// Curve25519 in Montgomery form
    #[serde(rename = "X25519")]
    X25519,
}

impl Curve {
    /// Returns the JWK `crv` value
    pub fn as_str(&self) -> &'static str {
        match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
            Curve::P521 => "P-521",
            Curve::X25519 => "X25519",
        }
    }

    /// Size in bytes of one coordinate (or of the raw key for X25519)
    pub fn coordinate_size(&self) -> usize {
        match self {
            Curve::P256 => 32,
            Curve::P384 => 48,
            Curve::P521 => 66,
            Curve::X25519 => 32,
        }
    }
}

impl FromStr for Curve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P-256" => Ok(Curve::P256),
            "P-384" => Ok(Curve::P384),
            "P-521" => Ok(Curve::P521),
            "X25519" => Ok(Curve::X25519),
            other => Err(Error::UnsupportedKeyType(format!("crv={}", other))),
        }
    }
}

/// Public key used for key agreement.
///
/// For `EC` keys `x` and `y` hold the big-endian affine coordinates. For
/// `OKP` keys `x` holds the raw 32-byte X25519 key and `y` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// Key type
    #[serde(rename = "type")]
    pub key_type: KeyType,
    /// Curve
    pub curve: Curve,
    /// X coordinate, or the raw key for OKP
    pub x: Vec<u8>,
    /// Y coordinate, empty for OKP
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub y: Vec<u8>,
    /// Optional key identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl PublicKey {
    /// Create an EC public key from its affine coordinates
    pub fn ec(curve: Curve, x: Vec<u8>, y: Vec<u8>) -> Self {
        Self {
            key_type: KeyType::Ec,
            curve,
            x,
            y,
            kid: None,
        }
    }

    /// Create an X25519 public key from its raw bytes
    pub fn x25519(raw: Vec<u8>) -> Self {
        Self {
            key_type: KeyType::Okp,
            curve: Curve::X25519,
            x: raw,
            y: Vec::new(),
            kid: None,
        }
    }

    /// Sets the key identifier
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Export as a public JWK
    pub fn to_jwk(&self) -> Value {
        let mut jwk = serde_json::Map::new();
        jwk.insert("kty".to_string(), Value::from(self.key_type.as_str()));
        jwk.insert("crv".to_string(), Value::from(self.curve.as_str()));
        let x = URL_SAFE_NO_PAD.encode(&self.x);
        jwk.insert("x".to_string(), Value::from(x));
        if self.key_type == KeyType::Ec {
            let y = URL_SAFE_NO_PAD.encode(&self.y);
            jwk.insert("y".to_string(), Value::from(y));
        }
        if let Some(kid) = &self.kid {
            jwk.insert("kid".to_string(), Value::from(kid.as_str()));
        }
        Value::Object(jwk)
    }

    /// Import a public JWK, validating the key type / curve pairing
    pub fn from_jwk(jwk: &Value) -> Result<Self> {
        let field = |name: &str| jwk_str_field(jwk, name);
        let decode = |name: &str, value: &str| -> Result<Vec<u8>> {
            URL_SAFE_NO_PAD.decode(value).map_err(|e| {
                Error::Serialization(format!("from_jwk: failed to decode `{}`: {}", name, e))
            })
        };

        let kty = field("kty")?
            .ok_or_else(|| Error::Serialization("from_jwk: missing `kty`".to_string()))?;
        let crv = field("crv")?
            .ok_or_else(|| Error::Serialization("from_jwk: missing `crv`".to_string()))?;
        let x = field("x")?
            .ok_or_else(|| Error::Serialization("from_jwk: missing `x`".to_string()))?;

        let key = PublicKey {
            key_type: kty.parse()?,
            curve: crv.parse()?,
            x: decode("x", x)?,
            y: match field("y")? {
                Some(y) => decode("y", y)?,
                None => Vec::new(),
            },
            kid: field("kid")?.map(str::to_string),
        };

        curve::resolve(&key)?;
        Ok(key)
    }

    /// Import a public JWK from its JSON text
    pub fn from_jwk_str(jwk: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(jwk)?;
        Self::from_jwk(&value)
    }
}

fn jwk_str_field<'a>(jwk: &'a Value, name: &str) -> Result<Option<&'a str>> {
    match jwk.get(name) {
        None => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| {
            Error::Serialization(format!("from_jwk: `{}` must be a string", name))
        }),
    }
}

/// Key agreement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgreementMode {
    /// Ephemeral-static (anonymous sender)
    Es,
    /// One-pass unified model (authenticated sender)
    OnePu,
}

/// AEAD cipher used to wrap the CEK under the derived KEK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapCipher {
    /// AES-256-GCM (`A256KW` family)
    Aes256Gcm,
    /// XChaCha20-Poly1305 (`XC20PKW` family)
    XChaCha20Poly1305,
}

/// Key wrapping algorithm identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyWrapAlgorithm {
    /// ECDH-ES with AES-256-GCM key wrapping
    EcdhEsA256kw,
    /// ECDH-1PU with AES-256-GCM key wrapping
    Ecdh1puA256kw,
    /// ECDH-ES with XChaCha20-Poly1305 key wrapping
    EcdhEsXc20pkw,
    /// ECDH-1PU with XChaCha20-Poly1305 key wrapping
    Ecdh1puXc20pkw,
}

impl KeyWrapAlgorithm {
    /// All supported algorithms
    pub const ALL: [KeyWrapAlgorithm; 4] = [
        KeyWrapAlgorithm::EcdhEsA256kw,
        KeyWrapAlgorithm::Ecdh1puA256kw,
        KeyWrapAlgorithm::EcdhEsXc20pkw,
        KeyWrapAlgorithm::Ecdh1puXc20pkw,
    ];

    /// Select the algorithm for an agreement mode and wrap cipher
    pub fn new(mode: AgreementMode, cipher: WrapCipher) -> Self {
        match (mode, cipher) {
            (AgreementMode::Es, WrapCipher::Aes256Gcm) => KeyWrapAlgorithm::EcdhEsA256kw,
            (AgreementMode::OnePu, WrapCipher::Aes256Gcm) => KeyWrapAlgorithm::Ecdh1puA256kw,
            (AgreementMode::Es, WrapCipher::XChaCha20Poly1305) => KeyWrapAlgorithm::EcdhEsXc20pkw,
            (AgreementMode::OnePu, WrapCipher::XChaCha20Poly1305) => {
                KeyWrapAlgorithm::Ecdh1puXc20pkw
            }
        }
    }

    /// Returns the algorithm identifier as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyWrapAlgorithm::EcdhEsA256kw => "ECDH-ES+A256KW",
            KeyWrapAlgorithm::Ecdh1puA256kw => "ECDH-1PU+A256KW",
            KeyWrapAlgorithm::EcdhEsXc20pkw => "ECDH-ES+XC20PKW",
            KeyWrapAlgorithm::Ecdh1puXc20pkw => "ECDH-1PU+XC20PKW",
        }
    }

    /// Agreement mode of this algorithm
    pub fn mode(&self) -> AgreementMode {
        match self {
            KeyWrapAlgorithm::EcdhEsA256kw | KeyWrapAlgorithm::EcdhEsXc20pkw => AgreementMode::Es,
            KeyWrapAlgorithm::Ecdh1puA256kw | KeyWrapAlgorithm::Ecdh1puXc20pkw => {
                AgreementMode::OnePu
            }
        }
    }

    /// Wrap cipher of this algorithm
    pub fn cipher(&self) -> WrapCipher {
        match self {
            KeyWrapAlgorithm::EcdhEsA256kw | KeyWrapAlgorithm::Ecdh1puA256kw => {
                WrapCipher::Aes256Gcm
            }
            KeyWrapAlgorithm::EcdhEsXc20pkw | KeyWrapAlgorithm::Ecdh1puXc20pkw => {
                WrapCipher::XChaCha20Poly1305
            }
        }
    }
}

impl fmt::Display for KeyWrapAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyWrapAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        KeyWrapAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.as_str() == s)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("key wrap alg `{}`", s)))
    }
}

/// Result of wrapping a CEK for one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientWrappedKey {
    /// Recipient key identifier (empty if the recipient key had none)
    pub kid: String,
    /// Key wrapping algorithm literal
    pub alg: String,
    /// Wrapped CEK in `nonce || ciphertext || tag` form
    pub encrypted_cek: Vec<u8>,
    /// Agreement PartyUInfo
    pub apu: Vec<u8>,
    /// Agreement PartyVInfo
    pub apv: Vec<u8>,
    /// Ephemeral public key
    pub epk: PublicKey,
}
