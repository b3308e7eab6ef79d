//! Cryptographic building blocks
//!
//! This module provides:
//! - Concat KDF per NIST SP 800-56A / RFC 7518
//! - Curve resolution and ECDH on P-256, P-384, P-521 and X25519
//! - AES-256-GCM and XChaCha20-Poly1305 with embedded nonces
//! - Framing between keyset AEAD output and `(ciphertext, nonce)` pairs
//! - ECDH-ES and ECDH-1PU key wrapping

pub mod aead;
pub mod curve;
pub mod envelope;
pub mod kdf;
pub mod key_wrap;

pub use aead::AeadAlgorithm;
pub use curve::{resolve, AgreementCurve, EcdhPrivateKey, NistCurve};
pub use kdf::concat_kdf;
pub use key_wrap::{unwrap_key, wrap_key};
