//! TAP Crypto
//!
//! This crate provides the cryptographic service layer for TAP messaging:
//! AEAD encryption, signatures and MACs over key handles, and ECDH-ES /
//! ECDH-1PU key wrapping of content encryption keys for JWE recipients.
//!
//! Signature backends are selected with the `crypto-ed25519`, `crypto-p256`
//! and `crypto-secp256k1` features, all enabled by default. Key agreement
//! curves are always available.

#[cfg(not(any(
    feature = "crypto-ed25519",
    feature = "crypto-p256",
    feature = "crypto-secp256k1"
)))]
compile_error!("enable at least one signature backend feature");

/// Wrap/unwrap options
pub mod config;

/// Cryptographic building blocks
pub mod crypto;

/// Error types
pub mod error;

/// Public keys, algorithm identifiers and wrapped keys
pub mod key;

/// Key handles and key material
pub mod keyset;

/// Keyset-backed primitives
pub mod primitive;

/// Crypto service
pub mod service;

// Re-export key types for convenience
pub use config::WrapKeyOptions;
pub use error::{Error, Result};
pub use key::{
    AgreementMode, Curve, KeyType, KeyWrapAlgorithm, PublicKey, RecipientWrappedKey, WrapCipher,
};
pub use keyset::{KeyEntry, KeyHandle, KeyMaterial, KeyStatus, KeyTemplate, OutputPrefixType};
pub use service::{Crypto, DefaultCrypto};

/// Version of TAP Crypto
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
