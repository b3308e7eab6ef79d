//! Error handling for TAP Crypto
//!
//! Every error carries the name of the operation that produced it. Errors
//! raised by authentication failures never say which input was wrong.

use thiserror::Error;

/// Type alias for Results with TAP Crypto errors
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for TAP Crypto
#[derive(Error, Debug)]
pub enum Error {
    /// The key handle does not hold the kind of key the operation needs
    #[error("Invalid key handle: {0}")]
    InvalidKeyHandle(String),

    /// Wrapping was requested without a recipient public key
    #[error("{0}: recipient public key is required")]
    MissingRecipientKey(&'static str),

    /// An ECDH-1PU operation was requested without a sender key
    #[error("{0}: sender key is required for ECDH-1PU")]
    MissingSender(&'static str),

    /// Key type / curve combination is not supported
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// Algorithm identifier is not supported
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Ephemeral or sender key does not match the recipient key
    #[error("Key mismatch: {0}")]
    KeyMismatch(String),

    /// Key bytes could not be parsed or are cryptographically unusable
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Requested derived key length is not usable
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// Encryption, signing or key wrapping failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Message decryption failed
    #[error("{0}: decryption failed")]
    DecryptionFailed(&'static str),

    /// Key unwrapping failed
    #[error("{0}: key unwrapping failed")]
    UnwrapFailed(&'static str),

    /// Signature or MAC verification failed
    #[error("{0}: verification failed")]
    VerificationFailed(&'static str),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Serde JSON error
    #[error("Serde JSON error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
