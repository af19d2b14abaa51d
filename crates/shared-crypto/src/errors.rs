//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Input is not a whole number of cipher blocks
    #[error("Input length {len} is not a multiple of the {block} byte block size")]
    UnalignedInput {
        /// Actual input length in bytes
        len: usize,
        /// Cipher block size in bytes
        block: usize,
    },

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid signature format
    #[error("Invalid signature format")]
    InvalidSignature,

    /// Invalid certificate length
    #[error("Invalid certificate length: expected {expected}, got {actual}")]
    InvalidCertificateLength {
        /// Expected certificate length in bytes
        expected: usize,
        /// Actual certificate length in bytes
        actual: usize,
    },
}
