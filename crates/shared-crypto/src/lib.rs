//! # Shared Crypto - SaveBridge Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `cipher` | AES-128-CBC (no padding) | Container payload/header encryption |
//! | `hashing` | MD5, SHA-256 | Header self-checksum, signing digest |
//! | `signing` | ECDSA (secp256k1) | Container signature chain |
//!
//! ## Format Notes
//!
//! The container format fixes the digest width (16 bytes), the signature slot
//! (0x40 bytes) and the certificate slots (0x180 bytes each); the primitives
//! here serialize to exactly those widths. MD5 is a format obligation, not a
//! security choice: the header digest is a structural self-check, and the
//! actual authenticity guarantee comes from the ECDSA signature chain.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cipher;
pub mod errors;
pub mod hashing;
pub mod signing;

// Re-exports
pub use cipher::{decrypt, encrypt, Iv, TransferKey, AES_BLOCK_SIZE, IV_SIZE, TRANSFER_KEY_SIZE};
pub use errors::CryptoError;
pub use hashing::{md5, sha256, MD5_DIGEST_SIZE, SHA256_DIGEST_SIZE};
pub use signing::{Certificate, DeviceKey, EcdsaSignature, CERT_SIZE, SIGNATURE_SIZE};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
