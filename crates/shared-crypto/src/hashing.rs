//! # Hashing
//!
//! MD5 for the container header's self-checksum (the digest width is fixed by
//! the externally-specified format) and SHA-256 for the signing digest.

use md5::{Digest as _, Md5};
use sha2::Sha256;

/// Width of the header self-checksum in bytes.
pub const MD5_DIGEST_SIZE: usize = 16;

/// Width of the signing digest in bytes.
pub const SHA256_DIGEST_SIZE: usize = 32;

/// Compute the MD5 digest of `data`.
pub fn md5(data: &[u8]) -> [u8; MD5_DIGEST_SIZE] {
    Md5::digest(data).into()
}

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; SHA256_DIGEST_SIZE] {
    Sha256::digest(data).into()
}
