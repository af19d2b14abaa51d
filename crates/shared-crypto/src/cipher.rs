//! # Transfer Cipher
//!
//! AES-128-CBC without padding, as mandated by the portable container format.
//! Every payload handed to this module is already aligned to the container's
//! block granularity, so the unpadded cipher never sees a partial block.

use crate::CryptoError;
use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroize;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// Transfer key length in bytes (AES-128).
pub const TRANSFER_KEY_SIZE: usize = 16;

/// Initialization vector length in bytes.
pub const IV_SIZE: usize = 16;

/// Symmetric transfer key (AES-128).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct TransferKey([u8; TRANSFER_KEY_SIZE]);

impl TransferKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; TRANSFER_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TRANSFER_KEY_SIZE];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; TRANSFER_KEY_SIZE] {
        &self.0
    }
}

/// CBC initialization vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; IV_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generate a random IV.
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_SIZE];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// All-zero IV, used for directory records which carry no payload.
    pub fn zero() -> Self {
        Self([0u8; IV_SIZE])
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

/// Encrypt a block-aligned buffer with AES-128-CBC.
///
/// # Errors
///
/// Returns `CryptoError::UnalignedInput` if `plaintext` is not a whole number
/// of AES blocks.
pub fn encrypt(key: &TransferKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if plaintext.len() % AES_BLOCK_SIZE != 0 {
        return Err(CryptoError::UnalignedInput {
            len: plaintext.len(),
            block: AES_BLOCK_SIZE,
        });
    }

    let cipher = Aes128CbcEnc::new(key.as_bytes().into(), iv.as_bytes().into());
    Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(plaintext))
}

/// Decrypt a block-aligned buffer with AES-128-CBC.
///
/// # Errors
///
/// Returns `CryptoError::UnalignedInput` if `ciphertext` is not a whole number
/// of AES blocks, or `CryptoError::DecryptionFailed` on cipher failure.
pub fn decrypt(key: &TransferKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(CryptoError::UnalignedInput {
            len: ciphertext.len(),
            block: AES_BLOCK_SIZE,
        });
    }

    let cipher = Aes128CbcDec::new(key.as_bytes().into(), iv.as_bytes().into());
    cipher
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
