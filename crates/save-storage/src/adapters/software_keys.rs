//! # Software Key Service
//!
//! Key-service implementation backed entirely by in-process key material.
//! The transfer key and the device signing key are injected at construction;
//! certificates are fixed-width blobs embedding the issuing identity and the
//! compressed public key.

use crate::domain::entry::TitleId;
use crate::ports::KeyService;
use shared_crypto::{
    cipher, Certificate, CryptoError, DeviceKey, EcdsaSignature, Iv, TransferKey, CERT_SIZE,
};

/// The well-known published transfer key for the portable container format.
pub const DEFAULT_TRANSFER_KEY: [u8; 16] = [
    0xAB, 0x01, 0xB9, 0xD8, 0xE1, 0x62, 0x2B, 0x08, 0xAF, 0xBA, 0xD8, 0x4D, 0xBF, 0xC2, 0xA5, 0x5D,
];

const DEVICE_CERT_TAG: &[u8] = b"NG";
const TITLE_CERT_TAG: &[u8] = b"AP";

/// In-process key-management service.
pub struct SoftwareKeyService {
    transfer_key: TransferKey,
    device_key: DeviceKey,
    device_id: u32,
}

impl SoftwareKeyService {
    /// Create from explicit key material.
    pub fn new(transfer_key: TransferKey, device_key: DeviceKey, device_id: u32) -> Self {
        Self {
            transfer_key,
            device_key,
            device_id,
        }
    }

    /// Default transfer key plus a freshly generated device key.
    pub fn ephemeral(device_id: u32) -> Self {
        Self::new(
            TransferKey::from_bytes(DEFAULT_TRANSFER_KEY),
            DeviceKey::generate(),
            device_id,
        )
    }

    /// Compressed public key of the device signing key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.device_key.public_key_bytes()
    }

    fn build_certificate(tag: &[u8], identity: u64, public_key: &[u8; 33]) -> Certificate {
        let mut blob = [0u8; CERT_SIZE];
        blob[..tag.len()].copy_from_slice(tag);
        blob[0x08..0x10].copy_from_slice(&identity.to_be_bytes());
        blob[0x10..0x31].copy_from_slice(public_key);
        Certificate::from_bytes(blob)
    }
}

impl KeyService for SoftwareKeyService {
    fn encrypt(&self, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        cipher::encrypt(&self.transfer_key, iv, plaintext)
    }

    fn decrypt(&self, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        cipher::decrypt(&self.transfer_key, iv, ciphertext)
    }

    fn sign(
        &self,
        digest: &[u8; 32],
        title_id: TitleId,
    ) -> Result<(EcdsaSignature, Certificate), CryptoError> {
        let signature = self.device_key.sign_digest(digest)?;
        let certificate = Self::build_certificate(
            TITLE_CERT_TAG,
            title_id.as_u64(),
            &self.device_key.public_key_bytes(),
        );
        Ok((signature, certificate))
    }

    fn device_certificate(&self) -> Certificate {
        Self::build_certificate(
            DEVICE_CERT_TAG,
            u64::from(self.device_id),
            &self.device_key.public_key_bytes(),
        )
    }

    fn device_id(&self) -> u32 {
        self.device_id
    }
}
