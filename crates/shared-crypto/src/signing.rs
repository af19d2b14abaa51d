//! # Device Signing (ECDSA)
//!
//! ECDSA over secp256k1 for the container's end-of-file signature chain.
//! Signatures are produced over a precomputed SHA-256 digest and serialized
//! as fixed-width `r || s`, matching the 0x40-byte signature slot in the
//! container trailer.

use crate::CryptoError;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

/// Serialized signature width (`r || s`).
pub const SIGNATURE_SIZE: usize = 0x40;

/// Width of a certificate blob in the container trailer.
pub const CERT_SIZE: usize = 0x180;

/// Fixed-width ECDSA signature (`r || s`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EcdsaSignature([u8; SIGNATURE_SIZE]);

impl EcdsaSignature {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }
}

/// Opaque fixed-width certificate blob.
///
/// The trailer carries two of these: the device certificate and the
/// intermediate certificate issued alongside each signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Certificate([u8; CERT_SIZE]);

impl Certificate {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; CERT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidCertificateLength` if `bytes` is not
    /// exactly `CERT_SIZE` long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; CERT_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidCertificateLength {
                    expected: CERT_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; CERT_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Certificate({} bytes)", CERT_SIZE)
    }
}

/// Device signing key (secp256k1).
pub struct DeviceKey {
    signing_key: SigningKey,
}

impl DeviceKey {
    /// Generate a random device key.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Sign a precomputed 32-byte digest.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::SigningFailed` if the signing operation fails.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<EcdsaSignature, CryptoError> {
        let sig: Signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes.copy_from_slice(&sig.to_bytes());
        Ok(EcdsaSignature::from_bytes(bytes))
    }

    /// Compressed SEC1 public key bytes (33 bytes).
    pub fn public_key_bytes(&self) -> [u8; 33] {
        let point = self.signing_key.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(point.as_bytes());
        bytes
    }

    /// Verify a signature produced by [`DeviceKey::sign_digest`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::SignatureVerificationFailed` on mismatch.
    pub fn verify_digest(
        public_key: &[u8; 33],
        digest: &[u8; 32],
        signature: &EcdsaSignature,
    ) -> Result<(), CryptoError> {
        let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig =
            Signature::from_slice(signature.as_bytes()).map_err(|_| CryptoError::InvalidSignature)?;

        verifying_key
            .verify_prehash(digest, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}
