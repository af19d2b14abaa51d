//! # Outbound Ports
//!
//! Service interfaces the storage backends depend on. The backends never talk
//! to the host filesystem, key material, or title metadata directly; they go
//! through these traits, and the handles are injected at construction time.

use crate::domain::entry::{EntryKind, TitleId};
use shared_crypto::{Certificate, CryptoError, EcdsaSignature, Iv};
use thiserror::Error;

/// Filesystem-service errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// No entry at the given path.
    #[error("No entry at {0}")]
    NotFound(String),

    /// A directory operation hit a file.
    #[error("{0} is not a directory")]
    NotADirectory(String),

    /// A file operation hit a directory.
    #[error("{0} is not a file")]
    NotAFile(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Metadata for one filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes; zero for directories.
    pub size: u64,
    /// Permission byte (owner/group/other, two bits each).
    pub mode: u8,
}

/// One listing result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name within the listed directory.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
}

/// Filesystem service consumed by the internal-storage backend.
///
/// All paths are relative to the save root the implementation was rooted at.
/// Implementations create missing parent directories on `write_file`.
pub trait SaveFilesystem {
    /// Read a whole file.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Create or overwrite a file with the given permission byte.
    fn write_file(&self, path: &str, data: &[u8], mode: u8) -> Result<(), FsError>;

    /// Delete a file, or a directory together with its children.
    fn delete(&self, path: &str) -> Result<(), FsError>;

    /// List one directory level, sorted by name.
    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError>;

    /// Metadata for one entry.
    fn metadata(&self, path: &str) -> Result<FileMetadata, FsError>;

    /// Create a directory with the given permission byte.
    fn create_dir(&self, path: &str, mode: u8) -> Result<(), FsError>;

    /// True if any entry exists at the path.
    fn exists(&self, path: &str) -> bool;
}

/// Key-management service consumed by the container backend.
pub trait KeyService {
    /// Encrypt a block-aligned buffer with the transfer key.
    fn encrypt(&self, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt a block-aligned buffer with the transfer key.
    fn decrypt(&self, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Sign a container digest for the given title; returns the signature and
    /// the intermediate certificate issued for it.
    fn sign(
        &self,
        digest: &[u8; 32],
        title_id: TitleId,
    ) -> Result<(EcdsaSignature, Certificate), CryptoError>;

    /// This device's certificate.
    fn device_certificate(&self) -> Certificate;

    /// This device's identifier, recorded in backup headers.
    fn device_id(&self) -> u32;
}

/// Title-metadata service consumed by import and export-all.
pub trait TitleRegistry {
    /// Ensure metadata for the title is present, resolving it if possible.
    /// Returns false when the title is unknown and cannot be resolved.
    fn ensure_title_imported(&mut self, title_id: TitleId) -> bool;

    /// All installed titles, in iteration order.
    fn installed_titles(&self) -> Vec<TitleId>;
}
