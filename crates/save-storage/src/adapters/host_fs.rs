//! # Host Filesystem Adapter
//!
//! `std::fs`-backed implementation of the filesystem port, rooted at one
//! save-data directory on the host. Console permission bytes are mapped onto
//! unix permission bits so they survive a write/read round trip; on non-unix
//! hosts a fixed default mode is reported instead.

use crate::domain::entry::{EntryKind, TitleId};
use crate::ports::{DirEntry, FileMetadata, FsError, SaveFilesystem};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Mode byte reported on hosts without unix permission bits.
pub const DEFAULT_MODE: u8 = 0x3C;

/// Host-directory-backed save filesystem.
pub struct HostFilesystem {
    root: PathBuf,
}

impl HostFilesystem {
    /// Root the filesystem at an arbitrary directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root the filesystem at `base/<title data dir>`.
    pub fn for_title(base: &Path, title_id: TitleId) -> Self {
        Self {
            root: base.join(title_id.data_dir()),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let rel = Path::new(path);
        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(FsError::Io(format!("Path escapes save root: {path}"))),
            }
        }
        Ok(self.root.join(rel))
    }

    fn io_err(path: &str, err: std::io::Error) -> FsError {
        if err.kind() == ErrorKind::NotFound {
            FsError::NotFound(path.to_string())
        } else {
            FsError::Io(err.to_string())
        }
    }
}

#[cfg(unix)]
fn mode_to_unix(mode: u8) -> u32 {
    let mut unix = 0;
    for (shift, read_bit, write_bit) in [(4, 0o400, 0o200), (2, 0o040, 0o020), (0, 0o004, 0o002)] {
        let field = (mode >> shift) & 0b11;
        if field & 0b01 != 0 {
            unix |= read_bit;
        }
        if field & 0b10 != 0 {
            unix |= write_bit;
        }
    }
    unix
}

#[cfg(unix)]
fn unix_to_mode(unix: u32) -> u8 {
    let mut mode = 0u8;
    for (shift, read_bit, write_bit) in [(4, 0o400, 0o200), (2, 0o040, 0o020), (0, 0o004, 0o002)] {
        let mut field = 0u8;
        if unix & read_bit != 0 {
            field |= 0b01;
        }
        if unix & write_bit != 0 {
            field |= 0b10;
        }
        mode |= field << shift;
    }
    mode
}

#[cfg(unix)]
fn apply_mode(path: &Path, unix: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(unix))
}

fn metadata_mode(metadata: &std::fs::Metadata) -> u8 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        unix_to_mode(metadata.permissions().mode())
    }
    #[cfg(not(unix))]
    {
        let _ = metadata;
        DEFAULT_MODE
    }
}

impl SaveFilesystem for HostFilesystem {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let full = self.resolve(path)?;
        if full.is_dir() {
            return Err(FsError::NotAFile(path.to_string()));
        }
        std::fs::read(&full).map_err(|e| Self::io_err(path, e))
    }

    fn write_file(&self, path: &str, data: &[u8], mode: u8) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        if full.is_dir() {
            return Err(FsError::NotAFile(path.to_string()));
        }
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Self::io_err(path, e))?;
        }
        std::fs::write(&full, data).map_err(|e| Self::io_err(path, e))?;
        #[cfg(unix)]
        apply_mode(&full, mode_to_unix(mode)).map_err(|e| Self::io_err(path, e))?;
        #[cfg(not(unix))]
        let _ = mode;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        let metadata = std::fs::metadata(&full).map_err(|e| Self::io_err(path, e))?;
        if metadata.is_dir() {
            std::fs::remove_dir_all(&full).map_err(|e| Self::io_err(path, e))
        } else {
            std::fs::remove_file(&full).map_err(|e| Self::io_err(path, e))
        }
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let full = self.resolve(path)?;
        if full.is_file() {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        let reader = std::fs::read_dir(&full).map_err(|e| Self::io_err(path, e))?;

        let mut entries = Vec::new();
        for item in reader {
            let item = item.map_err(|e| Self::io_err(path, e))?;
            let kind = if item.path().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(DirEntry {
                name: item.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn metadata(&self, path: &str) -> Result<FileMetadata, FsError> {
        let full = self.resolve(path)?;
        let metadata = std::fs::metadata(&full).map_err(|e| Self::io_err(path, e))?;
        Ok(FileMetadata {
            kind: if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            size: metadata.len(),
            mode: metadata_mode(&metadata),
        })
    }

    fn create_dir(&self, path: &str, mode: u8) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        if full.is_file() {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        std::fs::create_dir_all(&full).map_err(|e| Self::io_err(path, e))?;
        // Owner traversal bits are forced so the directory stays usable.
        #[cfg(unix)]
        apply_mode(&full, mode_to_unix(mode) | 0o700).map_err(|e| Self::io_err(path, e))?;
        #[cfg(not(unix))]
        let _ = mode;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }
}
