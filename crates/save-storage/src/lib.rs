//! # Save Storage - SaveBridge Backends and Orchestration
//!
//! ## Architecture
//!
//! | Layer | Module | Responsibility |
//! |-------|--------|----------------|
//! | Domain | `domain` | Packed binary layouts and the in-memory save model |
//! | Ports | `ports` | Filesystem, key-service and title-registry traits |
//! | Adapters | `adapters` | Host/in-memory filesystems, software keys, title registry |
//! | Storage | `storage` | The two [`SaveStorage`] backends |
//! | Transfer | `transfer` | Backend-agnostic copy, import and export flows |
//!
//! ## Flow
//!
//! A save lives either as loose files under a per-title directory
//! ([`InternalStorage`]) or as one flat encrypted container file
//! ([`ContainerStorage`]). [`transfer::copy_save`] moves a save between any
//! two backends through the [`SaveStorage`] trait alone; import and export
//! are thin flows on top that add title provisioning, overwrite confirmation
//! and the on-disk export layout.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod storage;
pub mod transfer;

// Re-exports
pub use adapters::{
    HostFilesystem, MemoryFilesystem, MemoryTitleRegistry, SoftwareKeyService,
    DEFAULT_TRANSFER_KEY,
};
pub use domain::{BkHeader, EntryKind, FileRecord, LazyPayload, SaveEntry, SaveHeader, TitleId};
pub use ports::{DirEntry, FileMetadata, FsError, KeyService, SaveFilesystem, TitleRegistry};
pub use storage::{ContainerStorage, InternalStorage, SaveStorage, BANNER_FILE};
pub use transfer::{
    copy_save, export_all, export_save, import_save, TransferOutcome, CONTAINER_FILE_NAME,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
