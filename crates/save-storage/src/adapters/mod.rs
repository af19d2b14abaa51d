//! # Adapters
//!
//! Concrete implementations of the outbound ports: a host-directory
//! filesystem, an in-memory filesystem, a software key service, and a
//! set-backed title registry.

pub mod host_fs;
pub mod memory_fs;
pub mod software_keys;
pub mod title_registry;

pub use host_fs::HostFilesystem;
pub use memory_fs::MemoryFilesystem;
pub use software_keys::{SoftwareKeyService, DEFAULT_TRANSFER_KEY};
pub use title_registry::MemoryTitleRegistry;
