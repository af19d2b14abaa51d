//! # Storage Abstraction
//!
//! The single capability surface the copy orchestration is allowed to use.
//! Two backends implement it: [`InternalStorage`] (a save as loose files in
//! the console filesystem) and [`ContainerStorage`] (a save as one flat
//! encrypted container file). Orchestration code never branches on which
//! backend it holds.

pub mod container;
pub mod internal;

pub use container::ContainerStorage;
pub use internal::{InternalStorage, BANNER_FILE};

use crate::domain::{BkHeader, SaveEntry, SaveHeader};

/// Polymorphic save storage.
///
/// Read operations return `None` (never panic) when the underlying data is
/// absent, truncated, or fails a structural check. Write operations return a
/// success flag. A failed write may leave the backend's medium in a partially
/// written state; callers treat any `false` as fatal for the whole copy.
pub trait SaveStorage {
    /// True if the medium currently holds a save.
    fn save_exists(&self) -> bool;

    /// Remove any prior header and entries. Idempotent: erasing an already
    /// empty medium succeeds.
    fn erase_save(&mut self) -> bool;

    /// Read and validate the save header.
    fn read_header(&self) -> Option<SaveHeader>;

    /// Read (or synthesize) the backup header.
    fn read_bk_header(&self) -> Option<BkHeader>;

    /// Read all entries; file payloads stay lazy until asked for.
    fn read_entries(&self) -> Option<Vec<SaveEntry>>;

    /// Write the save header. The header digest must already be finalized.
    fn write_header(&mut self, header: &SaveHeader) -> bool;

    /// Write the backup header.
    fn write_bk_header(&mut self, bk_header: &BkHeader) -> bool;

    /// Write all entries, in order.
    fn write_entries(&mut self, entries: &[SaveEntry]) -> bool;
}
