//! # Transfer Orchestration
//!
//! Backend-agnostic copy plus the import/export flows built on it. The copy
//! loop talks only to [`SaveStorage`], so the same code moves a save from the
//! console filesystem into a container and back.

use crate::domain::TitleId;
use crate::ports::{KeyService, SaveFilesystem, TitleRegistry};
use crate::storage::{ContainerStorage, InternalStorage, SaveStorage};
use std::path::Path;
use std::sync::Arc;

/// File name of a container inside its per-title export directory.
pub const CONTAINER_FILE_NAME: &str = "data.bin";

/// Outcome of a transfer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The save was copied in full.
    Success,
    /// A write failed or an environment step (directory creation, signing)
    /// could not complete.
    Error,
    /// The user declined to overwrite an existing save.
    Cancelled,
    /// The source save failed a structural or integrity check.
    CorruptedSource,
    /// The container's title is not installed and could not be provisioned.
    TitleMissing,
}

impl TransferOutcome {
    /// True only for [`TransferOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success)
    }
}

// =============================================================================
// COPY
// =============================================================================

/// Copy a whole save from one backend to another.
///
/// Reads everything from the source first; any read failure reports
/// [`TransferOutcome::CorruptedSource`] before the destination is touched.
/// The destination is then erased and rewritten; any write failure reports
/// [`TransferOutcome::Error`] and may leave a partial save behind.
pub fn copy_save<S, D>(source: &S, dest: &mut D) -> TransferOutcome
where
    S: SaveStorage + ?Sized,
    D: SaveStorage + ?Sized,
{
    let Some(header) = source.read_header() else {
        tracing::warn!("[save] Source header missing or corrupt; copy aborted");
        return TransferOutcome::CorruptedSource;
    };
    let Some(bk_header) = source.read_bk_header() else {
        tracing::warn!("[save] Source backup header missing or corrupt; copy aborted");
        return TransferOutcome::CorruptedSource;
    };
    let Some(entries) = source.read_entries() else {
        tracing::warn!("[save] Source entries missing or corrupt; copy aborted");
        return TransferOutcome::CorruptedSource;
    };

    if !dest.erase_save() {
        tracing::warn!("[save] Could not erase destination save");
        return TransferOutcome::Error;
    }
    if !dest.write_header(&header)
        || !dest.write_bk_header(&bk_header)
        || !dest.write_entries(&entries)
    {
        tracing::warn!("[save] Write to destination failed for title {}", header.title_id);
        return TransferOutcome::Error;
    }

    tracing::info!(
        "[save] Copied save for title {} ({} entries)",
        header.title_id,
        bk_header.number_of_entries
    );
    TransferOutcome::Success
}

// =============================================================================
// IMPORT / EXPORT
// =============================================================================

/// Import a container file into the console filesystem.
///
/// `open_internal` supplies the destination backend for the container's
/// title. `can_overwrite` is consulted only when that title already has a
/// save; answering `false` yields [`TransferOutcome::Cancelled`] with the
/// existing save untouched.
pub fn import_save<K, F, R>(
    container_path: &Path,
    keys: Arc<K>,
    registry: &mut R,
    open_internal: impl FnOnce(TitleId) -> InternalStorage<F>,
    can_overwrite: impl FnOnce() -> bool,
) -> TransferOutcome
where
    K: KeyService + 'static,
    F: SaveFilesystem + 'static,
    R: TitleRegistry + ?Sized,
{
    let container = ContainerStorage::new(container_path, keys);
    let Some(header) = container.read_header() else {
        tracing::warn!(
            "[save] Rejecting container {}: header check failed",
            container_path.display()
        );
        return TransferOutcome::CorruptedSource;
    };

    let title_id = header.title_id;
    if !registry.ensure_title_imported(title_id) {
        tracing::warn!("[save] Title {title_id} is not installed; import refused");
        return TransferOutcome::TitleMissing;
    }

    let mut dest = open_internal(title_id);
    if dest.save_exists() && !can_overwrite() {
        tracing::info!("[save] Import of title {title_id} cancelled by user");
        return TransferOutcome::Cancelled;
    }

    copy_save(&container, &mut dest)
}

/// Export a console save into `dest_dir/<title-dir>/data.bin`.
pub fn export_save<F, K>(
    source: &InternalStorage<F>,
    dest_dir: &Path,
    keys: Arc<K>,
) -> TransferOutcome
where
    F: SaveFilesystem + 'static,
    K: KeyService + 'static,
{
    let title_id = source.title_id();
    let title_dir = dest_dir.join(title_id.export_dir_name());
    if let Err(e) = std::fs::create_dir_all(&title_dir) {
        tracing::warn!(
            "[save] Could not create export directory {}: {e}",
            title_dir.display()
        );
        return TransferOutcome::Error;
    }

    let mut dest = ContainerStorage::new(title_dir.join(CONTAINER_FILE_NAME), keys);
    copy_save(source, &mut dest)
}

/// Export every installed title that has a save. Returns the number of
/// containers written; per-title failures are logged and skipped.
pub fn export_all<R, F, K>(
    registry: &R,
    dest_dir: &Path,
    keys: Arc<K>,
    open_internal: impl Fn(TitleId) -> InternalStorage<F>,
) -> usize
where
    R: TitleRegistry + ?Sized,
    F: SaveFilesystem + 'static,
    K: KeyService + 'static,
{
    let mut exported = 0;
    for title_id in registry.installed_titles() {
        let source = open_internal(title_id);
        if !source.save_exists() {
            continue;
        }
        match export_save(&source, dest_dir, keys.clone()) {
            TransferOutcome::Success => exported += 1,
            outcome => {
                tracing::warn!("[save] Export of title {title_id} failed: {outcome:?}");
            }
        }
    }
    exported
}
