//! # Internal-Storage Backend
//!
//! Presents a save that lives as loose files inside the console filesystem,
//! rooted at the title's data directory. Header fields are derived by
//! scanning that tree: the banner file feeds the save header, and a recursive
//! walk synthesizes the backup header totals.

use crate::domain::entry::{EntryKind, SaveEntry, TitleId};
use crate::domain::layout::{
    align_up, BkHeader, SaveHeader, BANNER_MAX_SIZE, BLOCK_SIZE, FILE_RECORD_SIZE,
};
use crate::ports::SaveFilesystem;
use crate::storage::SaveStorage;
use std::sync::Arc;

/// Name of the banner file at the save root. It feeds the save header and is
/// skipped by the entry scan.
pub const BANNER_FILE: &str = "banner.bin";

// Bit 0 of this banner byte is the no-copy flag; it sits in the first content
// word after the banner magic.
const NO_COPY_BYTE: usize = 7;

/// Save storage backed by the console filesystem.
pub struct InternalStorage<F: SaveFilesystem + 'static> {
    fs: Arc<F>,
    title_id: TitleId,
    device_id: u32,
}

struct ScanAccumulator {
    entries: Vec<SaveEntry>,
    size_of_entries: u32,
}

impl<F: SaveFilesystem + 'static> InternalStorage<F> {
    /// Open the backend over an already rooted filesystem handle.
    pub fn new(fs: Arc<F>, title_id: TitleId, device_id: u32) -> Self {
        Self {
            fs,
            title_id,
            device_id,
        }
    }

    /// Title this backend is rooted at.
    pub fn title_id(&self) -> TitleId {
        self.title_id
    }

    /// Depth-first walk of the save root, skipping the banner file.
    fn scan(&self) -> Option<ScanAccumulator> {
        let mut acc = ScanAccumulator {
            entries: Vec::new(),
            size_of_entries: 0,
        };
        self.scan_dir("", &mut acc)?;
        Some(acc)
    }

    fn scan_dir(&self, dir: &str, acc: &mut ScanAccumulator) -> Option<()> {
        let listing = self.fs.list_dir(dir).ok()?;
        for item in listing {
            if dir.is_empty() && item.name == BANNER_FILE {
                continue;
            }
            let path = if dir.is_empty() {
                item.name
            } else {
                format!("{dir}/{}", item.name)
            };
            let meta = self.fs.metadata(&path).ok()?;
            match meta.kind {
                EntryKind::Directory => {
                    acc.entries.push(SaveEntry::directory(path.clone(), meta.mode, 0));
                    acc.size_of_entries += FILE_RECORD_SIZE as u32;
                    self.scan_dir(&path, acc)?;
                }
                EntryKind::File => {
                    let size = meta.size as u32;
                    let fs = self.fs.clone();
                    let file_path = path.clone();
                    acc.entries.push(SaveEntry::file(path, meta.mode, 0, size, move || {
                        fs.read_file(&file_path).ok()
                    }));
                    acc.size_of_entries += FILE_RECORD_SIZE as u32 + align_up(size, BLOCK_SIZE);
                }
            }
        }
        Some(())
    }
}

impl<F: SaveFilesystem + 'static> SaveStorage for InternalStorage<F> {
    fn save_exists(&self) -> bool {
        if self.fs.exists(BANNER_FILE) {
            return true;
        }
        self.fs
            .list_dir("")
            .map(|listing| listing.iter().any(|e| e.name != BANNER_FILE))
            .unwrap_or(false)
    }

    fn erase_save(&mut self) -> bool {
        if self.fs.exists(BANNER_FILE) && self.fs.delete(BANNER_FILE).is_err() {
            tracing::warn!("[save] Failed to delete banner for title {}", self.title_id);
            return false;
        }
        let listing = match self.fs.list_dir("") {
            Ok(listing) => listing,
            // No save root at all counts as already erased.
            Err(_) => return true,
        };
        for item in listing {
            if self.fs.delete(&item.name).is_err() {
                // Fail-fast leaves a partially erased save behind.
                tracing::warn!(
                    "[save] Erase stopped at {} for title {}; save is partially erased",
                    item.name,
                    self.title_id
                );
                return false;
            }
        }
        true
    }

    fn read_header(&self) -> Option<SaveHeader> {
        let meta = self.fs.metadata(BANNER_FILE).ok()?;
        if meta.kind != EntryKind::File
            || meta.size > BANNER_MAX_SIZE as u64
            || !SaveHeader::banner_size_valid(meta.size as u32)
        {
            return None;
        }
        let mut banner = self.fs.read_file(BANNER_FILE).ok()?;
        if banner.len() > NO_COPY_BYTE {
            banner[NO_COPY_BYTE] &= !1;
        }
        let mut header = SaveHeader::new(self.title_id, meta.mode, banner);
        header.finalize_digest();
        Some(header)
    }

    fn read_bk_header(&self) -> Option<BkHeader> {
        let scan = self.scan()?;
        Some(BkHeader::new(
            self.device_id,
            scan.entries.len() as u32,
            scan.size_of_entries,
            self.title_id,
        ))
    }

    fn read_entries(&self) -> Option<Vec<SaveEntry>> {
        Some(self.scan()?.entries)
    }

    fn write_header(&mut self, header: &SaveHeader) -> bool {
        let banner_len = header.banner.len().min(header.banner_size as usize);
        self.fs
            .write_file(BANNER_FILE, &header.banner[..banner_len], header.permissions)
            .is_ok()
    }

    fn write_bk_header(&mut self, _bk_header: &BkHeader) -> bool {
        // Backup header fields are derived from the tree on read; nothing is
        // persisted for them.
        true
    }

    fn write_entries(&mut self, entries: &[SaveEntry]) -> bool {
        for entry in entries {
            let ok = match entry.kind {
                EntryKind::Directory => {
                    self.fs.create_dir(&entry.path, entry.permissions).is_ok()
                }
                EntryKind::File => match entry.data() {
                    Some(data) => self
                        .fs
                        .write_file(&entry.path, data, entry.permissions)
                        .is_ok(),
                    None => false,
                },
            };
            if !ok {
                tracing::warn!(
                    "[save] Failed to write entry {} for title {}",
                    entry.path,
                    self.title_id
                );
                return false;
            }
        }
        true
    }
}
