//! # Container-File Backend
//!
//! Presents a save as one flat encrypted file in the portable exchange
//! format: an encrypted self-checksummed header, a plain backup header, one
//! record plus aligned ciphertext per entry, and a signed trailer. Payload
//! decryption is deferred until an entry's bytes are actually asked for.

use crate::domain::entry::{EntryKind, SaveEntry};
use crate::domain::layout::{
    align_up, BkHeader, FileRecord, SaveHeader, BK_HEADER_SIZE, BLOCK_SIZE, FILE_RECORD_SIZE,
    HEADER_IV, HEADER_SIZE, TRAILER_PAD_SIZE, TRAILING_MAGIC,
};
use crate::ports::KeyService;
use crate::storage::SaveStorage;
use shared_crypto::{sha256, Iv};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Save storage backed by one portable container file.
pub struct ContainerStorage<K: KeyService + 'static> {
    path: PathBuf,
    keys: Arc<K>,
}

impl<K: KeyService + 'static> ContainerStorage<K> {
    /// Open the backend over a container path. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>, keys: Arc<K>) -> Self {
        Self {
            path: path.into(),
            keys,
        }
    }

    /// Path of the container file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back everything from the backup header to the end of the entry
    /// area, sign its digest, and append the signature chain.
    fn sign_container(&self, file: &mut File) -> bool {
        let Ok(end) = file.stream_position() else {
            return false;
        };
        if file.seek(SeekFrom::Start(HEADER_SIZE as u64)).is_err() {
            return false;
        }
        let mut span = vec![0u8; (end - HEADER_SIZE as u64) as usize];
        if file.read_exact(&mut span).is_err() {
            return false;
        }

        let Some(bk_header) = BkHeader::parse(&span[..BK_HEADER_SIZE]) else {
            return false;
        };
        let digest = sha256(&span);
        let (signature, title_cert) = match self.keys.sign(&digest, bk_header.title_id) {
            Ok(signed) => signed,
            Err(e) => {
                tracing::warn!(
                    "[save] Signing failed for title {}: {e}",
                    bk_header.title_id
                );
                return false;
            }
        };

        if file.seek(SeekFrom::Start(end)).is_err() {
            return false;
        }
        let device_cert = self.keys.device_certificate();
        file.write_all(signature.as_bytes()).is_ok()
            && file.write_all(&TRAILING_MAGIC.to_be_bytes()).is_ok()
            && file.write_all(device_cert.as_bytes()).is_ok()
            && file.write_all(title_cert.as_bytes()).is_ok()
            && file.write_all(&[0u8; TRAILER_PAD_SIZE]).is_ok()
    }
}

/// Open, seek, read and decrypt one entry payload. Runs inside the entry's
/// lazy thunk; the handle lives only for this call.
fn read_encrypted_payload<K: KeyService>(
    path: &Path,
    keys: &K,
    offset: u64,
    aligned_len: usize,
    declared_len: u32,
    iv: [u8; 16],
) -> Option<Vec<u8>> {
    let mut file = File::open(path).ok()?;
    file.seek(SeekFrom::Start(offset)).ok()?;
    let mut ciphertext = vec![0u8; aligned_len];
    file.read_exact(&mut ciphertext).ok()?;

    let mut plaintext = keys.decrypt(&Iv::from_bytes(iv), &ciphertext).ok()?;
    plaintext.truncate(declared_len as usize);
    Some(plaintext)
}

impl<K: KeyService + 'static> SaveStorage for ContainerStorage<K> {
    fn save_exists(&self) -> bool {
        self.path.is_file()
    }

    fn erase_save(&mut self) -> bool {
        if !self.path.exists() {
            return true;
        }
        std::fs::remove_file(&self.path).is_ok()
    }

    fn read_header(&self) -> Option<SaveHeader> {
        let mut file = File::open(&self.path).ok()?;
        let mut block = vec![0u8; HEADER_SIZE];
        file.read_exact(&mut block).ok()?;

        let plaintext = self
            .keys
            .decrypt(&Iv::from_bytes(HEADER_IV), &block)
            .ok()?;

        let banner_size = u32::from_be_bytes(plaintext[0x08..0x0C].try_into().ok()?);
        if !SaveHeader::banner_size_valid(banner_size) {
            return None;
        }
        if !SaveHeader::verify_digest(&plaintext) {
            tracing::warn!(
                "[save] Header digest mismatch in {}; stored {}",
                self.path.display(),
                hex::encode(&plaintext[0x0E..0x1E])
            );
            return None;
        }
        SaveHeader::parse(&plaintext)
    }

    fn read_bk_header(&self) -> Option<BkHeader> {
        let mut file = File::open(&self.path).ok()?;
        file.seek(SeekFrom::Start(HEADER_SIZE as u64)).ok()?;
        let mut block = [0u8; BK_HEADER_SIZE];
        file.read_exact(&mut block).ok()?;
        BkHeader::parse(&block)
    }

    fn read_entries(&self) -> Option<Vec<SaveEntry>> {
        let bk_header = self.read_bk_header()?;
        // The count is a plaintext field with no signature check at read
        // time. Every record costs at least FILE_RECORD_SIZE, so a count the
        // declared entry area cannot hold is structurally invalid; reject it
        // before sizing any allocation from it.
        if bk_header.number_of_entries > bk_header.size_of_entries / FILE_RECORD_SIZE as u32 {
            return None;
        }
        let mut file = File::open(&self.path).ok()?;
        let file_len = file.metadata().ok()?.len();

        let mut offset = (HEADER_SIZE + BK_HEADER_SIZE) as u64;
        let mut entries = Vec::with_capacity(bk_header.number_of_entries as usize);
        for _ in 0..bk_header.number_of_entries {
            file.seek(SeekFrom::Start(offset)).ok()?;
            let mut block = [0u8; FILE_RECORD_SIZE];
            file.read_exact(&mut block).ok()?;
            let record = FileRecord::parse(&block)?;
            offset += FILE_RECORD_SIZE as u64;

            match record.kind {
                EntryKind::Directory => entries.push(SaveEntry::directory(
                    record.name,
                    record.permissions,
                    record.attributes,
                )),
                EntryKind::File => {
                    let aligned_len = align_up(record.size, BLOCK_SIZE) as usize;
                    let data_offset = offset;
                    let path = self.path.clone();
                    let keys = self.keys.clone();
                    let iv = record.iv;
                    let declared_len = record.size;
                    entries.push(SaveEntry::file(
                        record.name,
                        record.permissions,
                        record.attributes,
                        record.size,
                        move || {
                            read_encrypted_payload(
                                &path,
                                keys.as_ref(),
                                data_offset,
                                aligned_len,
                                declared_len,
                                iv,
                            )
                        },
                    ));
                    // The cursor advances whether or not the payload is ever
                    // decrypted.
                    offset += aligned_len as u64;
                }
            }
        }

        // A container shorter than its declared entry area is truncated.
        if offset > file_len {
            return None;
        }
        Some(entries)
    }

    fn write_header(&mut self, header: &SaveHeader) -> bool {
        let block = header.to_bytes();
        let Ok(ciphertext) = self.keys.encrypt(&Iv::from_bytes(HEADER_IV), &block) else {
            return false;
        };
        let Ok(mut file) = File::create(&self.path) else {
            return false;
        };
        file.write_all(&ciphertext).is_ok()
    }

    fn write_bk_header(&mut self, bk_header: &BkHeader) -> bool {
        let Ok(mut file) = OpenOptions::new().write(true).open(&self.path) else {
            return false;
        };
        file.seek(SeekFrom::Start(HEADER_SIZE as u64)).is_ok()
            && file.write_all(&bk_header.to_bytes()).is_ok()
    }

    fn write_entries(&mut self, entries: &[SaveEntry]) -> bool {
        let Ok(mut file) = OpenOptions::new().read(true).write(true).open(&self.path) else {
            return false;
        };
        if file
            .seek(SeekFrom::Start((HEADER_SIZE + BK_HEADER_SIZE) as u64))
            .is_err()
        {
            return false;
        }

        for entry in entries {
            let iv = match entry.kind {
                EntryKind::File => Iv::generate(),
                EntryKind::Directory => Iv::zero(),
            };
            let record = FileRecord {
                size: entry.size,
                permissions: entry.permissions,
                attributes: entry.attributes,
                kind: entry.kind,
                name: entry.path.clone(),
                iv: *iv.as_bytes(),
            };
            if file.write_all(&record.to_bytes()).is_err() {
                return false;
            }
            if entry.kind == EntryKind::Directory {
                continue;
            }

            let Some(data) = entry.data() else {
                tracing::warn!("[save] Could not materialize payload for {}", entry.path);
                return false;
            };
            let aligned_len = align_up(entry.size, BLOCK_SIZE) as usize;
            let mut padded = vec![0u8; aligned_len];
            let copy_len = data.len().min(aligned_len);
            padded[..copy_len].copy_from_slice(&data[..copy_len]);

            let Ok(ciphertext) = self.keys.encrypt(&iv, &padded) else {
                return false;
            };
            if file.write_all(&ciphertext).is_err() {
                return false;
            }
        }

        self.sign_container(&mut file)
    }
}
