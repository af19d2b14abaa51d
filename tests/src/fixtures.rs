//! Shared fixtures: a populated in-memory save and an ephemeral key service.

use save_storage::domain::layout::BANNER_MIN_SIZE;
use save_storage::{
    InternalStorage, MemoryFilesystem, SaveFilesystem, SoftwareKeyService, TitleId, BANNER_FILE,
};
use std::sync::Arc;

/// Title used across the suite. High half is a system type, low half spells
/// an ASCII game code.
pub const TEST_TITLE_ID: u64 = 0x0001_0001_4841_4741;

/// Device identifier stamped into backup headers.
pub const TEST_DEVICE_ID: u32 = 0x0403_AC89;

/// Default file mode: owner and group read/write, other read.
pub const TEST_FILE_MODE: u8 = 0x3C;

/// An in-memory save with a banner, one directory and two files.
pub fn populated_save_fs() -> Arc<MemoryFilesystem> {
    let fs = MemoryFilesystem::new();
    fs.write_file(
        BANNER_FILE,
        &banner_bytes(BANNER_MIN_SIZE as usize),
        TEST_FILE_MODE,
    )
    .expect("banner write");
    fs.create_dir("slot0", 0x3F).expect("dir create");
    fs.write_file("slot0/progress.sav", &payload_bytes(0x135), TEST_FILE_MODE)
        .expect("file write");
    fs.write_file("slot0/options.cfg", &payload_bytes(0x40), TEST_FILE_MODE)
        .expect("file write");
    Arc::new(fs)
}

/// An in-memory save holding only a banner.
pub fn banner_only_fs() -> Arc<MemoryFilesystem> {
    let fs = MemoryFilesystem::new();
    fs.write_file(
        BANNER_FILE,
        &banner_bytes(BANNER_MIN_SIZE as usize),
        TEST_FILE_MODE,
    )
    .expect("banner write");
    Arc::new(fs)
}

/// Internal backend over `fs` for the suite's title.
pub fn internal_storage(fs: Arc<MemoryFilesystem>) -> InternalStorage<MemoryFilesystem> {
    InternalStorage::new(fs, TitleId::new(TEST_TITLE_ID), TEST_DEVICE_ID)
}

/// Key service with the published transfer key and a fresh device key.
pub fn ephemeral_keys() -> Arc<SoftwareKeyService> {
    Arc::new(SoftwareKeyService::ephemeral(TEST_DEVICE_ID))
}

/// Deterministic banner content: recognizable, byte-varied, fixed length.
pub fn banner_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Deterministic payload content distinct from [`banner_bytes`].
pub fn payload_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(7) % 253) as u8).collect()
}
