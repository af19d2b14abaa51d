//! # Binary Layout Definitions
//!
//! Fixed-offset, packed byte layouts for the portable container format.
//! These are pure data contracts: every constant and offset below is mandated
//! by the externally-specified format, and all multi-byte fields are
//! big-endian.
//!
//! ## Container file layout
//!
//! ```text
//! [SaveHeader 0xF0C0] [BkHeader 0x80] [FileRecord 0x80, ciphertext]*
//! [Signature 0x40] [TrailingMagic 4] [DeviceCert 0x180] [IntermediateCert 0x180]
//! [reserved pad to FULL_CERT_SIZE]
//! ```

use crate::domain::entry::{EntryKind, TitleId};
use shared_crypto::{md5, MD5_DIGEST_SIZE};

// =============================================================================
// FORMAT CONSTANTS
// =============================================================================

/// Payload alignment granularity; every file payload is padded to this.
pub const BLOCK_SIZE: u32 = 0x40;

/// Size of one banner icon frame.
pub const ICON_SIZE: u32 = 0x1200;

/// Fixed banner base size (banner image without icon frames).
pub const BANNER_BASE_SIZE: u32 = 0x60A0;

/// Smallest valid banner payload (base plus one icon frame).
pub const BANNER_MIN_SIZE: u32 = BANNER_BASE_SIZE + ICON_SIZE;

/// Largest valid banner payload (base plus eight icon frames).
pub const BANNER_MAX_SIZE: u32 = BANNER_BASE_SIZE + 8 * ICON_SIZE;

/// Total on-disk size of the save header block.
pub const HEADER_SIZE: usize = 0x20 + BANNER_MAX_SIZE as usize;

/// On-disk size of the backup header block.
pub const BK_HEADER_SIZE: usize = 0x80;

/// Value of the backup header's declared-size field.
pub const BK_DECLARED_SIZE: u32 = 0x70;

/// Backup header magic constant.
pub const BK_MAGIC: u32 = 0x426B_0001;

/// On-disk size of one file record.
pub const FILE_RECORD_SIZE: usize = 0x80;

/// File record magic constant.
pub const FILE_RECORD_MAGIC: u32 = 0x03AD_F17E;

/// Width of the NUL-padded name field in a file record.
pub const NAME_FIELD_SIZE: usize = 0x40;

/// Width of the trailing signature slot.
pub const SIGNATURE_SIZE: usize = 0x40;

/// Magic written immediately after the signature.
pub const TRAILING_MAGIC: u32 = 0x2F53_6969;

/// Width of each certificate slot in the trailer.
pub const CERT_SIZE: usize = 0x180;

/// Total trailer size: signature, magic, both certificates, reserved pad.
pub const FULL_CERT_SIZE: usize = 0x3C0;

/// Reserved zero padding at the end of the trailer.
pub const TRAILER_PAD_SIZE: usize = FULL_CERT_SIZE - SIGNATURE_SIZE - 4 - 2 * CERT_SIZE;

/// Fixed sentinel written into the digest field before hashing the header.
pub const DIGEST_BLANKER: [u8; MD5_DIGEST_SIZE] = [
    0x0E, 0x65, 0x37, 0x81, 0x99, 0xBE, 0x45, 0x17, 0xAB, 0x06, 0xEC, 0x22, 0x45, 0x1A, 0x57, 0x93,
];

/// Fixed, publicly known IV used for the header block's encryption.
pub const HEADER_IV: [u8; 16] = [
    0x21, 0x67, 0x12, 0xE6, 0xAA, 0x1F, 0x68, 0x9F, 0x95, 0xC5, 0xA2, 0x23, 0x24, 0xDC, 0x6A, 0x98,
];

const DIGEST_OFFSET: usize = 0x0E;
const BANNER_OFFSET: usize = 0x20;

/// Round `value` up to the next multiple of `align`.
pub const fn align_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

// =============================================================================
// SAVE HEADER
// =============================================================================

/// The save header: title identity, permissions, banner payload, and the
/// self-referential digest.
///
/// The stored digest is always MD5 over the full header block with the digest
/// field itself replaced by [`DIGEST_BLANKER`]. Both writing and verification
/// go through the same two-phase procedure (blank, hash, compare/store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveHeader {
    /// Title the save belongs to.
    pub title_id: TitleId,
    /// Length of the meaningful banner payload in bytes.
    pub banner_size: u32,
    /// Save permission byte.
    pub permissions: u8,
    /// Self-checksum over the blanked header block.
    pub digest: [u8; MD5_DIGEST_SIZE],
    /// Banner payload; only the first `banner_size` bytes are meaningful.
    pub banner: Vec<u8>,
}

impl SaveHeader {
    /// Create a header with a zeroed digest. Call [`SaveHeader::finalize_digest`]
    /// once every other field is populated.
    pub fn new(title_id: TitleId, permissions: u8, banner: Vec<u8>) -> Self {
        Self {
            title_id,
            banner_size: banner.len() as u32,
            permissions,
            digest: [0u8; MD5_DIGEST_SIZE],
            banner,
        }
    }

    /// True if `size` is a structurally valid banner payload length.
    pub fn banner_size_valid(size: u32) -> bool {
        (BANNER_MIN_SIZE..=BANNER_MAX_SIZE).contains(&size)
            && (size - BANNER_BASE_SIZE) % ICON_SIZE == 0
    }

    /// Serialize to the fixed-size header block, zero-padding the banner area.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut block = vec![0u8; HEADER_SIZE];
        block[0x00..0x08].copy_from_slice(&self.title_id.as_u64().to_be_bytes());
        block[0x08..0x0C].copy_from_slice(&self.banner_size.to_be_bytes());
        block[0x0C] = self.permissions;
        block[DIGEST_OFFSET..DIGEST_OFFSET + MD5_DIGEST_SIZE].copy_from_slice(&self.digest);
        let banner_len = self.banner.len().min(BANNER_MAX_SIZE as usize);
        block[BANNER_OFFSET..BANNER_OFFSET + banner_len]
            .copy_from_slice(&self.banner[..banner_len]);
        block
    }

    /// Parse a header block. Structural failure returns `None`; digest
    /// verification is the caller's concern (see [`SaveHeader::verify_digest`]).
    pub fn parse(block: &[u8]) -> Option<Self> {
        if block.len() != HEADER_SIZE {
            return None;
        }
        let banner_size = u32::from_be_bytes(block[0x08..0x0C].try_into().ok()?);
        if banner_size > BANNER_MAX_SIZE {
            return None;
        }
        let mut digest = [0u8; MD5_DIGEST_SIZE];
        digest.copy_from_slice(&block[DIGEST_OFFSET..DIGEST_OFFSET + MD5_DIGEST_SIZE]);
        Some(Self {
            title_id: TitleId::new(u64::from_be_bytes(block[0x00..0x08].try_into().ok()?)),
            banner_size,
            permissions: block[0x0C],
            digest,
            banner: block[BANNER_OFFSET..BANNER_OFFSET + banner_size as usize].to_vec(),
        })
    }

    /// Compute the digest of a raw header block with its digest field blanked.
    pub fn compute_digest(block: &[u8]) -> [u8; MD5_DIGEST_SIZE] {
        let mut blanked = block.to_vec();
        blanked[DIGEST_OFFSET..DIGEST_OFFSET + MD5_DIGEST_SIZE].copy_from_slice(&DIGEST_BLANKER);
        md5(&blanked)
    }

    /// Verify a raw header block against its stored digest.
    pub fn verify_digest(block: &[u8]) -> bool {
        if block.len() != HEADER_SIZE {
            return false;
        }
        let stored = &block[DIGEST_OFFSET..DIGEST_OFFSET + MD5_DIGEST_SIZE];
        Self::compute_digest(block) == stored
    }

    /// Two-phase digest population: serialize, blank, hash, store.
    pub fn finalize_digest(&mut self) {
        let block = self.to_bytes();
        self.digest = Self::compute_digest(&block);
    }
}

// =============================================================================
// BACKUP HEADER
// =============================================================================

/// The backup header: entry count/size totals and the originating device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BkHeader {
    /// Identifier of the device that produced the container.
    pub device_id: u32,
    /// Number of file records that follow.
    pub number_of_entries: u32,
    /// Total encoded size of all records and aligned payloads.
    pub size_of_entries: u32,
    /// Always `size_of_entries + FULL_CERT_SIZE` for a well-formed container.
    pub total_size: u32,
    /// Title the save belongs to.
    pub title_id: TitleId,
}

impl BkHeader {
    /// Create a backup header; `total_size` is derived, never supplied.
    pub fn new(
        device_id: u32,
        number_of_entries: u32,
        size_of_entries: u32,
        title_id: TitleId,
    ) -> Self {
        Self {
            device_id,
            number_of_entries,
            size_of_entries,
            total_size: size_of_entries + FULL_CERT_SIZE as u32,
            title_id,
        }
    }

    /// Serialize to the fixed-size backup header block.
    pub fn to_bytes(&self) -> [u8; BK_HEADER_SIZE] {
        let mut block = [0u8; BK_HEADER_SIZE];
        block[0x00..0x04].copy_from_slice(&BK_DECLARED_SIZE.to_be_bytes());
        block[0x04..0x08].copy_from_slice(&BK_MAGIC.to_be_bytes());
        block[0x08..0x0C].copy_from_slice(&self.device_id.to_be_bytes());
        block[0x0C..0x10].copy_from_slice(&self.number_of_entries.to_be_bytes());
        block[0x10..0x14].copy_from_slice(&self.size_of_entries.to_be_bytes());
        block[0x1C..0x20].copy_from_slice(&self.total_size.to_be_bytes());
        block[0x60..0x68].copy_from_slice(&self.title_id.as_u64().to_be_bytes());
        block
    }

    /// Parse and structurally validate a backup header block.
    ///
    /// Rejects a wrong declared size, a wrong magic, and any block violating
    /// `total_size == size_of_entries + FULL_CERT_SIZE`.
    pub fn parse(block: &[u8]) -> Option<Self> {
        if block.len() != BK_HEADER_SIZE {
            return None;
        }
        let size = u32::from_be_bytes(block[0x00..0x04].try_into().ok()?);
        let magic = u32::from_be_bytes(block[0x04..0x08].try_into().ok()?);
        if size != BK_DECLARED_SIZE || magic != BK_MAGIC {
            return None;
        }
        let size_of_entries = u32::from_be_bytes(block[0x10..0x14].try_into().ok()?);
        let total_size = u32::from_be_bytes(block[0x1C..0x20].try_into().ok()?);
        if total_size != size_of_entries + FULL_CERT_SIZE as u32 {
            return None;
        }
        Some(Self {
            device_id: u32::from_be_bytes(block[0x08..0x0C].try_into().ok()?),
            number_of_entries: u32::from_be_bytes(block[0x0C..0x10].try_into().ok()?),
            size_of_entries,
            total_size,
            title_id: TitleId::new(u64::from_be_bytes(block[0x60..0x68].try_into().ok()?)),
        })
    }
}

// =============================================================================
// FILE RECORD
// =============================================================================

/// Per-entry descriptor preceding each (possibly encrypted) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Declared payload size; zero for directories.
    pub size: u32,
    /// Entry permission byte.
    pub permissions: u8,
    /// Entry attribute byte.
    pub attributes: u8,
    /// File or directory.
    pub kind: EntryKind,
    /// Path relative to the save root.
    pub name: String,
    /// Payload IV; zero for directories.
    pub iv: [u8; 16],
}

impl FileRecord {
    /// Serialize to the fixed-size record block. The name is NUL-padded and
    /// silently truncated to the name field width.
    pub fn to_bytes(&self) -> [u8; FILE_RECORD_SIZE] {
        let mut block = [0u8; FILE_RECORD_SIZE];
        block[0x00..0x04].copy_from_slice(&FILE_RECORD_MAGIC.to_be_bytes());
        block[0x04..0x08].copy_from_slice(&self.size.to_be_bytes());
        block[0x08] = self.permissions;
        block[0x09] = self.attributes;
        block[0x0A] = self.kind.to_wire();
        let name = self.name.as_bytes();
        let name_len = name.len().min(NAME_FIELD_SIZE);
        block[0x0B..0x0B + name_len].copy_from_slice(&name[..name_len]);
        block[0x50..0x60].copy_from_slice(&self.iv);
        block
    }

    /// Parse and validate a record block: magic, kind discriminant, and a
    /// UTF-8 name are all required.
    pub fn parse(block: &[u8]) -> Option<Self> {
        if block.len() != FILE_RECORD_SIZE {
            return None;
        }
        let magic = u32::from_be_bytes(block[0x00..0x04].try_into().ok()?);
        if magic != FILE_RECORD_MAGIC {
            return None;
        }
        let kind = EntryKind::from_wire(block[0x0A])?;
        let name_field = &block[0x0B..0x0B + NAME_FIELD_SIZE];
        let name_len = name_field.iter().position(|&b| b == 0).unwrap_or(NAME_FIELD_SIZE);
        let name = std::str::from_utf8(&name_field[..name_len]).ok()?.to_string();
        let mut iv = [0u8; 16];
        iv.copy_from_slice(&block[0x50..0x60]);
        Some(Self {
            size: u32::from_be_bytes(block[0x04..0x08].try_into().ok()?),
            permissions: block[0x08],
            attributes: block[0x09],
            kind,
            name,
            iv,
        })
    }

    /// Encoded size of this record plus its aligned payload.
    pub fn encoded_size(&self) -> u32 {
        match self.kind {
            EntryKind::File => FILE_RECORD_SIZE as u32 + align_up(self.size, BLOCK_SIZE),
            EntryKind::Directory => FILE_RECORD_SIZE as u32,
        }
    }
}
