//! # In-Memory Save Model
//!
//! Backend-independent representation of a save bundle's entries. Everything
//! here is transient: entries are built for the duration of one copy operation
//! and discarded afterward.

use std::cell::OnceCell;
use std::fmt;

/// 64-bit title identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TitleId(u64);

impl TitleId {
    /// Create from the raw 64-bit value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw 64-bit value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// High 32 bits (title type).
    pub fn high(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Low 32 bits (title code).
    pub fn low(&self) -> u32 {
        self.0 as u32
    }

    /// Path fragment of this title's save data directory.
    pub fn data_dir(&self) -> String {
        format!("title/{:08x}/{:08x}/data", self.high(), self.low())
    }

    /// Deterministic export directory name, derived from the raw low four
    /// bytes of the identifier. Printable ASCII bytes are kept verbatim,
    /// anything else maps to `_`.
    pub fn export_dir_name(&self) -> String {
        self.low()
            .to_be_bytes()
            .iter()
            .map(|&b| {
                if b.is_ascii_alphanumeric() {
                    b as char
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Entry type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file with a payload.
    File,
    /// Directory; no payload, children are separate entries.
    Directory,
}

impl EntryKind {
    /// Wire discriminant used in file records.
    pub fn to_wire(self) -> u8 {
        match self {
            EntryKind::File => 1,
            EntryKind::Directory => 2,
        }
    }

    /// Parse the wire discriminant.
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            1 => Some(EntryKind::File),
            2 => Some(EntryKind::Directory),
            _ => None,
        }
    }
}

/// Deferred payload: a thunk evaluated at most once.
///
/// Backends bind whatever the materialization needs (a filesystem path, or a
/// container offset plus IV) into the closure; nothing is read or decrypted
/// until someone asks for the bytes.
pub struct LazyPayload {
    thunk: Box<dyn Fn() -> Option<Vec<u8>>>,
    cell: OnceCell<Option<Vec<u8>>>,
}

impl LazyPayload {
    /// Defer materialization to `thunk`.
    pub fn deferred(thunk: impl Fn() -> Option<Vec<u8>> + 'static) -> Self {
        Self {
            thunk: Box::new(thunk),
            cell: OnceCell::new(),
        }
    }

    /// Payload already in memory.
    pub fn ready(data: Vec<u8>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(Some(data));
        Self {
            thunk: Box::new(|| None),
            cell,
        }
    }

    /// Materialize (once) and borrow the bytes. `None` means the payload
    /// could not be produced; the failure is memoized too.
    pub fn get(&self) -> Option<&[u8]> {
        self.cell.get_or_init(|| (self.thunk)()).as_deref()
    }
}

/// One file or directory inside a save bundle.
pub struct SaveEntry {
    /// Entry permission byte.
    pub permissions: u8,
    /// Entry attribute byte.
    pub attributes: u8,
    /// File or directory.
    pub kind: EntryKind,
    /// Path relative to the save root.
    pub path: String,
    /// Declared payload size in bytes; zero for directories.
    pub size: u32,
    payload: Option<LazyPayload>,
}

impl SaveEntry {
    /// Create a directory entry.
    pub fn directory(path: impl Into<String>, permissions: u8, attributes: u8) -> Self {
        Self {
            permissions,
            attributes,
            kind: EntryKind::Directory,
            path: path.into(),
            size: 0,
            payload: None,
        }
    }

    /// Create a file entry with a deferred payload.
    pub fn file(
        path: impl Into<String>,
        permissions: u8,
        attributes: u8,
        size: u32,
        thunk: impl Fn() -> Option<Vec<u8>> + 'static,
    ) -> Self {
        Self {
            permissions,
            attributes,
            kind: EntryKind::File,
            path: path.into(),
            size,
            payload: Some(LazyPayload::deferred(thunk)),
        }
    }

    /// Create a file entry with its payload already in memory.
    pub fn file_with_data(
        path: impl Into<String>,
        permissions: u8,
        attributes: u8,
        data: Vec<u8>,
    ) -> Self {
        Self {
            permissions,
            attributes,
            kind: EntryKind::File,
            path: path.into(),
            size: data.len() as u32,
            payload: Some(LazyPayload::ready(data)),
        }
    }

    /// True for file entries.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Materialize and borrow the payload. `None` for directories and for
    /// files whose payload could not be produced.
    pub fn data(&self) -> Option<&[u8]> {
        self.payload.as_ref()?.get()
    }
}

impl fmt::Debug for SaveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveEntry")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("permissions", &self.permissions)
            .field("attributes", &self.attributes)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
