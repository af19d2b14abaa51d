//! # Domain Layer
//!
//! Pure data contracts: the packed binary layouts of the container format and
//! the backend-independent in-memory save model. No I/O happens here.

pub mod entry;
pub mod layout;

pub use entry::{EntryKind, LazyPayload, SaveEntry, TitleId};
pub use layout::{BkHeader, FileRecord, SaveHeader};
