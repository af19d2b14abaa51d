//! # In-Memory Filesystem Adapter
//!
//! A flat-map implementation of the filesystem port. This is the injected
//! test double for the internal backend (replacing any notion of a global
//! filereader hook); unit tests seed it through the port itself.

use crate::domain::entry::EntryKind;
use crate::ports::{DirEntry, FileMetadata, FsError, SaveFilesystem};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct MemNode {
    kind: EntryKind,
    data: Vec<u8>,
    mode: u8,
}

/// In-memory save filesystem. The root directory is implicit.
#[derive(Default)]
pub struct MemoryFilesystem {
    nodes: RefCell<BTreeMap<String, MemNode>>,
}

impl MemoryFilesystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes (files plus directories).
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    fn parent(path: &str) -> Option<&str> {
        path.rsplit_once('/').map(|(parent, _)| parent)
    }

    fn ensure_parents(&self, path: &str, mode: u8) {
        if let Some(parent) = Self::parent(path) {
            self.ensure_parents(parent, mode);
            self.nodes
                .borrow_mut()
                .entry(parent.to_string())
                .or_insert(MemNode {
                    kind: EntryKind::Directory,
                    data: Vec::new(),
                    mode,
                });
        }
    }
}

impl SaveFilesystem for MemoryFilesystem {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let nodes = self.nodes.borrow();
        let node = nodes
            .get(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        if node.kind != EntryKind::File {
            return Err(FsError::NotAFile(path.to_string()));
        }
        Ok(node.data.clone())
    }

    fn write_file(&self, path: &str, data: &[u8], mode: u8) -> Result<(), FsError> {
        if let Some(existing) = self.nodes.borrow().get(path) {
            if existing.kind == EntryKind::Directory {
                return Err(FsError::NotAFile(path.to_string()));
            }
        }
        self.ensure_parents(path, mode);
        self.nodes.borrow_mut().insert(
            path.to_string(),
            MemNode {
                kind: EntryKind::File,
                data: data.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), FsError> {
        let mut nodes = self.nodes.borrow_mut();
        if nodes.remove(path).is_none() {
            return Err(FsError::NotFound(path.to_string()));
        }
        let prefix = format!("{path}/");
        nodes.retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let nodes = self.nodes.borrow();
        if !path.is_empty() {
            let node = nodes
                .get(path)
                .ok_or_else(|| FsError::NotFound(path.to_string()))?;
            if node.kind != EntryKind::Directory {
                return Err(FsError::NotADirectory(path.to_string()));
            }
        }

        // BTreeMap keys are sorted, so the listing comes out sorted too.
        let entries = nodes
            .iter()
            .filter(|(key, _)| Self::parent(key).unwrap_or("") == path && !key.is_empty())
            .map(|(key, node)| DirEntry {
                name: key.rsplit('/').next().unwrap_or(key).to_string(),
                kind: node.kind,
            })
            .collect();
        Ok(entries)
    }

    fn metadata(&self, path: &str) -> Result<FileMetadata, FsError> {
        let nodes = self.nodes.borrow();
        let node = nodes
            .get(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        Ok(FileMetadata {
            kind: node.kind,
            size: node.data.len() as u64,
            mode: node.mode,
        })
    }

    fn create_dir(&self, path: &str, mode: u8) -> Result<(), FsError> {
        if let Some(existing) = self.nodes.borrow().get(path) {
            return match existing.kind {
                EntryKind::Directory => Ok(()),
                EntryKind::File => Err(FsError::NotADirectory(path.to_string())),
            };
        }
        self.ensure_parents(path, mode);
        self.nodes.borrow_mut().insert(
            path.to_string(),
            MemNode {
                kind: EntryKind::Directory,
                data: Vec::new(),
                mode,
            },
        );
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        path.is_empty() || self.nodes.borrow().contains_key(path)
    }
}
