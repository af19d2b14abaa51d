//! # In-Memory Title Registry
//!
//! Title-metadata service backed by a plain set of installed titles. The
//! `auto_import` switch models a host that can resolve unknown titles on
//! demand (e.g. by installing a ticket alongside the save).

use crate::domain::entry::TitleId;
use crate::ports::TitleRegistry;
use std::collections::BTreeSet;

/// Set-backed title registry.
#[derive(Default)]
pub struct MemoryTitleRegistry {
    titles: BTreeSet<TitleId>,
    auto_import: bool,
}

impl MemoryTitleRegistry {
    /// Empty registry that rejects unknown titles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-seeded with installed titles.
    pub fn with_titles(titles: impl IntoIterator<Item = TitleId>) -> Self {
        Self {
            titles: titles.into_iter().collect(),
            auto_import: false,
        }
    }

    /// Resolve unknown titles by installing them on first sight.
    pub fn auto_importing(mut self) -> Self {
        self.auto_import = true;
        self
    }
}

impl TitleRegistry for MemoryTitleRegistry {
    fn ensure_title_imported(&mut self, title_id: TitleId) -> bool {
        if self.titles.contains(&title_id) {
            return true;
        }
        if self.auto_import {
            self.titles.insert(title_id);
            return true;
        }
        false
    }

    fn installed_titles(&self) -> Vec<TitleId> {
        self.titles.iter().copied().collect()
    }
}
