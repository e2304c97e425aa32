//! Storage module for persisting crawl output
//!
//! This module handles everything the crawler writes to disk:
//! - Durable per-kind cursors (`CursorStore`)
//! - Fetched documents and mirrored assets (`ArtifactStore`)
//! - Append-only page artifacts produced by sub-resource pagination

mod cursor;
mod fs;
mod traits;

pub use cursor::{CursorStore, DEFAULT_POSITION};
pub use fs::FsStorage;
pub use traits::{ArtifactStore, StorageError, StorageResult};

use crate::state::SubresourceKind;
use std::path::{Path, PathBuf};

/// File name used when a feed answers with its "empty page" marker
pub const EMPTY_PAGE_FILE: &str = "empty.html";

/// How a page artifact is named on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageName {
    /// A regular page, named by the feed's naming function
    Numbered(String),

    /// The feed's explicit empty page
    Empty,
}

/// One persisted page of a sub-resource
///
/// Written once per page number and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PageArtifact {
    pub parent_id: u64,
    pub kind: SubresourceKind,
    pub page_number: u32,
    pub name: PageName,
    pub raw_content: String,
}

impl PageArtifact {
    pub fn file_name(&self) -> &str {
        match &self.name {
            PageName::Numbered(name) => name,
            PageName::Empty => EMPTY_PAGE_FILE,
        }
    }

    /// Writes the artifact into `dir`, returning the path written
    pub fn persist(&self, store: &dyn ArtifactStore, dir: &Path) -> StorageResult<PathBuf> {
        let path = dir.join(self.file_name());
        store.write_file(&path, self.raw_content.as_bytes())?;
        Ok(path)
    }
}
