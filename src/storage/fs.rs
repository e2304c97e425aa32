//! Local filesystem artifact store

use crate::storage::traits::{ArtifactStore, StorageError, StorageResult};
use std::path::Path;

/// Stores artifacts directly on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStore for FsStorage {
    fn ensure_dir(&self, path: &Path) -> StorageResult<()> {
        std::fs::create_dir_all(path).map_err(|source| StorageError::Unwritable {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }

        std::fs::write(path, contents).map_err(|source| StorageError::Unwritable {
            path: path.to_path_buf(),
            source,
        })
    }

    fn has_content(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> StorageResult<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}
