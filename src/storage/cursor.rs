//! Durable per-kind progress cursors
//!
//! Each resource kind has one plain-text file holding the next ID to process.
//! A missing file is created with the default position 1.

use crate::state::ResourceKind;
use crate::storage::traits::{StorageError, StorageResult};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Position every cursor starts from
pub const DEFAULT_POSITION: u64 = 1;

/// Owns the cursor files for every resource kind
///
/// The in-memory position is only updated after the new value has been
/// written and synced, so a crash never loses acknowledged progress.
#[derive(Debug)]
pub struct CursorStore {
    dir: PathBuf,
    positions: HashMap<ResourceKind, u64>,
}

impl CursorStore {
    /// Opens the cursor directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Unwritable {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            positions: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, kind: ResourceKind) -> PathBuf {
        self.dir.join(kind.cursor_file())
    }

    /// Returns the last known position for `kind`
    ///
    /// Creates the cursor file with the default position if none exists.
    pub fn get(&mut self, kind: ResourceKind) -> StorageResult<u64> {
        if let Some(position) = self.positions.get(&kind) {
            return Ok(*position);
        }

        let path = self.path_for(kind);
        let position = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|p| *p >= DEFAULT_POSITION)
                .ok_or_else(|| StorageError::CorruptCursor {
                    path: path.clone(),
                    content: content.clone(),
                })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                persist(&path, DEFAULT_POSITION)?;
                DEFAULT_POSITION
            }
            Err(e) => return Err(e.into()),
        };

        self.positions.insert(kind, position);
        Ok(position)
    }

    /// Persists a new position for `kind` before returning
    ///
    /// Positions never move backwards.
    pub fn set(&mut self, kind: ResourceKind, position: u64) -> StorageResult<()> {
        let current = self.get(kind)?;
        if position < current {
            return Err(StorageError::CursorRegression {
                kind: kind.to_string(),
                current,
                requested: position,
            });
        }

        persist(&self.path_for(kind), position)?;
        self.positions.insert(kind, position);

        tracing::debug!("Cursor for {} persisted at {}", kind, position);
        Ok(())
    }
}

/// Writes through a sibling temp file and renames it into place
fn persist(path: &Path, position: u64) -> StorageResult<()> {
    let tmp = path.with_extension("tmp");
    let unwritable = |source| StorageError::Unwritable {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::create(&tmp).map_err(unwritable)?;
    file.write_all(position.to_string().as_bytes())
        .map_err(unwritable)?;
    file.sync_all().map_err(unwritable)?;
    drop(file);

    std::fs::rename(&tmp, path).map_err(unwritable)?;
    Ok(())
}
