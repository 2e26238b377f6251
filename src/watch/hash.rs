// src/watch/hash.rs

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<blake3::Hash> {
    let file = File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut hasher = Hasher::new();
    hasher
        .update_reader(file)
        .with_context(|| format!("hashing {:?}", path))?;
    Ok(hasher.finalize())
}

/// Drops change events for files whose content did not actually change.
///
/// Editors often touch, truncate and rewrite a file in one save; only the
/// first event carrying new content gets through. Hashes live in memory for
/// the watch session.
#[derive(Debug, Default)]
pub struct ContentGate {
    seen: HashMap<PathBuf, blake3::Hash>,
}

impl ContentGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the change at `path` should be forwarded.
    ///
    /// Removed or unreadable files always pass and are forgotten, so a file
    /// recreated with its old content is still reported.
    pub fn should_forward(&mut self, path: &Path) -> bool {
        if !path.is_file() {
            self.seen.remove(path);
            return true;
        }

        let hash = match compute_file_hash(path) {
            Ok(hash) => hash,
            Err(err) => {
                debug!("could not hash {:?}: {err:#}", path);
                self.seen.remove(path);
                return true;
            }
        };

        match self.seen.insert(path.to_path_buf(), hash) {
            Some(previous) if previous == hash => {
                debug!("content unchanged for {:?}, dropping event", path);
                false
            }
            _ => true,
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
