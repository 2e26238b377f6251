// src/tools/copy.rs

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::tools::sources::SourceFile;

/// Copy every source into `dest`, preserving its path relative to the glob
/// base. Returns the number of files written.
pub async fn copy_sources(sources: &[SourceFile], dest: &Path) -> Result<usize> {
    for source in sources {
        let target = dest.join(&source.relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::copy(&source.path, &target)
            .await
            .with_context(|| format!("copying {} to {}", source.path.display(), target.display()))?;
        debug!(from = %source.path.display(), to = %target.display(), "copied");
    }
    Ok(sources.len())
}
