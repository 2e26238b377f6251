// src/tools/sources.rs

//! Glob expansion for source sets.
//!
//! Patterns are project-relative (`app/styles/**/*.scss`). The directory
//! part before the first glob metacharacter is the *glob base*; outputs keep
//! each file's path relative to it, so `app/fonts/icons/a.woff` copied from
//! `app/fonts/**/*.*` lands in `<dest>/icons/a.woff`.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// One file matched by a source glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (root-joined) path.
    pub path: PathBuf,
    /// Path relative to the glob base.
    pub relative: PathBuf,
}

impl SourceFile {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Sass-style partials (`_mixins.scss`) are only ever imported.
    pub fn is_partial(&self) -> bool {
        self.file_name().is_some_and(|n| n.starts_with('_'))
    }
}

/// Compile a glob so that `*` does not cross directory separators.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern '{pattern}'"))?;
    Ok(glob.compile_matcher())
}

/// Leading directory of `pattern` that contains no glob metacharacters.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let components: Vec<Component<'_>> = Path::new(pattern).components().collect();

    for (idx, comp) in components.iter().enumerate() {
        let is_last = idx + 1 == components.len();
        let text = comp.as_os_str().to_string_lossy();
        if is_last || text.contains(GLOB_META) {
            // A pattern without metacharacters names a file; its base is
            // the parent directory.
            break;
        }
        base.push(comp.as_os_str());
    }

    base
}

/// Expand `pattern` below `root` into a sorted list of files.
///
/// A base directory that does not exist yields an empty list.
pub fn collect_sources(root: &Path, pattern: &str) -> Result<Vec<SourceFile>> {
    let matcher = compile_glob(pattern)?;
    let absolute_pattern = Path::new(pattern).is_absolute();
    let base = glob_base(pattern);
    let base_dir = root.join(&base);

    if !base_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&base_dir).follow_links(true) {
        let entry = entry.with_context(|| format!("walking {}", base_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let candidate = if absolute_pattern {
            path.to_path_buf()
        } else {
            match path.strip_prefix(root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            }
        };

        if !matcher.is_match(&candidate) {
            continue;
        }

        let relative = path
            .strip_prefix(&base_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(entry.file_name()));

        files.push(SourceFile {
            path: path.to_path_buf(),
            relative,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
