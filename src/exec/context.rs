// src/exec/context.rs

use std::path::{Path, PathBuf};

use crate::config::{ConfigFile, PathsSection, ToolsSection, VendorSection};
use crate::types::{MinifyPolicy, RunMode};

/// Immutable inputs shared by every task action of the process.
///
/// Built once at startup and passed into each action, so no task reads the
/// run mode or configuration from ambient state.
#[derive(Debug, Clone)]
pub struct TaskContext {
    root: PathBuf,
    mode: RunMode,
    config: ConfigFile,
}

impl TaskContext {
    /// `root` is the project directory all configured paths are relative to.
    pub fn new(root: impl Into<PathBuf>, mode: RunMode, config: ConfigFile) -> Self {
        Self {
            root: root.into(),
            mode,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> &RunMode {
        &self.mode
    }

    pub fn policy(&self) -> MinifyPolicy {
        self.mode.minify_policy()
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn paths(&self) -> &PathsSection {
        self.config.paths()
    }

    pub fn vendor(&self) -> &VendorSection {
        self.config.vendor()
    }

    pub fn tools(&self) -> &ToolsSection {
        self.config.tools()
    }

    /// Resolve a configured (project-relative) path against the root.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        let rel = rel.as_ref();
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }
}
