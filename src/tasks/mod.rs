// src/tasks/mod.rs

//! Built-in asset tasks and the registry that wires them together.
//!
//! ```text
//! fonts  images  vendor-fonts  vendor-css  templates   sprite
//!   \      |          |            |           |          |
//!    \     |          |            |           |       styles
//!     \    |          |            |           |       /
//!      +---+----------+------------+-----------+------+
//!                           default
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result as AnyResult};
use tracing::debug;

use crate::dag::TaskRegistry;
use crate::errors::Result;
use crate::exec::NoopAction;

pub mod copy;
pub mod sprite;
pub mod styles;
pub mod templates;

pub use copy::{CopyAction, CopyRole};
pub use sprite::SpriteAction;
pub use styles::{StylesAction, VendorCssAction};
pub use templates::TemplatesAction;

/// Task run when the CLI names none.
pub const DEFAULT_TASK: &str = "default";

const NO_PREREQUISITES: [&str; 0] = [];

/// Register every built-in task and validate the resulting graph.
///
/// Any registry error aborts here, before a single action has run.
pub fn builtin_registry() -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();

    registry.register("fonts", NO_PREREQUISITES, Arc::new(CopyAction::new(CopyRole::Fonts)))?;
    registry.register("images", NO_PREREQUISITES, Arc::new(CopyAction::new(CopyRole::Images)))?;
    registry.register(
        "vendor-fonts",
        NO_PREREQUISITES,
        Arc::new(CopyAction::new(CopyRole::VendorFonts)),
    )?;
    registry.register("vendor-css", NO_PREREQUISITES, Arc::new(VendorCssAction))?;
    registry.register("sprite", NO_PREREQUISITES, Arc::new(SpriteAction))?;
    registry.register("templates", NO_PREREQUISITES, Arc::new(TemplatesAction))?;
    registry.register("styles", ["sprite"], Arc::new(StylesAction))?;
    registry.register(
        DEFAULT_TASK,
        ["styles", "fonts", "images", "templates", "vendor-css", "vendor-fonts"],
        Arc::new(NoopAction),
    )?;

    registry.validate()?;
    Ok(registry)
}

/// Write `bytes` to `path`, creating parent directories.
pub(crate) async fn write_output(path: &Path, bytes: &[u8]) -> AnyResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

/// Like [`write_output`], but leaves the file untouched when its content is
/// already `bytes`. Used for outputs that live inside watched source trees.
pub(crate) async fn write_if_changed(path: &Path, bytes: &[u8]) -> AnyResult<bool> {
    match tokio::fs::read(path).await {
        Ok(existing) if existing == bytes => {
            debug!(path = %path.display(), "output unchanged");
            Ok(false)
        }
        _ => {
            write_output(path, bytes).await?;
            Ok(true)
        }
    }
}
