// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::{BindingConfig, ConfigFile, PathsSection};
use crate::engine::TaskName;

/// Compiled `{patterns → tasks}` mapping for the watch session.
///
/// Patterns are relative to the project root; the watcher hands
/// root-relative, `/`-separated paths to [`WatchBinding::matches`]. A binding
/// without tasks is reload-only.
#[derive(Clone)]
pub struct WatchBinding {
    patterns: Vec<String>,
    tasks: Vec<TaskName>,
    set: GlobSet,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("patterns", &self.patterns)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new<P, T>(patterns: P, tasks: T) -> Result<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<TaskName>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let tasks: Vec<TaskName> = tasks.into_iter().map(Into::into).collect();
        let set = build_globset(&patterns)
            .with_context(|| format!("building watch globset for {}", label_for(&tasks)))?;

        Ok(Self {
            patterns,
            tasks,
            set,
        })
    }

    /// A binding that only triggers a browser reload.
    pub fn reload_only<P>(patterns: P) -> Result<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self::new(patterns, Vec::<TaskName>::new())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    pub fn is_reload_only(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }

    /// Short name used in log fields.
    pub fn label(&self) -> String {
        label_for(&self.tasks)
    }
}

fn label_for(tasks: &[TaskName]) -> String {
    if tasks.is_empty() {
        "reload".to_string()
    } else {
        tasks.join("+")
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Bindings derived from the path configuration:
///
/// | patterns                 | tasks       |
/// |--------------------------|-------------|
/// | styles, sprite sources   | `styles`    |
/// | images                   | `images`    |
/// | templates (all)          | `templates` |
/// | fonts                    | `fonts`     |
/// | `<public root>/**/*`     | reload only |
pub fn default_bindings(paths: &PathsSection) -> Result<Vec<WatchBinding>> {
    let app = &paths.app;
    let public_tree = format!("{}/**/*", paths.public.root.trim_end_matches('/'));

    Ok(vec![
        WatchBinding::new([app.styles.as_str(), app.sprite.as_str()], ["styles"])?,
        WatchBinding::new([app.images.as_str()], ["images"])?,
        WatchBinding::new([app.templates.as_str()], ["templates"])?,
        WatchBinding::new([app.fonts.as_str()], ["fonts"])?,
        WatchBinding::reload_only([public_tree])?,
    ])
}

/// Explicit `[[watch.binding]]` tables when present, otherwise the defaults.
pub fn bindings_from_config(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let explicit = &cfg.watch().binding;
    if explicit.is_empty() {
        return default_bindings(cfg.paths());
    }

    explicit
        .iter()
        .map(|BindingConfig { patterns, tasks }| WatchBinding::new(patterns.clone(), tasks.clone()))
        .collect()
}
