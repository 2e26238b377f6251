#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use assetflow::config::{BindingConfig, ConfigFile, RawConfigFile};
use assetflow::dag::TaskRegistry;
use assetflow::engine::TaskRunner;
use assetflow::exec::TaskContext;
use assetflow::types::RunMode;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults; tool commands are usually swapped for
/// coreutils (`cat`, `tr`) so pipelines can run without the real tools.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Tool commands that only need a POSIX shell: Sass is `cat`, the
    /// post-processor is disabled and the minifier strips newlines.
    pub fn with_shell_tools(mut self) -> Self {
        self.config.tools.sass = "cat {input}".to_string();
        self.config.tools.postprocess = String::new();
        self.config.tools.minify_css = "tr -d '\\n'".to_string();
        self
    }

    pub fn with_sass(mut self, cmd: &str) -> Self {
        self.config.tools.sass = cmd.to_string();
        self
    }

    pub fn with_postprocess(mut self, cmd: &str) -> Self {
        self.config.tools.postprocess = cmd.to_string();
        self
    }

    pub fn with_minifier(mut self, cmd: &str) -> Self {
        self.config.tools.minify_css = cmd.to_string();
        self
    }

    pub fn with_sprite_tool(mut self, cmd: &str) -> Self {
        self.config.tools.sprite = cmd.to_string();
        self
    }

    pub fn with_template_tool(mut self, cmd: &str) -> Self {
        self.config.tools.templates = cmd.to_string();
        self
    }

    pub fn with_vendor_css(mut self, files: &[&str]) -> Self {
        self.config.vendor.css = files.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_binding(mut self, patterns: &[&str], tasks: &[&str]) -> Self {
        self.config.watch.binding.push(BindingConfig {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared context rooted at `root`.
pub fn test_context(root: &Path, mode: RunMode, config: ConfigFile) -> Arc<TaskContext> {
    Arc::new(TaskContext::new(root, mode, config))
}

/// Runner over `registry` with default configuration in production mode.
pub fn runner_for(registry: TaskRegistry) -> TaskRunner {
    let ctx = test_context(Path::new("."), RunMode::Production, ConfigFile::default());
    TaskRunner::new(Arc::new(registry), ctx)
}
