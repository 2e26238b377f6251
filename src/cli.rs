// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Name of the pseudo-task that starts watch mode without an initial build.
pub const WATCH_TASK: &str = "watch";

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Build static-site assets from a task graph, optionally watching for changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run. `watch` starts watch mode without building first.
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Run mode override (production, development, testing, ...).
    ///
    /// If omitted, `ASSETFLOW_ENV` or `production` is used.
    #[arg(long, value_name = "ENV")]
    pub env: Option<String>,

    /// After the task finishes, keep watching sources and serve the
    /// public root with live reload.
    #[arg(long)]
    pub watch: bool,

    /// Path to the config file (TOML). Missing file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Assetflow.toml")]
    pub config: String,

    /// Dev-server port, overriding `[server].port`.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the execution plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Whether the watch session should start after (or instead of) the build.
    pub fn watch_requested(&self) -> bool {
        self.watch || self.task == WATCH_TASK
    }

    /// Task to build before watching, if any.
    pub fn build_task(&self) -> Option<&str> {
        if self.task == WATCH_TASK {
            None
        } else {
            Some(&self.task)
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
