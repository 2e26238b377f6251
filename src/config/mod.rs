// src/config/mod.rs

//! Configuration loading and validation for assetflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`), whose defaults are the
//!   project layout the tool was built for.
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate globs, ports and watch bindings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    AppPaths, BindingConfig, ConfigFile, PathsSection, PublicPaths, RawConfigFile, ServerSection,
    ToolsSection, VendorSection, WatchSection,
};
