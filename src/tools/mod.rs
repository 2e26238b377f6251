// src/tools/mod.rs

//! Transformation collaborators.
//!
//! - [`command`]: external tools (Sass, post-processor, minifier, sprite
//!   packer, template renderer) run through the platform shell.
//! - [`placeholder`]: expansion of `{input}`-style placeholders in tool
//!   command templates, with shell quoting.
//! - [`sources`]: glob expansion of source sets, relative to the glob base.
//! - [`copy`]: native file copier.

pub mod command;
pub mod copy;
pub mod placeholder;
pub mod sources;

pub use command::ExternalTool;
pub use copy::copy_sources;
pub use placeholder::{ToolVars, VarValue, expand};
pub use sources::{SourceFile, collect_sources, glob_base};
