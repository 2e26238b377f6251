// src/config/loader.rs

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Parse `Assetflow.toml` at `path` without semantic checks.
///
/// Missing sections and keys are filled from the defaults by `serde`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse(&contents)
}

/// Parse and validate the file at `path`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let config = ConfigFile::try_from(load_from_path(path)?)?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Like [`load_and_validate`], but a file that does not exist yields the
/// built-in layout.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => {
            let config = ConfigFile::try_from(parse(&contents)?)?;
            info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using built-in layout");
            ConfigFile::try_from(RawConfigFile::default())
        }
        Err(err) => Err(err.into()),
    }
}

fn parse(contents: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(contents)?)
}
