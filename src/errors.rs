// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Registry errors (`DuplicateTask`, `UnknownTask`, `CyclicDependency`) are
//! raised before anything executes. `TaskExecution` wraps whatever a
//! collaborator reported, together with the task that owned it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("unknown task '{name}'{}", referenced_by_suffix(.referenced_by))]
    UnknownTask {
        name: String,
        /// Task whose prerequisite list mentioned `name`, if any.
        referenced_by: Option<String>,
    },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Task names along the cycle; first and last entries are equal.
        cycle: Vec<String>,
    },

    #[error("task '{task}' failed")]
    TaskExecution {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn referenced_by_suffix(referenced_by: &Option<String>) -> String {
    match referenced_by {
        Some(parent) => format!(" (prerequisite of '{parent}')"),
        None => String::new(),
    }
}

impl AssetflowError {
    /// Name of the task that failed, for `TaskExecution` errors.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            AssetflowError::TaskExecution { task, .. } => Some(task),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
