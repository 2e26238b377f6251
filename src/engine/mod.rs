// src/engine/mod.rs

//! Task runner.
//!
//! [`TaskRunner::run`] resolves a task's prerequisite closure, then drives a
//! [`Scheduler`](crate::dag::Scheduler) from completion events sent back by
//! the [`Executor`](crate::exec::Executor). The scheduler holds all run
//! semantics; the runner only moves events between it and the executor.

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of one task action.
#[derive(Debug)]
pub enum TaskOutcome {
    Success,
    Failed(anyhow::Error),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Events flowing from the executor into the runner.
#[derive(Debug)]
pub enum RunEvent {
    /// A task action finished.
    TaskCompleted {
        task: TaskName,
        run_id: u64,
        outcome: TaskOutcome,
    },
}

pub mod runner;

pub use runner::{RunReport, TaskRunner};
