// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`action`] defines the `TaskAction` contract every task implements:
//!   given the shared context, return a boxed future that completes with
//!   success or an error.
//! - [`context`] holds the immutable per-process inputs handed to actions
//!   (run mode, minify policy, paths, tool commands).
//! - [`executor`] spawns ready actions on Tokio and reports completions back
//!   to the runner as `RunEvent`s.

pub mod action;
pub mod context;
pub mod executor;

pub use action::{ActionFuture, FnAction, NoopAction, TaskAction, action_fn};
pub use context::TaskContext;
pub use executor::Executor;
