// src/dag/mod.rs

//! Task graph: registration, resolution and per-run scheduling.
//!
//! - [`registry`] owns task definitions and resolves a requested task into
//!   an [`ExecutionPlan`] (depth-first, with cycle and unknown-name checks).
//! - [`graph`] is a `petgraph` view of the registry used for whole-graph
//!   diagnostics (dependents, roots, dry-run output).
//! - [`scheduler`] is the per-run state machine that decides which tasks of
//!   a plan are ready, and stops dispatching after the first failure.

pub mod graph;
pub mod plan;
pub mod registry;
pub mod scheduler;

pub use graph::DagGraph;
pub use plan::ExecutionPlan;
pub use registry::{TaskDef, TaskRegistry};
pub use scheduler::{ScheduledTask, Scheduler, TaskRunState};
