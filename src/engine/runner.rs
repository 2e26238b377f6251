// src/engine/runner.rs

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::{ExecutionPlan, Scheduler, TaskRegistry};
use crate::engine::{RunEvent, TaskName, TaskOutcome};
use crate::errors::{AssetflowError, Result};
use crate::exec::{Executor, TaskContext};

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub target: TaskName,
    pub run_id: u64,
    /// Tasks in the order they completed; the target is always last.
    pub completed: Vec<TaskName>,
    pub elapsed: Duration,
}

/// Executes tasks from a registry against one shared [`TaskContext`].
///
/// Each `run` resolves the requested task first, so registry errors are
/// returned before any action starts. Tasks without a dependency path
/// between them are dispatched concurrently.
pub struct TaskRunner {
    registry: Arc<TaskRegistry>,
    ctx: Arc<TaskContext>,
    run_counter: AtomicU64,
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("tasks", &self.registry.len())
            .field("mode", self.ctx.mode())
            .finish_non_exhaustive()
    }
}

impl TaskRunner {
    pub fn new(registry: Arc<TaskRegistry>, ctx: Arc<TaskContext>) -> Self {
        Self {
            registry,
            ctx,
            run_counter: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    /// Resolve without executing (used by `--dry-run` and watch start-up).
    pub fn plan(&self, name: &str) -> Result<ExecutionPlan> {
        self.registry.resolve(name)
    }

    /// Run `name` and its prerequisite closure.
    ///
    /// The first task failure stops dispatch of unstarted tasks; tasks that
    /// are already running are awaited, then the failure is returned as
    /// [`AssetflowError::TaskExecution`].
    pub async fn run(&self, name: &str) -> Result<RunReport> {
        let plan = self.registry.resolve(name)?;
        let run_id = self.run_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let started = Instant::now();

        info!(task = %name, run_id, tasks = ?plan.order(), "starting run");

        let (event_tx, mut event_rx) = mpsc::channel::<RunEvent>(64);
        let executor = Executor::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.ctx),
            event_tx,
        );

        let mut scheduler = Scheduler::new(plan, run_id);
        let mut first_error: Option<(TaskName, anyhow::Error)> = None;

        executor.spawn_ready_tasks(scheduler.start());

        while !scheduler.is_finished() {
            let event = event_rx
                .recv()
                .await
                .ok_or_else(|| anyhow!("executor channel closed during run {run_id}"))?;

            debug!(?event, "runner received event");

            match event {
                RunEvent::TaskCompleted {
                    task,
                    run_id: event_run,
                    outcome,
                } => {
                    if event_run != run_id {
                        debug!(task = %task, event_run, run_id, "ignoring completion from another run");
                        continue;
                    }

                    let success = outcome.is_success();
                    if let TaskOutcome::Failed(err) = outcome {
                        error!(task = %task, run_id, error = %format!("{err:#}"), "task failed");
                        if first_error.is_none() {
                            first_error = Some((task.clone(), err));
                        }
                    } else {
                        info!(task = %task, run_id, "task finished");
                    }

                    let ready = scheduler.handle_completion(&task, success);
                    executor.spawn_ready_tasks(ready);
                }
            }
        }

        if let Some((task, source)) = first_error {
            return Err(AssetflowError::TaskExecution { task, source });
        }

        let elapsed = started.elapsed();
        info!(task = %name, run_id, elapsed_ms = elapsed.as_millis() as u64, "run finished");

        Ok(RunReport {
            target: name.to_string(),
            run_id,
            completed: scheduler.completed().to_vec(),
            elapsed,
        })
    }
}
