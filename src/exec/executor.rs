// src/exec/executor.rs

//! Spawns task actions and reports their completion.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{ScheduledTask, TaskRegistry};
use crate::engine::{RunEvent, TaskOutcome};
use crate::exec::context::TaskContext;

/// Runs scheduled tasks, one Tokio task per action.
///
/// Every dispatched task produces exactly one `RunEvent::TaskCompleted`, even
/// if its action panics, so the runner never waits on a task that is gone.
#[derive(Clone)]
pub struct Executor {
    registry: Arc<TaskRegistry>,
    ctx: Arc<TaskContext>,
    events_tx: mpsc::Sender<RunEvent>,
}

impl Executor {
    pub fn new(
        registry: Arc<TaskRegistry>,
        ctx: Arc<TaskContext>,
        events_tx: mpsc::Sender<RunEvent>,
    ) -> Self {
        Self {
            registry,
            ctx,
            events_tx,
        }
    }

    pub fn spawn_ready_tasks(&self, tasks: Vec<ScheduledTask>) {
        for task in tasks {
            self.spawn_task(task);
        }
    }

    fn spawn_task(&self, task: ScheduledTask) {
        let events_tx = self.events_tx.clone();

        let Some(def) = self.registry.get(&task.name) else {
            // Plans are resolved from this registry, so this is a bug upstream.
            warn!(task = %task.name, "scheduled task is not registered");
            tokio::spawn(async move {
                let _ = events_tx
                    .send(RunEvent::TaskCompleted {
                        outcome: TaskOutcome::Failed(anyhow!("task '{}' is not registered", task.name)),
                        task: task.name,
                        run_id: task.run_id,
                    })
                    .await;
            });
            return;
        };

        let action = def.action();
        let ctx = Arc::clone(&self.ctx);

        info!(task = %task.name, run_id = task.run_id, action = %action.describe(), "starting task");

        tokio::spawn(async move {
            let handle = tokio::spawn(action.run(ctx));

            let outcome = match handle.await {
                Ok(Ok(())) => TaskOutcome::Success,
                Ok(Err(err)) => TaskOutcome::Failed(err),
                Err(join_err) => TaskOutcome::Failed(anyhow!("task action panicked: {join_err}")),
            };

            debug!(task = %task.name, run_id = task.run_id, success = outcome.is_success(), "task action finished");

            if let Err(err) = events_tx
                .send(RunEvent::TaskCompleted {
                    task: task.name,
                    run_id: task.run_id,
                    outcome,
                })
                .await
            {
                warn!("failed to report task completion: {err}");
            }
        });
    }
}
