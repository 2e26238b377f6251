// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::plan::ExecutionPlan;
use crate::engine::TaskName;

/// Per-run state of a task in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// Waiting on prerequisites.
    Pending,
    /// Dispatched to the executor.
    Running,
    Succeeded,
    Failed,
    /// Never started because an earlier task failed.
    Skipped,
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    /// All tasks dispatched for the same `run(...)` call share this id.
    pub run_id: u64,
}

/// Pure state machine driving one run of an [`ExecutionPlan`].
///
/// It is responsible for:
/// - deciding when a task is ready (all prerequisites succeeded)
/// - recording completions in the order they arrive
/// - stopping dispatch after the first failure (pending tasks are skipped,
///   running ones are allowed to finish)
///
/// It performs no IO; the async shell lives in `engine::runner`.
#[derive(Debug)]
pub struct Scheduler {
    plan: ExecutionPlan,
    run_id: u64,
    states: HashMap<TaskName, TaskRunState>,
    completed: Vec<TaskName>,
    first_failure: Option<TaskName>,
}

impl Scheduler {
    pub fn new(plan: ExecutionPlan, run_id: u64) -> Self {
        let states = plan
            .order()
            .iter()
            .map(|name| (name.clone(), TaskRunState::Pending))
            .collect();

        Self {
            plan,
            run_id,
            states,
            completed: Vec::new(),
            first_failure: None,
        }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Tasks ready at the start of the run (those without prerequisites).
    pub fn start(&mut self) -> Vec<ScheduledTask> {
        debug!(run_id = self.run_id, task = %self.plan.target(), "scheduler: starting run");
        self.collect_new_ready_tasks()
    }

    /// Record the outcome of a running task and return newly ready tasks.
    pub fn handle_completion(&mut self, task: &str, success: bool) -> Vec<ScheduledTask> {
        match self.states.get(task).copied() {
            Some(TaskRunState::Running) => {}
            Some(state) => {
                warn!(task = %task, ?state, "completion for task that is not running; ignoring");
                return Vec::new();
            }
            None => {
                warn!(task = %task, "completion for task outside the plan; ignoring");
                return Vec::new();
            }
        }

        self.completed.push(task.to_string());

        if success {
            self.states.insert(task.to_string(), TaskRunState::Succeeded);
            debug!(task = %task, run_id = self.run_id, "task succeeded");
            if self.first_failure.is_some() {
                return Vec::new();
            }
            return self.collect_new_ready_tasks();
        }

        self.states.insert(task.to_string(), TaskRunState::Failed);
        if self.first_failure.is_none() {
            self.first_failure = Some(task.to_string());
            self.skip_pending();
        }
        Vec::new()
    }

    /// True when nothing is running and nothing more will be dispatched.
    pub fn is_finished(&self) -> bool {
        let running = self.count(TaskRunState::Running);
        let pending = self.count(TaskRunState::Pending);
        running == 0 && (pending == 0 || self.first_failure.is_some())
    }

    /// Read-only view of a task's state in this run.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        self.states.get(task).copied()
    }

    /// Tasks in the order their completion was recorded.
    pub fn completed(&self) -> &[TaskName] {
        &self.completed
    }

    /// The first task that failed, if any.
    pub fn first_failure(&self) -> Option<&str> {
        self.first_failure.as_deref()
    }

    fn count(&self, state: TaskRunState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    fn skip_pending(&mut self) {
        let mut skipped = Vec::new();
        for (name, state) in self.states.iter_mut() {
            if *state == TaskRunState::Pending {
                *state = TaskRunState::Skipped;
                skipped.push(name.clone());
            }
        }
        if !skipped.is_empty() {
            skipped.sort();
            info!(run_id = self.run_id, ?skipped, "skipping tasks after failure");
        }
    }

    /// Mark every pending task whose prerequisites all succeeded as
    /// `Running`, in plan order.
    fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let ready: Vec<TaskName> = self
            .plan
            .order()
            .iter()
            .filter(|name| self.states.get(*name) == Some(&TaskRunState::Pending))
            .filter(|name| {
                self.plan
                    .prerequisites_of(name)
                    .iter()
                    .all(|dep| self.states.get(dep) == Some(&TaskRunState::Succeeded))
            })
            .cloned()
            .collect();

        ready
            .into_iter()
            .map(|name| {
                debug!(task = %name, run_id = self.run_id, "prerequisites satisfied; marking Running");
                self.states.insert(name.clone(), TaskRunState::Running);
                ScheduledTask {
                    name,
                    run_id: self.run_id,
                }
            })
            .collect()
    }
}
