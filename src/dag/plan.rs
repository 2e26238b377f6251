// src/dag/plan.rs

use std::collections::HashMap;

use crate::engine::TaskName;

/// The prerequisite closure of one requested task, in dependency order.
///
/// `order` is a post-order of the depth-first traversal: every task appears
/// after all of its prerequisites, and the requested task is last.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    target: TaskName,
    order: Vec<TaskName>,
    prerequisites: HashMap<TaskName, Vec<TaskName>>,
}

impl ExecutionPlan {
    pub(crate) fn new(
        target: TaskName,
        order: Vec<TaskName>,
        prerequisites: HashMap<TaskName, Vec<TaskName>>,
    ) -> Self {
        Self {
            target,
            order,
            prerequisites,
        }
    }

    /// The task that was requested.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// All tasks in the closure, prerequisites first.
    pub fn order(&self) -> &[TaskName] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, task: &str) -> bool {
        self.prerequisites.contains_key(task)
    }

    /// Direct prerequisites of `task` (empty for tasks outside the plan).
    pub fn prerequisites_of(&self, task: &str) -> &[TaskName] {
        self.prerequisites
            .get(task)
            .map(|deps| deps.as_slice())
            .unwrap_or(&[])
    }

    /// Position of `task` in the plan order.
    pub fn position(&self, task: &str) -> Option<usize> {
        self.order.iter().position(|t| t == task)
    }
}
