// src/dag/registry.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dag::graph::DagGraph;
use crate::dag::plan::ExecutionPlan;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};
use crate::exec::TaskAction;

/// One registered task: its action and its ordered prerequisites.
#[derive(Clone)]
pub struct TaskDef {
    name: TaskName,
    prerequisites: Vec<TaskName>,
    action: Arc<dyn TaskAction>,
}

impl TaskDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prerequisites(&self) -> &[TaskName] {
        &self.prerequisites
    }

    pub fn action(&self) -> Arc<dyn TaskAction> {
        Arc::clone(&self.action)
    }
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDef")
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .field("action", &self.action.describe())
            .finish()
    }
}

/// Visitation tag used by the depth-first resolver. Absent means unvisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Mapping from task name to definition.
///
/// Names are kept in a `BTreeMap` so iteration (validation, dry-run output)
/// is deterministic.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskDef>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task definition.
    ///
    /// Prerequisites are not checked here; unknown names and cycles surface
    /// from [`TaskRegistry::resolve`] / [`TaskRegistry::validate`].
    pub fn register<N, I, P>(&mut self, name: N, prerequisites: I, action: Arc<dyn TaskAction>) -> Result<()>
    where
        N: Into<TaskName>,
        I: IntoIterator<Item = P>,
        P: Into<TaskName>,
    {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(AssetflowError::DuplicateTask(name));
        }

        let prerequisites: Vec<TaskName> = prerequisites.into_iter().map(Into::into).collect();
        debug!(task = %name, ?prerequisites, "registering task");

        self.tasks.insert(
            name.clone(),
            TaskDef {
                name,
                prerequisites,
                action,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Registered task names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskDef> {
        self.tasks.values()
    }

    /// Graph view of the whole registry.
    pub fn graph(&self) -> DagGraph {
        DagGraph::from_registry(self)
    }

    /// Resolve the transitive prerequisite closure of `name`.
    ///
    /// Fails with `UnknownTask` if `name` or any prerequisite reachable from
    /// it is not registered, and with `CyclicDependency` if a task is
    /// reachable from itself.
    pub fn resolve(&self, name: &str) -> Result<ExecutionPlan> {
        let mut marks: HashMap<&str, Visit> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();
        let mut order: Vec<TaskName> = Vec::new();

        self.visit(name, None, &mut marks, &mut path, &mut order)?;

        let prerequisites = order
            .iter()
            .map(|task| {
                let deps = self
                    .tasks
                    .get(task)
                    .map(|def| def.prerequisites.clone())
                    .unwrap_or_default();
                (task.clone(), deps)
            })
            .collect();

        debug!(task = %name, ?order, "resolved execution plan");
        Ok(ExecutionPlan::new(name.to_string(), order, prerequisites))
    }

    /// Check the whole registry: every prerequisite exists and the graph is
    /// acyclic.
    pub fn validate(&self) -> Result<()> {
        let mut marks: HashMap<&str, Visit> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();
        let mut order: Vec<TaskName> = Vec::new();

        for name in self.tasks.keys() {
            self.visit(name, None, &mut marks, &mut path, &mut order)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        parent: Option<&'a str>,
        marks: &mut HashMap<&'a str, Visit>,
        path: &mut Vec<&'a str>,
        order: &mut Vec<TaskName>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<TaskName> =
                    path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return Err(AssetflowError::CyclicDependency { cycle });
            }
            None => {}
        }

        let def = self
            .tasks
            .get(name)
            .ok_or_else(|| AssetflowError::UnknownTask {
                name: name.to_string(),
                referenced_by: parent.map(str::to_string),
            })?;

        marks.insert(name, Visit::InProgress);
        path.push(name);

        for dep in &def.prerequisites {
            self.visit(dep, Some(name), marks, path, order)?;
        }

        path.pop();
        marks.insert(name, Visit::Done);
        order.push(name.to_string());
        Ok(())
    }
}
