// src/exec/action.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::exec::context::TaskContext;

/// Future returned by every task action.
pub type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// The work a task performs once its prerequisites are done.
///
/// Implementations receive the shared, immutable [`TaskContext`] and return
/// a `'static` future so the executor can spawn it. Built-in actions live in
/// [`crate::tasks`]; tests usually register closures via [`action_fn`].
pub trait TaskAction: Send + Sync {
    fn run(&self, ctx: Arc<TaskContext>) -> ActionFuture;

    /// Short description for logs and dry-run output.
    fn describe(&self) -> String {
        "action".to_string()
    }
}

/// Action of composite tasks such as `default`: all work happens in the
/// prerequisites.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAction;

impl TaskAction for NoopAction {
    fn run(&self, _ctx: Arc<TaskContext>) -> ActionFuture {
        Box::pin(async { Ok(()) })
    }

    fn describe(&self) -> String {
        "group".to_string()
    }
}

/// Adapter turning an async closure into a [`TaskAction`].
pub struct FnAction<F> {
    label: String,
    f: F,
}

impl<F> fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").field("label", &self.label).finish()
    }
}

impl<F, Fut> TaskAction for FnAction<F>
where
    F: Fn(Arc<TaskContext>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn run(&self, ctx: Arc<TaskContext>) -> ActionFuture {
        Box::pin((self.f)(ctx))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Wrap an async closure as a shareable action.
pub fn action_fn<F, Fut>(label: impl Into<String>, f: F) -> Arc<dyn TaskAction>
where
    F: Fn(Arc<TaskContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnAction {
        label: label.into(),
        f,
    })
}
