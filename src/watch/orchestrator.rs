// src/watch/orchestrator.rs

//! Turns root-relative change paths into debounced rebuilds and reloads.
//!
//! The orchestrator owns the [`Debouncer`] and is the only place that reads
//! the clock. Rebuilds run in spawned Tokio tasks and report back over a
//! channel, so events keep being coalesced while a rebuild is in flight.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info};

use crate::engine::TaskRunner;
use crate::watch::debounce::Debouncer;
use crate::watch::patterns::WatchBinding;

/// Future returned by [`Rebuilder::rebuild`].
pub type RebuildFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Re-runs one task on behalf of the watch session.
pub trait Rebuilder: Send + Sync + 'static {
    fn rebuild<'a>(&'a self, task: &'a str) -> RebuildFuture<'a>;
}

impl Rebuilder for TaskRunner {
    fn rebuild<'a>(&'a self, task: &'a str) -> RebuildFuture<'a> {
        Box::pin(async move {
            self.run(task).await?;
            Ok(())
        })
    }
}

/// Tells connected browsers to reload.
pub trait ReloadNotifier: Send + Sync + 'static {
    fn notify_reload(&self, reason: &str);
}

/// Completion report of one binding's rebuild.
#[derive(Debug)]
struct RebuildDone {
    binding: usize,
    success: bool,
}

pub struct WatchOrchestrator<R, N> {
    bindings: Vec<WatchBinding>,
    rebuilder: Arc<R>,
    notifier: Arc<N>,
    window: Duration,
}

impl<R, N> std::fmt::Debug for WatchOrchestrator<R, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchOrchestrator")
            .field("bindings", &self.bindings)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl<R: Rebuilder, N: ReloadNotifier> WatchOrchestrator<R, N> {
    pub fn new(bindings: Vec<WatchBinding>, rebuilder: Arc<R>, notifier: Arc<N>, window: Duration) -> Self {
        Self {
            bindings,
            rebuilder,
            notifier,
            window,
        }
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    /// Consume change paths until `changes` is closed and every pending
    /// rebuild has finished.
    ///
    /// In a live session the sender is held by the watcher for the whole
    /// process, so this only returns on shutdown.
    pub async fn run(self, mut changes: mpsc::Receiver<String>) -> Result<()> {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<RebuildDone>();
        let mut debouncer = Debouncer::new(self.window, self.bindings.len());
        let mut suppress_until: Option<Instant> = None;
        let mut changes_open = true;

        info!(bindings = self.bindings.len(), window_ms = self.window.as_millis() as u64, "watch session started");

        loop {
            if !changes_open && debouncer.is_quiescent() {
                break;
            }

            let deadline = debouncer.next_deadline();
            let sleep_target = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                maybe_path = changes.recv(), if changes_open => match maybe_path {
                    Some(path) => self.on_change(&path, &mut debouncer, suppress_until),
                    None => {
                        debug!("change stream closed");
                        changes_open = false;
                    }
                },

                Some(done) = done_rx.recv() => {
                    let binding = &self.bindings[done.binding];
                    self.notifier.notify_reload(&binding.label());
                    info!(binding = %binding.label(), success = done.success, "rebuild finished, reload sent");

                    let now = Instant::now();
                    suppress_until = Some(now + self.window);
                    debouncer.on_run_finished(done.binding, now);
                }

                _ = sleep_until(sleep_target), if deadline.is_some() => {
                    let now = Instant::now();
                    for idx in debouncer.take_due(now) {
                        self.fire(idx, &mut debouncer, now, &done_tx);
                    }
                }
            }
        }

        info!("watch session finished");
        Ok(())
    }

    fn on_change(&self, path: &str, debouncer: &mut Debouncer, suppress_until: Option<Instant>) {
        let now = Instant::now();
        let rebuilding = self
            .bindings
            .iter()
            .enumerate()
            .any(|(idx, b)| !b.is_reload_only() && debouncer.is_running(idx));
        let suppressed = rebuilding || suppress_until.is_some_and(|until| now < until);

        for (idx, binding) in self.bindings.iter().enumerate() {
            if !binding.matches(path) {
                continue;
            }
            if binding.is_reload_only() && suppressed {
                debug!(path, "absorbing rebuild output change");
                continue;
            }
            debug!(path, binding = %binding.label(), "change matched binding");
            debouncer.on_event(idx, now);
        }
    }

    fn fire(&self, idx: usize, debouncer: &mut Debouncer, now: Instant, done_tx: &mpsc::UnboundedSender<RebuildDone>) {
        let binding = &self.bindings[idx];

        if binding.is_reload_only() {
            info!(binding = %binding.label(), "change in served files, reloading");
            self.notifier.notify_reload(&binding.label());
            debouncer.on_run_finished(idx, now);
            return;
        }

        info!(binding = %binding.label(), tasks = ?binding.tasks(), "rebuilding");

        let rebuilder = Arc::clone(&self.rebuilder);
        let tasks = binding.tasks().to_vec();
        let done_tx = done_tx.clone();

        tokio::spawn(async move {
            let mut success = true;
            for task in &tasks {
                if let Err(err) = rebuilder.rebuild(task).await {
                    success = false;
                    error!(task = %task, "rebuild failed: {err:#}");
                }
            }
            let _ = done_tx.send(RebuildDone { binding: idx, success });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        runs: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Rebuilder for Recorder {
        fn rebuild<'a>(&'a self, task: &'a str) -> RebuildFuture<'a> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                self.runs.lock().unwrap().push(task.to_string());
                if self.fail {
                    anyhow::bail!("boom");
                }
                Ok(())
            })
        }
    }

    #[derive(Default)]
    struct Reloads(AtomicUsize);

    impl ReloadNotifier for Reloads {
        fn notify_reload(&self, _reason: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn orchestrator(
        bindings: Vec<WatchBinding>,
        fail: bool,
    ) -> (WatchOrchestrator<Recorder, Reloads>, Arc<Recorder>, Arc<Reloads>) {
        let rebuilder = Arc::new(Recorder {
            fail,
            ..Default::default()
        });
        let reloads = Arc::new(Reloads::default());
        let orch = WatchOrchestrator::new(
            bindings,
            Arc::clone(&rebuilder),
            Arc::clone(&reloads),
            Duration::from_millis(200),
        );
        (orch, rebuilder, reloads)
    }

    #[tokio::test(start_paused = true)]
    async fn failure_still_reloads_and_session_continues() {
        let bindings = vec![WatchBinding::new(["*.scss"], ["styles"]).unwrap()];
        let (orch, rebuilder, reloads) = orchestrator(bindings, true);
        let (tx, rx) = mpsc::channel(16);
        let session = tokio::spawn(orch.run(rx));

        tx.send("main.scss".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        tx.send("main.scss".to_string()).await.unwrap();
        drop(tx);
        session.await.unwrap().unwrap();

        assert_eq!(*rebuilder.runs.lock().unwrap(), vec!["styles", "styles"]);
        assert_eq!(reloads.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_only_binding_bypasses_rebuilder() {
        let bindings = vec![
            WatchBinding::new(["*.scss"], ["styles"]).unwrap(),
            WatchBinding::reload_only(["www/**/*"]).unwrap(),
        ];
        let (orch, rebuilder, reloads) = orchestrator(bindings, false);
        let (tx, rx) = mpsc::channel(16);
        let session = tokio::spawn(orch.run(rx));

        tx.send("www/index.html".to_string()).await.unwrap();
        tx.send("www/css/bundle.css".to_string()).await.unwrap();
        drop(tx);
        session.await.unwrap().unwrap();

        assert!(rebuilder.runs.lock().unwrap().is_empty());
        assert_eq!(reloads.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rebuild_output_does_not_reload_twice() {
        let bindings = vec![
            WatchBinding::new(["*.scss"], ["styles"]).unwrap(),
            WatchBinding::reload_only(["www/**/*"]).unwrap(),
        ];
        let (orch, rebuilder, reloads) = orchestrator(bindings, false);
        let (tx, rx) = mpsc::channel(16);
        let session = tokio::spawn(orch.run(rx));

        tx.send("main.scss".to_string()).await.unwrap();
        // Mid-rebuild write of the bundle.
        tokio::time::sleep(Duration::from_millis(220)).await;
        tx.send("www/css/bundle.css".to_string()).await.unwrap();
        // Late notification right after the reload.
        tokio::time::sleep(Duration::from_millis(80)).await;
        tx.send("www/css/bundle.css".to_string()).await.unwrap();
        drop(tx);
        session.await.unwrap().unwrap();

        assert_eq!(*rebuilder.runs.lock().unwrap(), vec!["styles"]);
        assert_eq!(reloads.0.load(Ordering::SeqCst), 1);
    }
}
