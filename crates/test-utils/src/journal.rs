#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetflow::exec::{TaskAction, action_fn};
use assetflow::watch::{RebuildFuture, Rebuilder, ReloadNotifier};

/// What a recording action observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Started(String),
    Finished(String),
}

/// Shared log of task starts/finishes, used to check ordering.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Action that records start and finish, sleeping `delay` in between.
    pub fn action(&self, name: &str, delay: Duration) -> Arc<dyn TaskAction> {
        let entries = Arc::clone(&self.entries);
        let name = name.to_string();
        action_fn(format!("record {name}"), move |_ctx| {
            let entries = Arc::clone(&entries);
            let name = name.clone();
            async move {
                entries.lock().unwrap().push(Entry::Started(name.clone()));
                tokio::time::sleep(delay).await;
                entries.lock().unwrap().push(Entry::Finished(name));
                Ok::<(), anyhow::Error>(())
            }
        })
    }

    /// Action that records its start, then fails with `message`.
    pub fn failing(&self, name: &str, message: &str) -> Arc<dyn TaskAction> {
        let entries = Arc::clone(&self.entries);
        let name = name.to_string();
        let message = message.to_string();
        action_fn(format!("fail {name}"), move |_ctx| {
            let entries = Arc::clone(&entries);
            let name = name.clone();
            let message = message.clone();
            async move {
                entries.lock().unwrap().push(Entry::Started(name));
                Err::<(), _>(anyhow::anyhow!("{message}"))
            }
        })
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Started(n) => Some(n),
                Entry::Finished(_) => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Finished(n) => Some(n),
                Entry::Started(_) => None,
            })
            .collect()
    }

    /// Index of an entry in the journal.
    pub fn index_of(&self, entry: &Entry) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

/// Rebuilder that records requested tasks.
#[derive(Debug, Default)]
pub struct RecordingRebuilder {
    runs: Mutex<Vec<String>>,
    delay: Duration,
}

impl RecordingRebuilder {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            delay,
        }
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }
}

impl Rebuilder for RecordingRebuilder {
    fn rebuild<'a>(&'a self, task: &'a str) -> RebuildFuture<'a> {
        Box::pin(async move {
            self.runs.lock().unwrap().push(task.to_string());
            tokio::time::sleep(self.delay).await;
            Ok(())
        })
    }
}

/// Notifier that counts reloads.
#[derive(Debug, Default)]
pub struct ReloadCounter {
    count: AtomicUsize,
}

impl ReloadCounter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ReloadNotifier for ReloadCounter {
    fn notify_reload(&self, _reason: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
