// src/watch/mod.rs

//! Watch mode.
//!
//! - [`patterns`]: compiled `{patterns → tasks}` bindings and the defaults
//!   derived from `[paths]`.
//! - [`watcher`]: `notify` watcher producing root-relative change paths,
//!   optionally gated by content hash ([`hash`]).
//! - [`debounce`]: per-binding `Idle → Debouncing → Running` state machine.
//! - [`orchestrator`]: drives the debouncer, re-runs tasks and emits reload
//!   notifications.
//!
//! It does not know about the dev server; reloads go through the
//! [`ReloadNotifier`] seam.

pub mod debounce;
pub mod hash;
pub mod orchestrator;
pub mod patterns;
pub mod watcher;

pub use debounce::{BindingPhase, Debouncer};
pub use hash::ContentGate;
pub use orchestrator::{RebuildFuture, Rebuilder, ReloadNotifier, WatchOrchestrator};
pub use patterns::{WatchBinding, bindings_from_config, default_bindings};
pub use watcher::{WatcherHandle, spawn_watcher};
