// src/watch/debounce.rs

//! Per-binding debounce state machine.
//!
//! ```text
//! Idle --event--> Debouncing --window elapsed--> Running --finished--> Idle
//!                  ^   |  (events coalesce)          | (events mark pending)
//!                  |   +-----------------------------+
//!                  +---- finished with pending -------+
//! ```
//!
//! The window is fixed from the first event of a burst, so a steady stream
//! of events still produces a rebuild every window. Pure: the caller supplies
//! the clock.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPhase {
    Idle,
    Debouncing { deadline: Instant },
    /// `pending` is set when events arrived during the run.
    Running { pending: bool },
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    phases: Vec<BindingPhase>,
}

impl Debouncer {
    pub fn new(window: Duration, bindings: usize) -> Self {
        Self {
            window,
            phases: vec![BindingPhase::Idle; bindings],
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn phase(&self, idx: usize) -> Option<BindingPhase> {
        self.phases.get(idx).copied()
    }

    /// Record a matching change for binding `idx`.
    pub fn on_event(&mut self, idx: usize, now: Instant) {
        let window = self.window;
        let Some(phase) = self.phases.get_mut(idx) else {
            return;
        };
        match phase {
            BindingPhase::Idle => {
                *phase = BindingPhase::Debouncing {
                    deadline: now + window,
                };
            }
            BindingPhase::Debouncing { .. } => {}
            BindingPhase::Running { pending } => *pending = true,
        }
    }

    /// Earliest deadline of any debouncing binding.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.phases
            .iter()
            .filter_map(|p| match p {
                BindingPhase::Debouncing { deadline } => Some(*deadline),
                _ => None,
            })
            .min()
    }

    /// Move every binding whose window has elapsed to `Running` and return
    /// their indices.
    pub fn take_due(&mut self, now: Instant) -> Vec<usize> {
        let mut due = Vec::new();
        for (idx, phase) in self.phases.iter_mut().enumerate() {
            if let BindingPhase::Debouncing { deadline } = *phase {
                if deadline <= now {
                    *phase = BindingPhase::Running { pending: false };
                    due.push(idx);
                }
            }
        }
        due
    }

    /// Record that the run for binding `idx` completed, successfully or not.
    pub fn on_run_finished(&mut self, idx: usize, now: Instant) {
        let window = self.window;
        let Some(phase) = self.phases.get_mut(idx) else {
            return;
        };
        *phase = match *phase {
            BindingPhase::Running { pending: true } => BindingPhase::Debouncing {
                deadline: now + window,
            },
            _ => BindingPhase::Idle,
        };
    }

    pub fn is_running(&self, idx: usize) -> bool {
        matches!(self.phase(idx), Some(BindingPhase::Running { .. }))
    }

    /// No binding is debouncing or running.
    pub fn is_quiescent(&self) -> bool {
        self.phases.iter().all(|p| *p == BindingPhase::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(200);

    #[test]
    fn burst_coalesces_into_one_run() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW, 1);

        d.on_event(0, t0);
        d.on_event(0, t0 + Duration::from_millis(50));
        d.on_event(0, t0 + Duration::from_millis(150));

        assert_eq!(d.next_deadline(), Some(t0 + WINDOW));
        assert!(d.take_due(t0 + Duration::from_millis(199)).is_empty());
        assert_eq!(d.take_due(t0 + WINDOW), vec![0]);
        assert!(d.is_running(0));

        d.on_run_finished(0, t0 + Duration::from_millis(300));
        assert!(d.is_quiescent());
    }

    #[test]
    fn events_during_run_schedule_one_follow_up() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW, 1);

        d.on_event(0, t0);
        d.take_due(t0 + WINDOW);
        d.on_event(0, t0 + Duration::from_millis(250));
        d.on_event(0, t0 + Duration::from_millis(260));

        let done = t0 + Duration::from_millis(400);
        d.on_run_finished(0, done);
        assert_eq!(
            d.phase(0),
            Some(BindingPhase::Debouncing {
                deadline: done + WINDOW
            })
        );
    }

    #[test]
    fn bindings_are_independent() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW, 2);

        d.on_event(0, t0);
        d.on_event(1, t0 + Duration::from_millis(100));

        assert_eq!(d.take_due(t0 + WINDOW), vec![0]);
        assert_eq!(d.phase(1), Some(BindingPhase::Debouncing {
            deadline: t0 + Duration::from_millis(300)
        }));
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(300)));
    }

    #[test]
    fn unknown_index_is_ignored() {
        let mut d = Debouncer::new(WINDOW, 1);
        d.on_event(7, Instant::now());
        d.on_run_finished(7, Instant::now());
        assert!(d.is_quiescent());
    }
}
