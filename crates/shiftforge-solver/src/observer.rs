//! Improving-solution observers.
//!
//! Observers are notified every time the search finds a solution better than
//! the incumbent. Notifications are serialized across workers, so an observer
//! never sees two callbacks at once and counts are strictly increasing.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use shiftforge_solver::observer::{ObserverSupport, SearchControl, SolutionLimitObserver};
//!
//! let mut support = ObserverSupport::new();
//! support.add(Arc::new(SolutionLimitObserver::new(2)));
//!
//! assert_eq!(support.fire(1, Some(100)), SearchControl::Continue);
//! assert_eq!(support.fire(2, Some(90)), SearchControl::Stop);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

/// What the search should do after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchControl {
    Continue,
    Stop,
}

/// Receives improving solutions.
pub trait SolutionObserver: Send + Sync + Debug {
    /// Called with the 1-based count of improving solutions so far and the
    /// objective of the newest one.
    fn on_improved_solution(&self, count: u64, objective: Option<i64>) -> SearchControl;
}

/// Stops the search after a fixed number of improving solutions.
#[derive(Debug, Clone, Copy)]
pub struct SolutionLimitObserver {
    limit: u64,
}

impl SolutionLimitObserver {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl SolutionObserver for SolutionLimitObserver {
    fn on_improved_solution(&self, count: u64, _objective: Option<i64>) -> SearchControl {
        if count >= self.limit {
            SearchControl::Stop
        } else {
            SearchControl::Continue
        }
    }
}

/// Emits an `improved` tracing event per improving solution.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    phase: String,
}

impl LoggingObserver {
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
        }
    }
}

impl SolutionObserver for LoggingObserver {
    fn on_improved_solution(&self, count: u64, objective: Option<i64>) -> SearchControl {
        debug!(
            event = "improved",
            phase = %self.phase,
            solution_count = count,
            objective = objective.unwrap_or_default(),
        );
        SearchControl::Continue
    }
}

/// Records how many improving solutions were seen and the last objective.
#[derive(Debug, Default)]
pub struct CountingObserver {
    count: AtomicU64,
    last_objective: AtomicI64,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn last_objective(&self) -> i64 {
        self.last_objective.load(Ordering::SeqCst)
    }
}

impl SolutionObserver for CountingObserver {
    fn on_improved_solution(&self, count: u64, objective: Option<i64>) -> SearchControl {
        self.count.store(count, Ordering::SeqCst);
        if let Some(value) = objective {
            self.last_objective.store(value, Ordering::SeqCst);
        }
        SearchControl::Continue
    }
}

/// Broadcasts notifications to registered observers in registration order.
#[derive(Debug, Clone, Default)]
pub struct ObserverSupport {
    observers: Vec<Arc<dyn SolutionObserver>>,
}

impl ObserverSupport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn SolutionObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Notifies every observer; returns `Stop` if any of them asked to stop.
    pub fn fire(&self, count: u64, objective: Option<i64>) -> SearchControl {
        let mut control = SearchControl::Continue;
        for observer in &self.observers {
            if observer.on_improved_solution(count, objective) == SearchControl::Stop {
                control = SearchControl::Stop;
            }
        }
        control
    }
}
