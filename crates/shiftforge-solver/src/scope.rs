//! Shared state of one solve call.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::backend::Solution;
use crate::observer::{ObserverSupport, SearchControl};

/// Scope shared by every search worker.
///
/// Holds the incumbent, the node and solution counters and the stop flags.
/// The incumbent objective is mirrored in an atomic so workers can prune
/// without taking the lock.
#[derive(Debug)]
pub struct SolveScope {
    start_time: Instant,
    workers: usize,
    nodes: AtomicU64,
    solutions: AtomicU64,
    best_objective: AtomicI64,
    incumbent: Mutex<Option<Solution>>,
    stop: AtomicBool,
    interrupted: AtomicBool,
}

impl SolveScope {
    pub fn new(workers: usize) -> Self {
        Self {
            start_time: Instant::now(),
            workers,
            nodes: AtomicU64::new(0),
            solutions: AtomicU64::new(0),
            best_objective: AtomicI64::new(i64::MAX),
            incumbent: Mutex::new(None),
            stop: AtomicBool::new(false),
            interrupted: AtomicBool::new(false),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn node_count(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Records a visited node and returns the new total.
    pub(crate) fn record_node(&self) -> u64 {
        self.nodes.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn solution_count(&self) -> u64 {
        self.solutions.load(Ordering::SeqCst)
    }

    /// Objective of the incumbent, if there is one with an objective.
    pub fn best_objective(&self) -> Option<i64> {
        match self.best_objective.load(Ordering::SeqCst) {
            i64::MAX => None,
            value => Some(value),
        }
    }

    /// True once any worker should stop.
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// True if the search was cut short by a limit or an observer.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Stops the search because a limit was reached.
    pub(crate) fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stops the search because it is complete.
    pub(crate) fn finish(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Offers a complete assignment; keeps it if it beats the incumbent.
    ///
    /// Observers are notified while the incumbent lock is held.
    pub(crate) fn offer(
        &self,
        values: Vec<bool>,
        objective: Option<i64>,
        observers: &ObserverSupport,
    ) -> bool {
        let mut incumbent = self
            .incumbent
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match objective {
            Some(value) => {
                if value >= self.best_objective.load(Ordering::SeqCst) {
                    return false;
                }
                self.best_objective.store(value, Ordering::SeqCst);
            }
            None => {
                if incumbent.is_some() {
                    return false;
                }
            }
        }
        *incumbent = Some(Solution::new(values, objective));
        let count = self.solutions.fetch_add(1, Ordering::SeqCst) + 1;
        if observers.fire(count, objective) == SearchControl::Stop {
            self.interrupt();
        }
        true
    }

    pub(crate) fn take_incumbent(&self) -> Option<Solution> {
        self.incumbent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
