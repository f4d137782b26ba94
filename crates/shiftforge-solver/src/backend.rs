//! Solver backend abstraction.
//!
//! Optimization stages talk to a [`SolverBackend`] rather than to a concrete
//! search engine, so a backend can be swapped or reported unavailable
//! without touching the model construction.

use std::fmt::{self, Debug};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::model::{BoolVar, IntVar, Model};
use crate::observer::{ObserverSupport, SolutionObserver};
use crate::stats::SolveStats;

/// Whether a backend can currently solve models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable { reason: String },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// A search engine for [`Model`]s.
pub trait SolverBackend: Send + Sync + Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Reports whether the backend is usable.
    fn availability(&self) -> Availability {
        Availability::Available
    }

    /// Searches for a solution minimizing the model's objective, if any.
    fn solve(&self, model: &Model, params: &SolveParams) -> SolveOutcome;
}

impl<B: SolverBackend + ?Sized> SolverBackend for Arc<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn availability(&self) -> Availability {
        (**self).availability()
    }

    fn solve(&self, model: &Model, params: &SolveParams) -> SolveOutcome {
        (**self).solve(model, params)
    }
}

/// Limits and hooks for one solve call.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use shiftforge_solver::SolveParams;
///
/// let params = SolveParams::new()
///     .with_time_limit(Duration::from_secs(5))
///     .with_workers(4)
///     .with_node_limit(1_000_000);
///
/// assert_eq!(params.workers(), 4);
/// assert_eq!(params.time_limit(), Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone)]
pub struct SolveParams {
    time_limit: Option<Duration>,
    node_limit: Option<u64>,
    workers: usize,
    stop_flag: Option<Arc<AtomicBool>>,
    observers: ObserverSupport,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_limit: None,
            node_limit: None,
            workers: 1,
            stop_flag: None,
            observers: ObserverSupport::new(),
        }
    }
}

impl SolveParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    /// Sets the number of parallel workers (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Stops the search once `flag` is set.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SolutionObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn node_limit(&self) -> Option<u64> {
        self.node_limit
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn stop_flag(&self) -> Option<&Arc<AtomicBool>> {
        self.stop_flag.as_ref()
    }

    pub fn observers(&self) -> &ObserverSupport {
        &self.observers
    }
}

/// Terminal status of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// Search space exhausted; the solution is proven optimal.
    Optimal,
    /// Stopped early with a solution that may not be optimal.
    Feasible,
    /// Search space exhausted without any solution.
    Infeasible,
    /// Stopped early without any solution.
    Unknown,
    /// The model failed validation.
    ModelInvalid,
}

impl SolveStatus {
    /// Returns true if a solution accompanies this status.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
            SolveStatus::ModelInvalid => "MODEL_INVALID",
        };
        f.write_str(name)
    }
}

/// A complete assignment of a model's boolean variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    values: Vec<bool>,
    objective: Option<i64>,
}

impl Solution {
    pub fn new(values: Vec<bool>, objective: Option<i64>) -> Self {
        Self { values, objective }
    }

    pub fn value(&self, var: BoolVar) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }

    pub fn values(&self) -> &[bool] {
        &self.values
    }

    pub fn into_values(self) -> Vec<bool> {
        self.values
    }

    /// Objective value, if the model had an objective.
    pub fn objective(&self) -> Option<i64> {
        self.objective
    }

    /// Evaluates a derived integer under this assignment.
    pub fn int_value(&self, model: &Model, var: IntVar) -> i64 {
        model.evaluate_int(var, &self.values)
    }
}

/// Result of a solve call.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub solution: Option<Solution>,
    pub stats: SolveStats,
}

impl SolveOutcome {
    pub fn model_invalid() -> Self {
        Self {
            status: SolveStatus::ModelInvalid,
            solution: None,
            stats: SolveStats::default(),
        }
    }
}
