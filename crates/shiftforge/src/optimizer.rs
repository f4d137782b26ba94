//! The two-phase optimization pipeline.

use std::sync::Arc;
use std::time::Instant;

use shiftforge_config::SolverConfig;
use shiftforge_core::{
    validate_inputs, Result, RosterProblem, Schedule, ShiftForgeError, Table,
    COST_UNITS_PER_WAGE,
};
use shiftforge_solver::{
    solve_lexicographic, BranchAndBoundBackend, LexicographicError, SolutionObserver,
    SolverBackend, StageReport,
};
use tracing::{error, info};

use crate::builder::ConstraintModelBuilder;
use crate::export::ScheduleExporter;
use crate::phase::roster_stages;

/// A schedule together with what each phase achieved.
#[derive(Debug, Clone)]
pub struct SolvedSchedule {
    pub schedule: Schedule,
    /// Total labour cost in wage units.
    pub total_cost: f64,
    /// Busiest minus least busy workload, in days.
    pub fairness_gap: usize,
    pub cost_phase: StageReport,
    pub fairness_phase: StageReport,
}

/// Runs validation, model building, both phases and export.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use shiftforge::{ShiftOptimizer, SolverConfig, Table, Value};
///
/// let roster = Table::new(["date", "required_personnel"])
///     .with_row([Value::from("2024-01-01"), Value::from(1)])
///     .unwrap();
/// let staff = Table::new(["staff_id", "name", "wage"])
///     .with_row([Value::from("S1"), Value::from("Alice"), Value::from(10.0)])
///     .unwrap()
///     .with_row([Value::from("S2"), Value::from("Bob"), Value::from(12.0)])
///     .unwrap();
/// let leave = shiftforge::empty_leave_table();
///
/// let config = SolverConfig::new().with_time_limit_phase1(Duration::from_secs(5));
/// let solved = ShiftOptimizer::new(config).try_solve(&roster, &staff, &leave).unwrap();
/// assert_eq!(solved.schedule.rows()[0].name, "Alice");
/// assert_eq!(solved.total_cost, 10.0);
/// ```
#[derive(Debug)]
pub struct ShiftOptimizer<B = BranchAndBoundBackend> {
    config: SolverConfig,
    backend: B,
    observers: Vec<Arc<dyn SolutionObserver>>,
}

impl ShiftOptimizer {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            backend: BranchAndBoundBackend::new(),
            observers: Vec::new(),
        }
    }
}

impl Default for ShiftOptimizer {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl<B: SolverBackend> ShiftOptimizer<B> {
    /// Replaces the solving backend.
    pub fn with_backend<C: SolverBackend>(self, backend: C) -> ShiftOptimizer<C> {
        ShiftOptimizer {
            config: self.config,
            backend,
            observers: self.observers,
        }
    }

    /// Attaches an observer to both phases.
    pub fn with_observer(mut self, observer: Arc<dyn SolutionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Solves the tables and returns the schedule, or an empty schedule on
    /// any failure. The cause is logged.
    pub fn solve(&self, roster: &Table, staff: &Table, leave: &Table) -> Schedule {
        self.try_solve(roster, staff, leave)
            .map(|solved| solved.schedule)
            .unwrap_or_default()
    }

    /// Solves the tables.
    ///
    /// # Errors
    ///
    /// Input errors are returned before any model is built. Backend
    /// unavailability and phase failures are returned after logging.
    pub fn try_solve(&self, roster: &Table, staff: &Table, leave: &Table) -> Result<SolvedSchedule> {
        let problem = validate_inputs(roster, staff, leave)
            .into_result()
            .and_then(|()| RosterProblem::from_tables(roster, staff, leave))
            .map_err(log_failure)?;
        self.try_solve_problem(&problem)
    }

    /// Solves an already typed problem.
    ///
    /// Wages are checked as in [`RosterProblem::check_costs`] before any
    /// model is built.
    pub fn try_solve_problem(&self, problem: &RosterProblem) -> Result<SolvedSchedule> {
        self.run(problem).map_err(log_failure)
    }

    fn run(&self, problem: &RosterProblem) -> Result<SolvedSchedule> {
        self.config
            .validate()
            .map_err(|e| ShiftForgeError::Config(e.to_string()))?;
        problem.check_costs()?;

        let started = Instant::now();
        let roster = ConstraintModelBuilder::with_config(problem, &self.config).build();
        info!(
            event = "solve_start",
            staff_count = problem.staff_count(),
            day_count = problem.day_count(),
            variable_count = roster.model().bool_count(),
            constraint_count = roster.model().constraint_count(),
            workers = self.config.worker_count.resolve(),
        );

        let stages = roster_stages(&roster, &self.config, &self.observers);
        let solved =
            solve_lexicographic(&self.backend, roster.model(), &stages).map_err(|err| match err {
                LexicographicError::Unavailable { backend, reason } => {
                    ShiftForgeError::SolverUnavailable { backend, reason }
                }
                LexicographicError::StageFailed { index: 0, status, .. } => {
                    error!(status = %status, "Phase 1 failed to find a solution");
                    ShiftForgeError::Phase1Infeasible {
                        status: status.to_string(),
                    }
                }
                LexicographicError::StageFailed { status, .. } => {
                    error!(status = %status, "Phase 2 failed to find a fair solution");
                    ShiftForgeError::Phase2Infeasible {
                        status: status.to_string(),
                    }
                }
                LexicographicError::NoStages => {
                    ShiftForgeError::Config("no objective stages to solve".to_string())
                }
            })?;

        let schedule = ScheduleExporter::new(problem, &roster).export(&solved.solution);
        let mut reports = solved.stages.into_iter();
        let (cost_phase, fairness_phase) = match (reports.next(), reports.next()) {
            (Some(cost), Some(fairness)) => (cost, fairness),
            _ => {
                return Err(ShiftForgeError::Phase2Infeasible {
                    status: "UNKNOWN".to_string(),
                })
            }
        };

        let total_cost = cost_phase.objective as f64 / COST_UNITS_PER_WAGE as f64;
        let fairness_gap = fairness_phase.objective.max(0) as usize;
        info!(
            event = "solve_end",
            total_cost,
            fairness_gap,
            rows = schedule.len(),
            duration_ms = started.elapsed().as_millis() as u64,
        );

        Ok(SolvedSchedule {
            schedule,
            total_cost,
            fairness_gap,
            cost_phase,
            fairness_phase,
        })
    }
}

fn log_failure(err: ShiftForgeError) -> ShiftForgeError {
    info!(event = "solve_failed", reason = %err);
    err
}

/// Solves the tables with a default optimizer under `config`.
///
/// Returns an empty schedule on any failure.
pub fn optimize_schedule(
    roster: &Table,
    staff: &Table,
    leave: &Table,
    config: &SolverConfig,
) -> Schedule {
    ShiftOptimizer::new(config.clone()).solve(roster, staff, leave)
}
