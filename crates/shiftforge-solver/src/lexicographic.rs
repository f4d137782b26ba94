//! Lexicographic multi-objective optimization.
//!
//! Objectives are solved one stage at a time. Each stage minimizes its own
//! objective on a copy of the model in which every earlier objective is
//! frozen at the value its stage achieved. The previous stage's assignment
//! is passed as a solution hint, so a later stage starts from a solution
//! that already satisfies all frozen values.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{Availability, Solution, SolveOutcome, SolveParams, SolveStatus, SolverBackend};
use crate::model::{IntVar, Model};
use crate::stats::SolveStats;

/// Builds a stage's objective on the model and returns it.
pub type ObjectiveBuilder = Box<dyn Fn(&mut Model) -> IntVar + Send + Sync>;

/// One objective in a lexicographic sequence.
pub struct ObjectiveStage {
    name: String,
    build: ObjectiveBuilder,
    params: SolveParams,
}

impl ObjectiveStage {
    pub fn new(
        name: impl Into<String>,
        build: impl Fn(&mut Model) -> IntVar + Send + Sync + 'static,
        params: SolveParams,
    ) -> Self {
        Self {
            name: name.into(),
            build: Box::new(build),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &SolveParams {
        &self.params
    }
}

impl fmt::Debug for ObjectiveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectiveStage")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Why a lexicographic solve stopped without a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexicographicError {
    #[error("solver backend '{backend}' is unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("no objective stages to solve")]
    NoStages,

    #[error("stage {index} ('{stage}') ended with status {status}")]
    StageFailed {
        index: usize,
        stage: String,
        status: SolveStatus,
    },
}

/// What one stage achieved.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: String,
    pub status: SolveStatus,
    pub objective: i64,
    pub stats: SolveStats,
}

/// A solved stage together with the model it was solved on.
#[derive(Debug, Clone)]
pub struct SolvedStage {
    pub model: Model,
    pub objective: IntVar,
    pub solution: Solution,
    pub report: StageReport,
}

/// Result of a full lexicographic solve.
#[derive(Debug, Clone)]
pub struct LexicographicSolution {
    /// Model of the last stage, with every earlier objective frozen.
    pub model: Model,
    pub solution: Solution,
    pub stages: Vec<StageReport>,
}

impl LexicographicSolution {
    /// Value the stage at `index` achieved.
    pub fn objective(&self, index: usize) -> Option<i64> {
        self.stages.get(index).map(|s| s.objective)
    }
}

/// Solves a single stage on top of `model`.
///
/// `model` already carries earlier frozen objectives. `hint` is the previous
/// stage's assignment, if any. Returns the solve status when no solution was
/// found.
pub fn solve_stage<B: SolverBackend + ?Sized>(
    backend: &B,
    model: &Model,
    stage: &ObjectiveStage,
    hint: Option<&[bool]>,
) -> Result<SolvedStage, SolveStatus> {
    let mut stage_model = model.clone();
    let objective = (stage.build)(&mut stage_model);
    stage_model.minimize(objective);
    if let Some(hint) = hint {
        stage_model.set_hint(hint.to_vec());
    }

    let SolveOutcome {
        status,
        solution,
        stats,
    } = backend.solve(&stage_model, &stage.params);

    match solution {
        Some(solution) if status.has_solution() => {
            let value = solution.int_value(&stage_model, objective);
            Ok(SolvedStage {
                model: stage_model,
                objective,
                solution,
                report: StageReport {
                    name: stage.name.clone(),
                    status,
                    objective: value,
                    stats,
                },
            })
        }
        _ => Err(status),
    }
}

/// Minimizes `stages` in order, freezing each achieved value before the
/// next stage.
///
/// # Example
///
/// ```
/// use shiftforge_solver::{
///     solve_lexicographic, BranchAndBoundBackend, LinearExpr, Model, ObjectiveStage, SolveParams,
/// };
///
/// let mut base = Model::new("two-goals");
/// let x: Vec<_> = (0..3).map(|i| base.new_bool(format!("x{}", i))).collect();
/// base.add_eq("one", LinearExpr::sum(x.iter().copied()), 1);
///
/// let (a, b, c) = (x[0], x[1], x[2]);
/// let stages = vec![
///     // x0 and x1 are equally cheap, x2 is expensive.
///     ObjectiveStage::new(
///         "cost",
///         move |m: &mut Model| {
///             m.new_linear_int("cost", LinearExpr::weighted_sum([(a, 1), (b, 1), (c, 5)]), 0, 7)
///         },
///         SolveParams::new(),
///     ),
///     // Among the cheapest, prefer x1.
///     ObjectiveStage::new(
///         "preference",
///         move |m: &mut Model| m.new_linear_int("pref", LinearExpr::sum([a]), 0, 1),
///         SolveParams::new(),
///     ),
/// ];
///
/// let result = solve_lexicographic(&BranchAndBoundBackend::new(), &base, &stages).unwrap();
/// assert_eq!(result.objective(0), Some(1));
/// assert_eq!(result.objective(1), Some(0));
/// assert!(result.solution.value(b));
/// ```
pub fn solve_lexicographic<B: SolverBackend + ?Sized>(
    backend: &B,
    base: &Model,
    stages: &[ObjectiveStage],
) -> Result<LexicographicSolution, LexicographicError> {
    if stages.is_empty() {
        return Err(LexicographicError::NoStages);
    }
    if let Availability::Unavailable { reason } = backend.availability() {
        return Err(LexicographicError::Unavailable {
            backend: backend.name().to_string(),
            reason,
        });
    }

    let mut model = base.clone();
    let mut solution: Option<Solution> = None;
    let mut reports = Vec::with_capacity(stages.len());

    for (index, stage) in stages.iter().enumerate() {
        info!(event = "phase_start", phase = stage.name(), phase_index = index);

        let hint = solution.as_ref().map(Solution::values);
        let solved = match solve_stage(backend, &model, stage, hint) {
            Ok(solved) => solved,
            Err(status) => {
                warn!(
                    event = "phase_end",
                    phase = stage.name(),
                    phase_index = index,
                    status = %status,
                );
                return Err(LexicographicError::StageFailed {
                    index,
                    stage: stage.name.clone(),
                    status,
                });
            }
        };

        let stats = solved.report.stats;
        info!(
            event = "phase_end",
            phase = stage.name(),
            phase_index = index,
            status = %solved.report.status,
            objective = solved.report.objective,
            nodes = stats.nodes,
            duration_ms = stats.elapsed.as_millis() as u64,
            speed = stats.nodes_per_second() as u64,
        );

        model = solved.model;
        model.fix_int(solved.objective, solved.report.objective);
        solution = Some(solved.solution);
        reports.push(solved.report);
    }

    solution
        .map(|solution| LexicographicSolution {
            model,
            solution,
            stages: reports,
        })
        .ok_or(LexicographicError::NoStages)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{BoolVar, LinearExpr};
    use crate::search::BranchAndBoundBackend;

    #[derive(Debug)]
    struct OfflineBackend;

    impl SolverBackend for OfflineBackend {
        fn name(&self) -> &str {
            "offline"
        }

        fn availability(&self) -> Availability {
            Availability::Unavailable {
                reason: "not installed".to_string(),
            }
        }

        fn solve(&self, _model: &Model, _params: &SolveParams) -> SolveOutcome {
            SolveOutcome::model_invalid()
        }
    }

    /// Two workers, four days, one shift per day; worker 0 is cheaper.
    fn two_worker_model() -> (Model, Vec<BoolVar>, Vec<BoolVar>) {
        let mut m = Model::new("two-workers");
        let w0: Vec<_> = (0..4).map(|d| m.new_bool(format!("w0_d{d}"))).collect();
        let w1: Vec<_> = (0..4).map(|d| m.new_bool(format!("w1_d{d}"))).collect();
        for d in 0..4 {
            m.add_eq(format!("cover_d{d}"), LinearExpr::sum([w0[d], w1[d]]), 1);
        }
        // Worker 0 works at most three days.
        m.add_le("w0_cap", LinearExpr::sum(w0.iter().copied()), 3);
        (m, w0, w1)
    }

    fn stages(w0: Vec<BoolVar>, w1: Vec<BoolVar>) -> Vec<ObjectiveStage> {
        let cost_w0 = w0.clone();
        let cost_w1 = w1.clone();
        vec![
            ObjectiveStage::new(
                "cost",
                move |m: &mut Model| {
                    let expr = LinearExpr::weighted_sum(
                        cost_w0
                            .iter()
                            .map(|v| (*v, 1))
                            .chain(cost_w1.iter().map(|v| (*v, 2))),
                    );
                    m.new_linear_int("cost", expr, 0, 8)
                },
                SolveParams::new(),
            ),
            ObjectiveStage::new(
                "fairness",
                move |m: &mut Model| {
                    let a = m.new_linear_int("load0", LinearExpr::sum(w0.iter().copied()), 0, 4);
                    let b = m.new_linear_int("load1", LinearExpr::sum(w1.iter().copied()), 0, 4);
                    let max = m.new_max("max", vec![a, b]);
                    let min = m.new_min("min", vec![a, b]);
                    m.new_difference("gap", max, min)
                },
                SolveParams::new(),
            ),
        ]
    }

    #[test]
    fn test_second_stage_respects_first() {
        let (model, w0, w1) = two_worker_model();
        let stages = stages(w0.clone(), w1);
        let result = solve_lexicographic(&BranchAndBoundBackend::new(), &model, &stages).unwrap();

        // Cheapest: worker 0 three days, worker 1 one day.
        assert_eq!(result.objective(0), Some(5));
        assert_eq!(result.objective(1), Some(2));
        assert_eq!(result.stages.len(), 2);
        assert!(result.stages.iter().all(|s| s.status == SolveStatus::Optimal));
        let worked = w0.iter().filter(|v| result.solution.value(**v)).count();
        assert_eq!(worked, 3);
        assert_eq!(result.model.fixed_ints().len(), 2);
    }

    #[test]
    fn test_single_stage_solve() {
        let (model, w0, w1) = two_worker_model();
        let stages = stages(w0, w1);
        let solved = solve_stage(&BranchAndBoundBackend::new(), &model, &stages[1], None).unwrap();
        assert_eq!(solved.report.objective, 0);
        assert_eq!(solved.report.name, "fairness");
    }

    #[test]
    fn test_unavailable_backend() {
        let (model, w0, w1) = two_worker_model();
        let err = solve_lexicographic(&OfflineBackend, &model, &stages(w0, w1)).unwrap_err();
        assert!(matches!(err, LexicographicError::Unavailable { .. }));
        assert!(err.to_string().contains("not installed"));
    }

    #[test]
    fn test_infeasible_first_stage() {
        let (mut model, w0, w1) = two_worker_model();
        model.add_le("w1_cap", LinearExpr::sum(w1.iter().copied()), 0);
        let err = solve_lexicographic(&BranchAndBoundBackend::new(), &model, &stages(w0, w1))
            .unwrap_err();
        assert_eq!(
            err,
            LexicographicError::StageFailed {
                index: 0,
                stage: "cost".to_string(),
                status: SolveStatus::Infeasible,
            }
        );
    }

    #[test]
    fn test_no_stages() {
        let (model, _, _) = two_worker_model();
        let err = solve_lexicographic(&BranchAndBoundBackend::new(), &model, &[]).unwrap_err();
        assert_eq!(err, LexicographicError::NoStages);
    }

    #[test]
    fn test_shared_backend() {
        let (model, w0, w1) = two_worker_model();
        let backend = Arc::new(BranchAndBoundBackend::new());
        let result = solve_lexicographic(&backend, &model, &stages(w0, w1)).unwrap();
        assert_eq!(result.objective(0), Some(5));
    }
}
