//! The two objective stages of a roster solve.
//!
//! Phase 1 minimizes total cost. Phase 2 runs on a copy of the model with
//! the cost frozen and minimizes the gap between the busiest and the least
//! busy staff member.

use std::sync::Arc;

use shiftforge_config::{PhaseConfig, SolverConfig};
use shiftforge_solver::{
    BoolVar, LinearExpr, LoggingObserver, Model, ObjectiveStage, SolutionLimitObserver,
    SolutionObserver, SolveParams,
};

use crate::builder::RosterModel;

pub const COST_PHASE: &str = "cost";
pub const FAIRNESS_PHASE: &str = "fairness";

/// Search parameters for one phase.
pub fn phase_params(
    name: &str,
    phase: &PhaseConfig,
    config: &SolverConfig,
    observers: &[Arc<dyn SolutionObserver>],
) -> SolveParams {
    let mut params = SolveParams::new()
        .with_time_limit(phase.time_limit())
        .with_workers(config.worker_count.resolve())
        .with_observer(Arc::new(LoggingObserver::new(name)));
    if let Some(limit) = phase.node_limit {
        params = params.with_node_limit(limit);
    }
    if let Some(limit) = phase.solution_limit {
        params = params.with_observer(Arc::new(SolutionLimitObserver::new(limit)));
    }
    for observer in observers {
        params = params.with_observer(Arc::clone(observer));
    }
    params
}

/// Phase 1: minimize `total_cost`.
pub fn cost_stage(roster: &RosterModel, params: SolveParams) -> ObjectiveStage {
    let total_cost = roster.total_cost();
    ObjectiveStage::new(COST_PHASE, move |_: &mut Model| total_cost, params)
}

/// Phase 2: minimize `max_workload - min_workload`.
pub fn fairness_stage(roster: &RosterModel, params: SolveParams) -> ObjectiveStage {
    let assignments: Vec<Vec<BoolVar>> = roster.assignments().to_vec();
    let day_count = roster.day_count() as i64;
    ObjectiveStage::new(
        FAIRNESS_PHASE,
        move |model: &mut Model| {
            let workloads = assignments
                .iter()
                .enumerate()
                .map(|(s, row)| {
                    model.new_linear_int(
                        format!("workload_{}", s),
                        LinearExpr::sum(row.iter().copied()),
                        0,
                        day_count,
                    )
                })
                .collect::<Vec<_>>();
            let max = model.new_max("max_workload", workloads.clone());
            let min = model.new_min("min_workload", workloads);
            model.new_difference("fairness_gap", max, min)
        },
        params,
    )
}

/// Both phases, in solve order.
pub fn roster_stages(
    roster: &RosterModel,
    config: &SolverConfig,
    observers: &[Arc<dyn SolutionObserver>],
) -> Vec<ObjectiveStage> {
    vec![
        cost_stage(
            roster,
            phase_params(COST_PHASE, &config.cost_phase, config, observers),
        ),
        fairness_stage(
            roster,
            phase_params(FAIRNESS_PHASE, &config.fairness_phase, config, observers),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::builder::ConstraintModelBuilder;
    use shiftforge_solver::{solve_stage, BranchAndBoundBackend, SolveStatus};
    use shiftforge_test::fixtures::trivial_week;

    #[test]
    fn test_params_follow_config() {
        let config = SolverConfig::new()
            .with_time_limit_phase1(Duration::from_millis(250))
            .with_solution_limit(3)
            .with_worker_count(shiftforge_config::WorkerCount::Count(2));
        let params = phase_params(COST_PHASE, &config.cost_phase, &config, &[]);

        assert_eq!(params.time_limit(), Some(Duration::from_millis(250)));
        assert_eq!(params.workers(), 2);
        // Logging plus solution limit.
        assert_eq!(params.observers().len(), 2);
        assert_eq!(params.node_limit(), None);
    }

    #[test]
    fn test_stages_solve_trivial_week() {
        let problem = trivial_week().problem();
        let roster = ConstraintModelBuilder::new(&problem).build();
        let config = SolverConfig::new().with_worker_count(shiftforge_config::WorkerCount::Single);
        let stages = roster_stages(&roster, &config, &[]);
        let backend = BranchAndBoundBackend::new();

        let cost = solve_stage(&backend, roster.model(), &stages[0], None).unwrap();
        assert_eq!(cost.report.status, SolveStatus::Optimal);
        assert_eq!(cost.report.objective, 80_000_000);

        let mut frozen = cost.model.clone();
        frozen.fix_int(cost.objective, cost.report.objective);
        let fair =
            solve_stage(&backend, &frozen, &stages[1], Some(cost.solution.values())).unwrap();
        assert_eq!(fair.report.objective, 6);
        assert_eq!(fair.solution.int_value(&fair.model, roster.total_cost()), 80_000_000);
    }
}
