//! Tests for the branch-and-bound backend.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::model::{BoolVar, LinearExpr};
use crate::observer::{CountingObserver, SolutionLimitObserver};

/// Picks exactly `k` of `weights.len()` items, minimizing total weight.
fn knapsack_model(weights: &[i64], k: i64) -> (Model, Vec<BoolVar>) {
    let mut model = Model::new("pick-k");
    let xs: Vec<_> = (0..weights.len())
        .map(|i| model.new_bool(format!("x{i}")))
        .collect();
    model.add_eq("pick", LinearExpr::sum(xs.iter().copied()), k);
    let max: i64 = weights.iter().sum();
    let cost = model.new_linear_int(
        "cost",
        LinearExpr::weighted_sum(xs.iter().copied().zip(weights.iter().copied())),
        0,
        max,
    );
    model.minimize(cost);
    (model, xs)
}

/// Splits eight unit items between two bins minimizing the load difference.
fn balance_model() -> Model {
    let mut model = Model::new("balance");
    let xs: Vec<_> = (0..8).map(|i| model.new_bool(format!("x{i}"))).collect();
    let left = model.new_linear_int("left", LinearExpr::sum(xs[..4].to_vec()), 0, 4);
    let right = model.new_linear_int("right", LinearExpr::sum(xs[4..].to_vec()), 0, 4);
    model.add_eq("total", LinearExpr::sum(xs.iter().copied()), 5);
    let max = model.new_max("max", vec![left, right]);
    let min = model.new_min("min", vec![left, right]);
    let gap = model.new_difference("gap", max, min);
    model.minimize(gap);
    model
}

#[test]
fn test_finds_optimum() {
    let (model, xs) = knapsack_model(&[7, 3, 9, 2, 5, 4], 3);
    let outcome = BranchAndBoundBackend::new().solve(&model, &SolveParams::new());

    assert_eq!(outcome.status, SolveStatus::Optimal);
    let solution = outcome.solution.unwrap();
    assert_eq!(solution.objective(), Some(9));
    assert!(solution.value(xs[1]));
    assert!(solution.value(xs[3]));
    assert!(solution.value(xs[5]));
    assert!(outcome.stats.nodes > 0);
    assert!(outcome.stats.solutions >= 1);
}

#[test]
fn test_parallel_matches_sequential() {
    let weights = [11, 4, 8, 15, 6, 9, 3, 12, 7, 5];
    let (model, _) = knapsack_model(&weights, 4);

    let sequential = BranchAndBoundBackend::new().solve(&model, &SolveParams::new());
    let parallel = BranchAndBoundBackend::new()
        .solve(&model, &SolveParams::new().with_workers(4));

    assert_eq!(parallel.status, SolveStatus::Optimal);
    assert_eq!(parallel.stats.workers, 4);
    assert_eq!(
        sequential.solution.unwrap().objective(),
        parallel.solution.unwrap().objective()
    );
}

#[test]
fn test_nonlinear_objective() {
    let model = balance_model();
    let outcome = BranchAndBoundBackend::new().solve(&model, &SolveParams::new().with_workers(2));

    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.solution.unwrap().objective(), Some(1));
}

#[test]
fn test_infeasible() {
    let mut model = Model::new("impossible");
    let a = model.new_bool("a");
    let b = model.new_bool("b");
    model.add_eq("both", LinearExpr::sum([a, b]), 2);
    model.add_le("at_most_one", LinearExpr::sum([a, b]), 1);

    let outcome = BranchAndBoundBackend::new().solve(&model, &SolveParams::new());
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert!(outcome.solution.is_none());

    let outcome = BranchAndBoundBackend::new()
        .solve(&model, &SolveParams::new().with_workers(3));
    assert_eq!(outcome.status, SolveStatus::Infeasible);
}

#[test]
fn test_invalid_model() {
    let mut model = Model::new("broken");
    let a = model.new_bool("a");
    model.add_linear("empty", LinearExpr::sum([a]), 1, 0);

    let outcome = BranchAndBoundBackend::new().solve(&model, &SolveParams::new());
    assert_eq!(outcome.status, SolveStatus::ModelInvalid);
}

#[test]
fn test_satisfaction_model_stops_at_first_solution() {
    let mut model = Model::new("any");
    let xs: Vec<_> = (0..12).map(|i| model.new_bool(format!("x{i}"))).collect();
    model.add_eq("half", LinearExpr::sum(xs.iter().copied()), 6);

    let outcome = BranchAndBoundBackend::new().solve(&model, &SolveParams::new());
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.stats.solutions, 1);
    let solution = outcome.solution.unwrap();
    assert_eq!(solution.objective(), None);
    assert_eq!(solution.values().iter().filter(|v| **v).count(), 6);
}

#[test]
fn test_solution_limit_stops_early() {
    let (mut model, xs) = knapsack_model(&[1, 2, 3, 4, 5, 6, 7, 8], 4);
    // Start from the most expensive choice so improvements are needed.
    for var in &xs {
        model.set_preferred_value(*var, true);
    }
    model.set_branching_order(xs.iter().rev().copied().collect());

    let counter = Arc::new(CountingObserver::new());
    let params = SolveParams::new()
        .with_observer(Arc::new(SolutionLimitObserver::new(1)))
        .with_observer(counter.clone());
    let outcome = BranchAndBoundBackend::new().solve(&model, &params);

    assert_eq!(outcome.status, SolveStatus::Feasible);
    assert_eq!(counter.count(), 1);
    assert_eq!(outcome.solution.unwrap().objective(), Some(26));
}

#[test]
fn test_hint_is_found_first() {
    let (mut model, _) = knapsack_model(&[5, 1, 4, 2, 3], 2);
    model.set_hint(vec![true, false, true, false, false]);

    let counter = Arc::new(CountingObserver::new());
    let params = SolveParams::new()
        .with_observer(Arc::new(SolutionLimitObserver::new(1)))
        .with_observer(counter.clone());
    let outcome = BranchAndBoundBackend::new().solve(&model, &params);

    assert_eq!(outcome.status, SolveStatus::Feasible);
    assert_eq!(counter.last_objective(), 9);
}

#[test]
fn test_external_stop_before_start() {
    let (model, _) = knapsack_model(&[3, 1, 2], 1);
    let flag = Arc::new(AtomicBool::new(true));
    let outcome = BranchAndBoundBackend::new()
        .solve(&model, &SolveParams::new().with_stop_flag(flag));

    assert_eq!(outcome.status, SolveStatus::Unknown);
    assert!(outcome.solution.is_none());
}

#[test]
fn test_node_limit_stops_search() {
    let (model, _) = knapsack_model(&[3, 1, 2], 1);
    let params = SolveParams::new()
        .with_time_limit(Duration::from_secs(3600))
        .with_node_limit(1);
    let outcome = BranchAndBoundBackend::new().solve(&model, &params);

    assert_eq!(outcome.status, SolveStatus::Unknown);
    assert!(outcome.solution.is_none());

    let unlimited = BranchAndBoundBackend::new().solve(&model, &SolveParams::new());
    assert_eq!(unlimited.status, SolveStatus::Optimal);
}

#[test]
fn test_zero_time_limit() {
    let (model, _) = knapsack_model(&[3, 1, 2], 1);
    let outcome = BranchAndBoundBackend::new()
        .solve(&model, &SolveParams::new().with_time_limit(Duration::ZERO));

    assert_eq!(outcome.status, SolveStatus::Unknown);
}

#[test]
fn test_frozen_objective_then_second_objective() {
    // Pairs costing 4: {x0, x1}, {x0, x4}, {x1, x3}, {x3, x4}.
    let (mut model, xs) = knapsack_model(&[1, 3, 5, 1, 3], 2);
    let cost = model.objective().unwrap();
    model.fix_int(cost, 4);
    let index_sum = model.new_linear_int(
        "index_sum",
        LinearExpr::weighted_sum(xs.iter().copied().zip([0, 1, 2, 3, 4])),
        0,
        10,
    );
    model.minimize(index_sum);

    let outcome = BranchAndBoundBackend::new().solve(&model, &SolveParams::new());
    assert_eq!(outcome.status, SolveStatus::Optimal);
    let solution = outcome.solution.unwrap();
    assert_eq!(solution.int_value(&model, cost), 4);
    assert_eq!(solution.objective(), Some(1));
}

#[test]
fn test_split_depth_defaults() {
    let backend = BranchAndBoundBackend::new();
    assert_eq!(backend.split_depth_for(1), 2);
    assert_eq!(backend.split_depth_for(2), 3);
    assert_eq!(backend.split_depth_for(3), 4);
    assert_eq!(backend.split_depth_for(4), 4);
    assert_eq!(backend.with_split_depth(1).split_depth_for(8), 1);
}
