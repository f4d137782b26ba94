//! Built-in branch-and-bound backend.
//!
//! Depth-first search over the model's boolean variables with bounds
//! propagation at every node. Every improving solution tightens an objective
//! cut that prunes the rest of the tree, so an exhausted search proves
//! optimality.
//!
//! With more than one worker the root is split into independent subtrees
//! which run on a rayon thread pool and share the incumbent.

mod worker;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, trace, warn};

use crate::backend::{SolveOutcome, SolveParams, SolveStatus, SolverBackend};
use crate::model::Model;
use crate::propagation::{Domains, Propagator};
use crate::scope::SolveScope;
use crate::stats::SolveStats;
use crate::termination::{
    ExternalTermination, NodeCountTermination, OrTermination, TimeTermination,
};

use worker::Search;

/// Depth-first branch and bound with bounds propagation.
///
/// # Example
///
/// ```
/// use shiftforge_solver::{BranchAndBoundBackend, LinearExpr, Model, SolveParams, SolveStatus, SolverBackend};
///
/// let mut model = Model::new("cheapest-two");
/// let x: Vec<_> = (0..4).map(|i| model.new_bool(format!("x{}", i))).collect();
/// model.add_eq("two", LinearExpr::sum(x.iter().copied()), 2);
/// let cost = model.new_linear_int(
///     "cost",
///     LinearExpr::weighted_sum([(x[0], 4), (x[1], 1), (x[2], 3), (x[3], 2)]),
///     0,
///     10,
/// );
/// model.minimize(cost);
///
/// let outcome = BranchAndBoundBackend::new().solve(&model, &SolveParams::new());
/// assert_eq!(outcome.status, SolveStatus::Optimal);
/// assert_eq!(outcome.solution.unwrap().objective(), Some(3));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BranchAndBoundBackend {
    split_depth: Option<usize>,
}

impl BranchAndBoundBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes how many variables are branched on to split work between
    /// workers. Defaults to `ceil(log2(workers)) + 2`.
    pub fn with_split_depth(mut self, depth: usize) -> Self {
        self.split_depth = Some(depth);
        self
    }

    fn split_depth_for(&self, workers: usize) -> usize {
        self.split_depth.unwrap_or_else(|| {
            let log2 = usize::BITS - (workers.max(1) - 1).leading_zeros();
            log2 as usize + 2
        })
    }
}

/// Stops on whichever configured limit is reached first.
type SearchTermination = OrTermination<(
    Option<TimeTermination>,
    Option<NodeCountTermination>,
    Option<ExternalTermination>,
)>;

fn termination(params: &SolveParams) -> SearchTermination {
    OrTermination::new((
        params.time_limit().map(TimeTermination::new),
        params.node_limit().map(NodeCountTermination::new),
        params.stop_flag().cloned().map(ExternalTermination::new),
    ))
}

impl SolverBackend for BranchAndBoundBackend {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn solve(&self, model: &Model, params: &SolveParams) -> SolveOutcome {
        if let Err(err) = model.validate() {
            warn!(event = "model_invalid", model = model.name(), error = %err);
            return SolveOutcome::model_invalid();
        }

        let workers = params.workers();
        let scope = SolveScope::new(workers);
        let termination = termination(params);
        let branching = model.branching_order();
        let mut first_values = vec![false; model.bool_count()];
        for &var in &branching {
            first_values[var.index()] = model.first_value(var);
        }
        let order: Vec<usize> = branching.iter().map(|var| var.index()).collect();

        debug!(
            event = "search_start",
            model = model.name(),
            bools = model.bool_count(),
            constraints = model.constraint_count(),
            workers = workers,
        );

        let search = Search {
            model,
            propagator: Propagator::new(model),
            order,
            first_values,
            scope: &scope,
            termination: &termination,
            observers: params.observers(),
        };

        let mut root = Domains::new(model.bool_count());
        if search.propagate_root(&mut root).is_ok() {
            if workers <= 1 {
                search.run(root);
            } else {
                let depth = self.split_depth_for(workers);
                let subtrees = search.split(root, depth);
                trace!(event = "split", depth, subtrees = subtrees.len());
                match ThreadPoolBuilder::new().num_threads(workers).build() {
                    Ok(pool) => pool.install(|| {
                        subtrees
                            .into_par_iter()
                            .for_each(|subtree| search.run(subtree))
                    }),
                    Err(err) => {
                        warn!(event = "thread_pool_failed", error = %err, "searching sequentially");
                        subtrees.into_iter().for_each(|subtree| search.run(subtree));
                    }
                }
            }
        }

        let solution = scope.take_incumbent();
        let interrupted = scope.is_interrupted();
        let status = match (&solution, interrupted) {
            (Some(_), false) => SolveStatus::Optimal,
            (Some(_), true) if model.objective().is_none() => SolveStatus::Optimal,
            (Some(_), true) => SolveStatus::Feasible,
            (None, false) => SolveStatus::Infeasible,
            (None, true) => SolveStatus::Unknown,
        };
        let stats = SolveStats {
            nodes: scope.node_count(),
            solutions: scope.solution_count(),
            elapsed: scope.elapsed(),
            workers,
        };

        debug!(
            event = "search_end",
            model = model.name(),
            status = %status,
            nodes = stats.nodes,
            solutions = stats.solutions,
            duration_ms = stats.elapsed.as_millis() as u64,
        );

        SolveOutcome {
            status,
            solution,
            stats,
        }
    }
}

#[cfg(test)]
mod tests;
