//! Depth-first branch and bound over one subtree.

use crate::model::Model;
use crate::observer::ObserverSupport;
use crate::propagation::{Conflict, Domains, Propagator};
use crate::scope::SolveScope;
use crate::termination::Termination;

/// A branching decision that can still be flipped.
#[derive(Debug, Clone, Copy)]
struct Frame {
    var: usize,
    mark: usize,
    alternative: Option<bool>,
}

/// Read-only search context shared by all workers.
#[derive(Debug)]
pub(crate) struct Search<'a, T: Termination> {
    pub(crate) model: &'a Model,
    pub(crate) propagator: Propagator<'a>,
    pub(crate) order: Vec<usize>,
    pub(crate) first_values: Vec<bool>,
    pub(crate) scope: &'a SolveScope,
    pub(crate) termination: &'a T,
    pub(crate) observers: &'a ObserverSupport,
}

impl<T: Termination> Search<'_, T> {
    /// Inclusive objective bound implied by the incumbent.
    fn cap(&self) -> Option<i64> {
        self.scope.best_objective().map(|best| best.saturating_sub(1))
    }

    pub(crate) fn next_var(&self, domains: &Domains) -> Option<usize> {
        self.order
            .iter()
            .copied()
            .find(|&var| domains.value(var).is_none())
    }

    /// Propagates a freshly created root.
    pub(crate) fn propagate_root(&self, domains: &mut Domains) -> Result<(), Conflict> {
        self.scope.record_node();
        self.propagator.propagate_all(domains, self.cap())
    }

    /// Splits the root into independent subtrees by fixing up to `depth`
    /// branching variables. Subtrees that fail propagation are dropped.
    pub(crate) fn split(&self, root: Domains, depth: usize) -> Vec<Domains> {
        let mut frontier = vec![root];
        for _ in 0..depth {
            let mut next = Vec::with_capacity(frontier.len() * 2);
            for domains in frontier {
                let Some(var) = self.next_var(&domains) else {
                    next.push(domains);
                    continue;
                };
                let first = self.first_values[var];
                for value in [first, !first] {
                    let mut child = domains.clone();
                    child.assign(var, value);
                    self.scope.record_node();
                    if self.propagator.propagate(&mut child, None).is_ok() {
                        next.push(child);
                    }
                }
            }
            frontier = next;
        }
        frontier
    }

    /// Exhausts the subtree below `domains` unless the search is stopped.
    pub(crate) fn run(&self, mut domains: Domains) {
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            if self.scope.is_stopped() {
                return;
            }
            self.scope.record_node();
            if self.termination.is_terminated(self.scope) {
                self.scope.interrupt();
                return;
            }

            if self.propagator.propagate(&mut domains, self.cap()).is_ok() {
                match self.next_var(&domains) {
                    Some(var) => {
                        let value = self.first_values[var];
                        stack.push(Frame {
                            var,
                            mark: domains.mark(),
                            alternative: Some(!value),
                        });
                        domains.assign(var, value);
                        continue;
                    }
                    None => self.record_solution(&domains),
                }
            }

            // Backtrack to the deepest decision with an untried value.
            loop {
                let Some(frame) = stack.last_mut() else {
                    return;
                };
                domains.undo_to(frame.mark);
                if let Some(value) = frame.alternative.take() {
                    domains.assign(frame.var, value);
                    break;
                }
                stack.pop();
            }
        }
    }

    fn record_solution(&self, domains: &Domains) {
        debug_assert!(domains.is_complete());
        let values = domains.to_values();
        let objective = self
            .model
            .objective()
            .map(|var| self.model.evaluate_int(var, &values));
        self.scope.offer(values, objective, self.observers);
        if objective.is_none() {
            self.scope.finish();
        }
    }
}
