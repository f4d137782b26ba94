//! Node-count termination.

use super::Termination;
use crate::scope::SolveScope;

/// Terminates after visiting a number of search nodes across all workers.
#[derive(Debug, Clone)]
pub struct NodeCountTermination {
    limit: u64,
}

impl NodeCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for NodeCountTermination {
    fn is_terminated(&self, scope: &SolveScope) -> bool {
        scope.node_count() >= self.limit
    }
}
