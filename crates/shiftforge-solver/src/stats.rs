//! Search statistics.

use std::time::Duration;

/// Aggregate metrics for one solve call.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use shiftforge_solver::stats::SolveStats;
///
/// let stats = SolveStats {
///     nodes: 2_000,
///     solutions: 3,
///     elapsed: Duration::from_millis(500),
///     workers: 2,
/// };
/// assert_eq!(stats.nodes_per_second(), 4_000.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Search nodes visited across all workers.
    pub nodes: u64,
    /// Improving solutions found.
    pub solutions: u64,
    /// Wall-clock time spent searching.
    pub elapsed: Duration,
    /// Workers that took part in the search.
    pub workers: usize,
}

impl SolveStats {
    /// Returns the node throughput.
    pub fn nodes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.nodes as f64 / secs
        } else {
            0.0
        }
    }
}
