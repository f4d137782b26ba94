//! Exhaustive reference solver for small instances.
//!
//! Enumerates every schedule that meets the coverage, leave and window rules
//! and reports the lexicographic optimum: the minimum total cost, then the
//! minimum fairness gap among schedules at that cost.

use shiftforge_core::RosterProblem;

/// Lexicographic optimum of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceOptimum {
    /// Minimum total cost in integer cost units.
    pub cost_units: i64,
    /// Minimum fairness gap among cost-optimal schedules.
    pub fairness_gap: usize,
    /// Number of schedules that satisfy every hard rule.
    pub feasible_schedules: u64,
}

impl ReferenceOptimum {
    pub fn total_cost(&self) -> f64 {
        self.cost_units as f64 / shiftforge_core::COST_UNITS_PER_WAGE as f64
    }
}

struct Enumeration<'a> {
    problem: &'a RosterProblem,
    max_consecutive: usize,
    window: usize,
    wages: Vec<i64>,
    // works[staff][day]
    works: Vec<Vec<bool>>,
    best: Option<(i64, usize)>,
    feasible: u64,
}

impl Enumeration<'_> {
    fn window_ok(&self, staff: usize, day: usize, length: usize, limit: usize) -> bool {
        if day + 1 < length {
            return true;
        }
        let worked = self.works[staff][day + 1 - length..=day]
            .iter()
            .filter(|w| **w)
            .count();
        worked <= limit
    }

    fn visit(&mut self, day: usize, cost: i64) {
        let problem = self.problem;
        if day == problem.day_count() {
            let loads: Vec<usize> = self
                .works
                .iter()
                .map(|row| row.iter().filter(|w| **w).count())
                .collect();
            let gap = loads.iter().max().unwrap_or(&0) - loads.iter().min().unwrap_or(&0);
            self.feasible += 1;
            self.best = match self.best {
                Some(best) if best <= (cost, gap) => Some(best),
                _ => Some((cost, gap)),
            };
            return;
        }

        let requirement = &problem.requirements[day];
        let staff_count = problem.staff_count();
        let required = requirement.required_personnel as usize;
        for mask in 0u32..(1u32 << staff_count) {
            if mask.count_ones() as usize != required {
                continue;
            }
            let members: Vec<usize> = (0..staff_count)
                .filter(|&s| mask & (1u32 << s) != 0)
                .collect();
            if members
                .iter()
                .any(|&s| problem.is_on_leave(&problem.staff[s].staff_id, requirement.date))
            {
                continue;
            }

            let mut extra = 0;
            for &s in &members {
                self.works[s][day] = true;
                extra += self.wages[s];
            }
            let valid = (0..staff_count).all(|s| {
                self.window_ok(s, day, self.max_consecutive + 1, self.max_consecutive)
                    && self.window_ok(s, day, self.window, self.window.saturating_sub(1))
            });
            if valid {
                self.visit(day + 1, cost + extra);
            }
            for &s in &members {
                self.works[s][day] = false;
            }
        }
    }
}

/// Solves `problem` by exhaustive enumeration.
///
/// Returns `None` when no schedule satisfies the hard rules. Intended for
/// instances with at most a handful of staff and days.
pub fn solve_exhaustively(
    problem: &RosterProblem,
    max_consecutive: usize,
    window: usize,
) -> Option<ReferenceOptimum> {
    assert!(problem.staff_count() < 16, "too many staff to enumerate");
    let mut enumeration = Enumeration {
        problem,
        max_consecutive,
        window,
        wages: problem.staff.iter().map(|s| s.cost_units()).collect(),
        works: vec![vec![false; problem.day_count()]; problem.staff_count()],
        best: None,
        feasible: 0,
    };
    enumeration.visit(0, 0);

    enumeration
        .best
        .map(|(cost_units, fairness_gap)| ReferenceOptimum {
            cost_units,
            fairness_gap,
            feasible_schedules: enumeration.feasible,
        })
}
