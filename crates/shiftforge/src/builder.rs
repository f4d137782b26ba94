//! Constraint model construction for a roster problem.

use shiftforge_config::SolverConfig;
use shiftforge_core::RosterProblem;
use shiftforge_solver::{BoolVar, IntVar, LinearExpr, Model};

/// The constraint model of one roster problem.
///
/// Holds one assignment variable per `(staff, date)` pair and the linked
/// `total_cost` integer. The model is never mutated after building; each
/// phase extends its own copy.
#[derive(Debug, Clone)]
pub struct RosterModel {
    model: Model,
    // assignments[staff][day]
    assignments: Vec<Vec<BoolVar>>,
    total_cost: IntVar,
}

impl RosterModel {
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The variable for staff index `staff` working on day index `day`.
    pub fn assignment(&self, staff: usize, day: usize) -> Option<BoolVar> {
        self.assignments.get(staff).and_then(|row| row.get(day)).copied()
    }

    pub fn assignments(&self) -> &[Vec<BoolVar>] {
        &self.assignments
    }

    /// Total cost in integer cost units.
    pub fn total_cost(&self) -> IntVar {
        self.total_cost
    }

    pub fn staff_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn day_count(&self) -> usize {
        self.assignments.first().map_or(0, Vec::len)
    }

    /// Number of days `staff` works, as a linear expression.
    pub fn workload(&self, staff: usize) -> LinearExpr {
        LinearExpr::sum(self.assignments.get(staff).into_iter().flatten().copied())
    }
}

/// Builds the hard constraints and the cost objective of a problem.
///
/// # Example
///
/// ```
/// use shiftforge::ConstraintModelBuilder;
/// use shiftforge_core::{RosterProblem, RosterRequirement, StaffMember};
///
/// let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let problem = RosterProblem::new(
///     vec![RosterRequirement { date: day, required_personnel: 1 }],
///     vec![StaffMember::new("S1", "Alice", 10.0), StaffMember::new("S2", "Bob", 12.0)],
///     [],
/// );
///
/// let roster = ConstraintModelBuilder::new(&problem).build();
/// assert_eq!(roster.model().bool_count(), 2);
/// // Coverage only; the horizon is shorter than both windows.
/// assert_eq!(roster.model().constraint_count(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConstraintModelBuilder<'a> {
    problem: &'a RosterProblem,
    max_consecutive_work_days: usize,
    window_for_off_days: usize,
}

impl<'a> ConstraintModelBuilder<'a> {
    /// Creates a builder with the default window rules.
    pub fn new(problem: &'a RosterProblem) -> Self {
        Self::with_config(problem, &SolverConfig::default())
    }

    pub fn with_config(problem: &'a RosterProblem, config: &SolverConfig) -> Self {
        Self {
            problem,
            max_consecutive_work_days: config.max_consecutive_work_days,
            window_for_off_days: config.window_for_off_days,
        }
    }

    pub fn with_max_consecutive_work_days(mut self, days: usize) -> Self {
        self.max_consecutive_work_days = days;
        self
    }

    pub fn with_window_for_off_days(mut self, days: usize) -> Self {
        self.window_for_off_days = days;
        self
    }

    pub fn build(&self) -> RosterModel {
        let problem = self.problem;
        let dates: Vec<_> = problem.dates().collect();
        let day_count = dates.len();
        let mut model = Model::new("roster");

        let assignments: Vec<Vec<BoolVar>> = problem
            .staff
            .iter()
            .map(|member| {
                dates
                    .iter()
                    .map(|date| model.new_bool(format!("x_{}_{}", member.staff_id, date)))
                    .collect()
            })
            .collect();

        for (day, requirement) in problem.requirements.iter().enumerate() {
            model.add_eq(
                format!("coverage_{}", requirement.date),
                LinearExpr::sum(assignments.iter().map(|row| row[day])),
                i64::from(requirement.required_personnel),
            );
        }

        for (s, member) in problem.staff.iter().enumerate() {
            for (day, date) in dates.iter().enumerate() {
                if problem.is_on_leave(&member.staff_id, *date) {
                    model.add_eq(
                        format!("leave_{}_{}", member.staff_id, date),
                        LinearExpr::sum([assignments[s][day]]),
                        0,
                    );
                }
            }
        }

        let consecutive = self.max_consecutive_work_days + 1;
        let rest = self.window_for_off_days;
        for (s, member) in problem.staff.iter().enumerate() {
            let row = &assignments[s];
            if day_count >= consecutive {
                for start in 0..=day_count - consecutive {
                    model.add_le(
                        format!("max_consecutive_{}_{}", member.staff_id, dates[start]),
                        LinearExpr::sum(row[start..start + consecutive].iter().copied()),
                        self.max_consecutive_work_days as i64,
                    );
                }
            }
            if rest > 0 && day_count >= rest {
                for start in 0..=day_count - rest {
                    model.add_lt(
                        format!("rest_day_{}_{}", member.staff_id, dates[start]),
                        LinearExpr::sum(row[start..start + rest].iter().copied()),
                        rest as i64,
                    );
                }
            }
        }

        let mut cost = LinearExpr::new();
        for (member, row) in problem.staff.iter().zip(&assignments) {
            for var in row {
                cost.add_term(*var, member.cost_units());
            }
        }
        // Saturates; the optimizer rejects such problems before building.
        let cost_bound = problem
            .staff
            .iter()
            .try_fold(0i64, |acc, m| acc.checked_add(m.cost_units()))
            .and_then(|per_day| per_day.checked_mul(day_count as i64))
            .unwrap_or(i64::MAX);
        let total_cost = model.new_linear_int("total_cost", cost, 0, cost_bound);

        // Day by day, cheapest first, trying "works" before "off".
        let mut by_wage: Vec<usize> = (0..problem.staff_count()).collect();
        by_wage.sort_by_key(|&s| problem.staff[s].cost_units());
        let order: Vec<BoolVar> = (0..day_count)
            .flat_map(|day| by_wage.iter().map(move |&s| (s, day)))
            .map(|(s, day)| assignments[s][day])
            .collect();
        for var in &order {
            model.set_preferred_value(*var, true);
        }
        model.set_branching_order(order);

        RosterModel {
            model,
            assignments,
            total_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftforge_core::{LeaveRecord, RosterRequirement, StaffMember};
    use shiftforge_test::fixtures::{day, trivial_week};

    fn names(model: &Model, prefix: &str) -> usize {
        model
            .constraints()
            .iter()
            .filter(|c| c.name.starts_with(prefix))
            .count()
    }

    #[test]
    fn test_trivial_week_constraint_counts() {
        let problem = trivial_week().problem();
        let roster = ConstraintModelBuilder::new(&problem).build();
        let model = roster.model();

        assert_eq!(model.bool_count(), 21);
        assert_eq!(names(model, "coverage_"), 7);
        assert_eq!(names(model, "leave_"), 0);
        // Windows of six days: two per staff member.
        assert_eq!(names(model, "max_consecutive_"), 6);
        // One full seven-day window per staff member.
        assert_eq!(names(model, "rest_day_"), 3);
    }

    #[test]
    fn test_short_horizon_skips_windows() {
        let problem = RosterProblem::new(
            (0..4)
                .map(|n| RosterRequirement {
                    date: day(n),
                    required_personnel: 1,
                })
                .collect(),
            vec![StaffMember::new("S1", "Alice", 10.0)],
            [],
        );
        let roster = ConstraintModelBuilder::new(&problem).build();
        assert_eq!(names(roster.model(), "max_consecutive_"), 0);
        assert_eq!(names(roster.model(), "rest_day_"), 0);

        let tight = ConstraintModelBuilder::new(&problem)
            .with_max_consecutive_work_days(2)
            .with_window_for_off_days(4)
            .build();
        assert_eq!(names(tight.model(), "max_consecutive_"), 2);
        assert_eq!(names(tight.model(), "rest_day_"), 1);
    }

    #[test]
    fn test_leave_and_cost_link() {
        let problem = RosterProblem::new(
            vec![RosterRequirement {
                date: day(0),
                required_personnel: 1,
            }],
            vec![
                StaffMember::new("S1", "Alice", 10.5),
                StaffMember::new("S2", "Bob", 20.0),
            ],
            [LeaveRecord {
                staff_id: "S1".to_string(),
                date: day(0),
            }],
        );
        let roster = ConstraintModelBuilder::new(&problem).build();
        let model = roster.model();

        let leave: Vec<_> = model
            .constraints()
            .iter()
            .filter(|c| c.name.starts_with("leave_"))
            .collect();
        assert_eq!(leave.len(), 1);
        assert_eq!((leave[0].lo, leave[0].hi), (0, 0));

        let def = model.int_var(roster.total_cost()).unwrap();
        assert_eq!((def.lo, def.hi), (0, 30_500_000));
        assert_eq!(model.evaluate_int(roster.total_cost(), &[true, true]), 30_500_000);
        assert_eq!(model.evaluate_int(roster.total_cost(), &[false, true]), 20_000_000);
    }

    #[test]
    fn test_branching_prefers_cheapest_per_day() {
        let problem = RosterProblem::new(
            (0..2)
                .map(|n| RosterRequirement {
                    date: day(n),
                    required_personnel: 1,
                })
                .collect(),
            vec![
                StaffMember::new("S1", "Alice", 30.0),
                StaffMember::new("S2", "Bob", 10.0),
            ],
            [],
        );
        let roster = ConstraintModelBuilder::new(&problem).build();
        let order = roster.model().branching_order();

        assert_eq!(order[0], roster.assignment(1, 0).unwrap());
        assert_eq!(order[1], roster.assignment(0, 0).unwrap());
        assert_eq!(order[2], roster.assignment(1, 1).unwrap());
        assert!(order.iter().all(|v| roster.model().first_value(*v)));
        assert_eq!(roster.workload(1).terms().len(), 2);
    }
}
