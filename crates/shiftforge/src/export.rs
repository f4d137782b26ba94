//! Projection of a solver assignment onto the output schedule.

use shiftforge_core::{RosterProblem, Schedule, ScheduleRow};
use shiftforge_solver::Solution;

use crate::builder::RosterModel;

/// Converts the final assignment into schedule rows.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleExporter<'a> {
    problem: &'a RosterProblem,
    roster: &'a RosterModel,
}

impl<'a> ScheduleExporter<'a> {
    pub fn new(problem: &'a RosterProblem, roster: &'a RosterModel) -> Self {
        Self { problem, roster }
    }

    /// One row per true assignment, ordered by date then staff order.
    pub fn export(&self, solution: &Solution) -> Schedule {
        let mut rows = Vec::new();
        for (day, requirement) in self.problem.requirements.iter().enumerate() {
            let before = rows.len();
            for (s, member) in self.problem.staff.iter().enumerate() {
                let works = self
                    .roster
                    .assignment(s, day)
                    .is_some_and(|var| solution.value(var));
                if works {
                    rows.push(ScheduleRow {
                        date: requirement.date,
                        staff_id: member.staff_id.clone(),
                        name: member.name.clone(),
                    });
                }
            }
            debug_assert_eq!(
                rows.len() - before,
                requirement.required_personnel as usize,
                "coverage broken on {}",
                requirement.date
            );
        }
        Schedule::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConstraintModelBuilder;
    use shiftforge_test::fixtures::{day, trivial_week};

    #[test]
    fn test_rows_follow_date_then_staff_order() {
        let problem = trivial_week().problem();
        let roster = ConstraintModelBuilder::new(&problem).build();

        // Alice on days 0..6, Bob on day 6.
        let mut values = vec![false; roster.model().bool_count()];
        for d in 0..6 {
            values[roster.assignment(0, d).unwrap().index()] = true;
        }
        values[roster.assignment(1, 6).unwrap().index()] = true;

        let schedule = ScheduleExporter::new(&problem, &roster).export(&Solution::new(values, None));
        assert_eq!(schedule.len(), 7);
        assert_eq!(schedule.rows()[0].date, day(0));
        assert_eq!(schedule.rows()[0].name, "Alice");
        assert_eq!(schedule.rows()[6].staff_id, "S2");
        assert_eq!(schedule.dates_for("S1").len(), 6);
    }
}
