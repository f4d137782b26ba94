//! Hard-rule checker for produced schedules.

use std::fmt;

use chrono::NaiveDate;
use shiftforge_core::{RosterProblem, Schedule, StaffId};

/// A broken hard rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A date has the wrong number of people.
    Coverage {
        date: NaiveDate,
        required: u32,
        scheduled: usize,
    },
    /// Someone is scheduled on a leave day.
    Leave { staff_id: StaffId, date: NaiveDate },
    /// Someone works every day of a `max_consecutive + 1` window.
    Consecutive { staff_id: StaffId, start: NaiveDate },
    /// Someone has no day off in a rest window.
    RestDay { staff_id: StaffId, start: NaiveDate },
    /// A row names staff or a date outside the problem.
    UnknownRow { staff_id: StaffId, date: NaiveDate },
    /// The same person appears twice on one date.
    Duplicate { staff_id: StaffId, date: NaiveDate },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Coverage {
                date,
                required,
                scheduled,
            } => write!(f, "{date}: {scheduled} scheduled, {required} required"),
            Violation::Leave { staff_id, date } => write!(f, "{staff_id} works on leave {date}"),
            Violation::Consecutive { staff_id, start } => {
                write!(f, "{staff_id} exceeds consecutive days from {start}")
            }
            Violation::RestDay { staff_id, start } => {
                write!(f, "{staff_id} has no day off in window from {start}")
            }
            Violation::UnknownRow { staff_id, date } => {
                write!(f, "unknown row {staff_id} on {date}")
            }
            Violation::Duplicate { staff_id, date } => {
                write!(f, "{staff_id} scheduled twice on {date}")
            }
        }
    }
}

/// Checks `schedule` against every hard rule of `problem`.
///
/// Windows run over the problem's sorted roster dates.
pub fn check_schedule(
    problem: &RosterProblem,
    schedule: &Schedule,
    max_consecutive: usize,
    window: usize,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let dates: Vec<NaiveDate> = problem.dates().collect();
    let day_index = |date: NaiveDate| dates.binary_search(&date).ok();
    let staff_index =
        |id: &str| problem.staff.iter().position(|s| s.staff_id == id);

    let mut works = vec![vec![false; dates.len()]; problem.staff_count()];
    for row in schedule.rows() {
        match (staff_index(&row.staff_id), day_index(row.date)) {
            (Some(s), Some(d)) => {
                if works[s][d] {
                    violations.push(Violation::Duplicate {
                        staff_id: row.staff_id.clone(),
                        date: row.date,
                    });
                }
                works[s][d] = true;
                if problem.is_on_leave(&row.staff_id, row.date) {
                    violations.push(Violation::Leave {
                        staff_id: row.staff_id.clone(),
                        date: row.date,
                    });
                }
            }
            _ => violations.push(Violation::UnknownRow {
                staff_id: row.staff_id.clone(),
                date: row.date,
            }),
        }
    }

    for (d, requirement) in problem.requirements.iter().enumerate() {
        let scheduled = works.iter().filter(|w| w[d]).count();
        if scheduled != requirement.required_personnel as usize {
            violations.push(Violation::Coverage {
                date: requirement.date,
                required: requirement.required_personnel,
                scheduled,
            });
        }
    }

    for (s, member) in problem.staff.iter().enumerate() {
        let row = &works[s];
        let full_windows = |length: usize| {
            (0..dates.len().saturating_sub(length.saturating_sub(1)))
                .filter(move |&start| length > 0 && start + length <= row.len())
                .filter(move |&start| row[start..start + length].iter().all(|w| *w))
        };
        for start in full_windows(max_consecutive + 1) {
            violations.push(Violation::Consecutive {
                staff_id: member.staff_id.clone(),
                start: dates[start],
            });
        }
        for start in full_windows(window) {
            violations.push(Violation::RestDay {
                staff_id: member.staff_id.clone(),
                start: dates[start],
            });
        }
    }

    violations
}
