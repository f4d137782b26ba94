//! Input table fixtures.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shiftforge_core::{RosterProblem, Table, Value};

/// The three input tables of one optimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub roster: Table,
    pub staff: Table,
    pub leave: Table,
}

impl Instance {
    /// Typed view of the tables.
    ///
    /// # Panics
    ///
    /// Panics if the fixture tables do not form a valid problem.
    pub fn problem(&self) -> RosterProblem {
        RosterProblem::from_tables(&self.roster, &self.staff, &self.leave)
            .expect("fixture tables should form a valid problem")
    }
}

/// Creates a date, panicking on an invalid calendar date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// First date of every fixture horizon (a Monday).
pub fn horizon_start() -> NaiveDate {
    date(2024, 1, 1)
}

/// The `n`th date of the fixture horizon.
pub fn day(n: usize) -> NaiveDate {
    horizon_start() + Duration::days(n as i64)
}

/// Roster table with one row per entry of `required`, on consecutive dates.
pub fn roster_table(required: &[u32]) -> Table {
    let mut table = Table::new(["date", "required_personnel"]);
    for (n, &count) in required.iter().enumerate() {
        table
            .push_row([Value::Date(day(n)), Value::from(count)])
            .expect("roster row width");
    }
    table
}

/// Staff table from `(staff_id, name, wage)` triples.
pub fn staff_table(members: &[(&str, &str, f64)]) -> Table {
    let mut table = Table::new(["staff_id", "name", "wage"]);
    for &(id, name, wage) in members {
        table
            .push_row([Value::from(id), Value::from(name), Value::from(wage)])
            .expect("staff row width");
    }
    table
}

/// Leave table from `(staff_id, day index)` pairs.
pub fn leave_table(records: &[(&str, usize)]) -> Table {
    let mut table = Table::new(["staff_id", "date"]);
    for &(id, n) in records {
        table
            .push_row([Value::from(id), Value::Date(day(n))])
            .expect("leave row width");
    }
    table
}

/// Three staff with wages 10, 20 and 30; one person needed on each of seven
/// days; no leave.
pub fn trivial_week() -> Instance {
    Instance {
        roster: roster_table(&[1; 7]),
        staff: staff_table(&[
            ("S1", "Alice", 10.0),
            ("S2", "Bob", 20.0),
            ("S3", "Carol", 30.0),
        ]),
        leave: leave_table(&[]),
    }
}

/// Two staff, both needed on each of three days, one of them on leave
/// throughout.
pub fn infeasible_leave() -> Instance {
    Instance {
        roster: roster_table(&[2, 2, 2]),
        staff: staff_table(&[("S1", "Alice", 10.0), ("S2", "Bob", 12.0)]),
        leave: leave_table(&[("S2", 0), ("S2", 1), ("S2", 2)]),
    }
}

/// A staff table without its `wage` column.
pub fn missing_wage() -> Instance {
    let mut staff = Table::new(["staff_id", "name"]);
    staff
        .push_row([Value::from("S1"), Value::from("Alice")])
        .expect("staff row width");
    Instance {
        roster: roster_table(&[1, 1]),
        staff,
        leave: leave_table(&[]),
    }
}

/// Four staff over two weeks with some leave; small enough to solve quickly.
pub fn two_weeks() -> Instance {
    Instance {
        roster: roster_table(&[2, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 2, 1, 1]),
        staff: staff_table(&[
            ("S1", "Alice", 18.0),
            ("S2", "Bob", 15.5),
            ("S3", "Carol", 21.0),
            ("S4", "Dan", 15.5),
        ]),
        leave: leave_table(&[("S2", 2), ("S2", 3), ("S4", 9)]),
    }
}

/// Shape of a generated instance.
#[derive(Debug, Clone, Copy)]
pub struct RandomInstanceConfig {
    pub staff: usize,
    pub days: usize,
    pub max_required: u32,
    pub max_wage: u32,
    pub leave_probability: f64,
}

impl Default for RandomInstanceConfig {
    fn default() -> Self {
        Self {
            staff: 3,
            days: 5,
            max_required: 2,
            max_wage: 30,
            leave_probability: 0.15,
        }
    }
}

/// Generates a reproducible random instance. It may be infeasible.
pub fn random_instance(seed: u64, config: RandomInstanceConfig) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    let max_required = config.max_required.min(config.staff as u32);

    let required: Vec<u32> = (0..config.days)
        .map(|_| rng.random_range(0..=max_required))
        .collect();

    let ids: Vec<String> = (0..config.staff).map(|i| format!("S{}", i + 1)).collect();
    let names: Vec<String> = (0..config.staff).map(|i| format!("Staff {}", i + 1)).collect();
    let members: Vec<(&str, &str, f64)> = ids
        .iter()
        .zip(&names)
        .map(|(id, name)| {
            let wage = rng.random_range(1..=config.max_wage.max(1));
            (id.as_str(), name.as_str(), f64::from(wage))
        })
        .collect();

    let mut leave = Vec::new();
    for id in &ids {
        for n in 0..config.days {
            if rng.random_bool(config.leave_probability) {
                leave.push((id.as_str(), n));
            }
        }
    }

    Instance {
        roster: roster_table(&required),
        staff: staff_table(&members),
        leave: leave_table(&leave),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_week_shape() {
        let problem = trivial_week().problem();
        assert_eq!(problem.day_count(), 7);
        assert_eq!(problem.staff_count(), 3);
        assert!(problem.leave.is_empty());
    }

    #[test]
    fn test_random_instance_is_reproducible() {
        let config = RandomInstanceConfig::default();
        assert_eq!(random_instance(7, config), random_instance(7, config));
        let problem = random_instance(7, config).problem();
        assert_eq!(problem.day_count(), 5);
        assert!(problem
            .requirements
            .iter()
            .all(|r| r.required_personnel <= 2));
    }
}
