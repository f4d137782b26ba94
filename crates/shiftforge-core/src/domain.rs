//! Typed domain records built from validated input tables.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ShiftForgeError};
use crate::table::{Row, Table, Value};
use crate::validation::InputTable;

/// Unique staff identifier.
pub type StaffId = String;

/// Integer cost units per wage unit. Wages carry at most six decimals.
pub const COST_UNITS_PER_WAGE: i64 = 1_000_000;

// 2^53: larger unit counts are not exact in an f64.
const MAX_EXACT_UNITS: f64 = 9_007_199_254_740_992.0;

/// Number of staff required on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRequirement {
    pub date: NaiveDate,
    pub required_personnel: u32,
}

/// A member of staff and the cost of assigning them for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub staff_id: StaffId,
    pub name: String,
    pub wage: f64,
}

impl StaffMember {
    pub fn new(staff_id: impl Into<StaffId>, name: impl Into<String>, wage: f64) -> Self {
        Self {
            staff_id: staff_id.into(),
            name: name.into(),
            wage,
        }
    }

    /// Daily wage in integer cost units, rounded to the nearest unit.
    pub fn cost_units(&self) -> i64 {
        (self.wage * COST_UNITS_PER_WAGE as f64).round() as i64
    }

    /// Daily wage in integer cost units, failing where rounding would
    /// change the wage.
    pub fn exact_cost_units(&self) -> std::result::Result<i64, String> {
        if !self.wage.is_finite() || self.wage < 0.0 {
            return Err("must be a non-negative finite number".to_string());
        }
        let scaled = self.wage * COST_UNITS_PER_WAGE as f64;
        if scaled > MAX_EXACT_UNITS {
            return Err("is too large".to_string());
        }
        let units = scaled.round();
        if (scaled - units).abs() > 1e-9 * units.max(1.0) {
            return Err("has more than six decimal places".to_string());
        }
        Ok(units as i64)
    }
}

/// Pre-approved leave: the staff member is unavailable on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeaveRecord {
    pub staff_id: StaffId,
    pub date: NaiveDate,
}

/// Returns an empty leave table with the required columns.
pub fn empty_leave_table() -> Table {
    Table::new(InputTable::Leave.required_columns().iter().copied())
}

/// The typed optimization problem.
///
/// Requirements are sorted by date; staff keep their table order, which is
/// also the tie-break order of the exported schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterProblem {
    pub requirements: Vec<RosterRequirement>,
    pub staff: Vec<StaffMember>,
    pub leave: BTreeSet<LeaveRecord>,
}

impl RosterProblem {
    /// Creates a problem from typed records.
    pub fn new(
        mut requirements: Vec<RosterRequirement>,
        staff: Vec<StaffMember>,
        leave: impl IntoIterator<Item = LeaveRecord>,
    ) -> Self {
        requirements.sort_by_key(|r| r.date);
        Self {
            requirements,
            staff,
            leave: leave.into_iter().collect(),
        }
    }

    /// Builds a problem from schema-validated tables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for cells that cannot be read as the column's
    /// type or wages that fail [`RosterProblem::check_costs`], and
    /// `DuplicateKey` for repeated roster dates or staff ids.
    pub fn from_tables(roster: &Table, staff: &Table, leave: &Table) -> Result<Self> {
        let mut requirements = Vec::with_capacity(roster.len());
        let mut seen_dates = BTreeSet::new();
        for (idx, row) in roster.rows().enumerate() {
            let date = read_date(&row, InputTable::Roster, idx, "date")?;
            let required = read_cell(&row, InputTable::Roster, idx, "required_personnel", |v| {
                match v.as_i64() {
                    Some(n) if n < 0 => Err("must be non-negative".to_string()),
                    Some(n) => u32::try_from(n).map_err(|_| "is too large".to_string()),
                    None => Err("expected an integer".to_string()),
                }
            })?;
            if !seen_dates.insert(date) {
                return Err(ShiftForgeError::DuplicateKey {
                    table: InputTable::Roster,
                    key: date.to_string(),
                });
            }
            requirements.push(RosterRequirement {
                date,
                required_personnel: required,
            });
        }

        let mut members = Vec::with_capacity(staff.len());
        let mut seen_ids = BTreeSet::new();
        for (idx, row) in staff.rows().enumerate() {
            let staff_id = read_key(&row, InputTable::Staff, idx, "staff_id")?;
            let name = read_cell(&row, InputTable::Staff, idx, "name", |v| match v {
                Value::Null => Err("expected a name".to_string()),
                other => Ok(other.to_string()),
            })?;
            let wage = read_cell(&row, InputTable::Staff, idx, "wage", |v| match v.as_f64() {
                Some(w) if w.is_finite() && w >= 0.0 => Ok(w),
                Some(_) => Err("must be a non-negative finite number".to_string()),
                None => Err("expected a number".to_string()),
            })?;
            if !seen_ids.insert(staff_id.clone()) {
                return Err(ShiftForgeError::DuplicateKey {
                    table: InputTable::Staff,
                    key: staff_id,
                });
            }
            members.push(StaffMember {
                staff_id,
                name,
                wage,
            });
        }

        let mut records = BTreeSet::new();
        for (idx, row) in leave.rows().enumerate() {
            let staff_id = read_key(&row, InputTable::Leave, idx, "staff_id")?;
            let date = read_date(&row, InputTable::Leave, idx, "date")?;
            if !seen_ids.contains(&staff_id) || !seen_dates.contains(&date) {
                debug!(
                    event = "leave_ignored",
                    staff_id = %staff_id,
                    date = %date,
                    "leave record outside the roster is ignored"
                );
                continue;
            }
            records.insert(LeaveRecord { staff_id, date });
        }

        let problem = Self::new(requirements, members, records);
        problem.check_costs()?;
        Ok(problem)
    }

    /// Checks that every wage converts to cost units exactly and that
    /// staffing every member on every day stays within `i64`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` on the `wage` column of the first offending
    /// staff row.
    pub fn check_costs(&self) -> Result<()> {
        let days = i64::try_from(self.day_count()).unwrap_or(i64::MAX);
        let mut total: i64 = 0;
        for (idx, member) in self.staff.iter().enumerate() {
            let invalid = |reason: String| ShiftForgeError::InvalidValue {
                table: InputTable::Staff,
                row: idx,
                column: "wage".to_string(),
                reason: format!("{} (got {})", reason, member.wage),
            };
            let units = member.exact_cost_units().map_err(&invalid)?;
            total = units
                .checked_mul(days)
                .and_then(|cost| total.checked_add(cost))
                .ok_or_else(|| invalid("puts the total cost out of range".to_string()))?;
        }
        Ok(())
    }

    pub fn day_count(&self) -> usize {
        self.requirements.len()
    }

    pub fn staff_count(&self) -> usize {
        self.staff.len()
    }

    /// Dates of the horizon in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.requirements.iter().map(|r| r.date)
    }

    pub fn is_on_leave(&self, staff_id: &str, date: NaiveDate) -> bool {
        self.leave.contains(&LeaveRecord {
            staff_id: staff_id.to_string(),
            date,
        })
    }

    pub fn staff_member(&self, staff_id: &str) -> Option<&StaffMember> {
        self.staff.iter().find(|s| s.staff_id == staff_id)
    }
}

fn read_cell<T>(
    row: &Row<'_>,
    table: InputTable,
    idx: usize,
    column: &str,
    parse: impl FnOnce(&Value) -> std::result::Result<T, String>,
) -> Result<T> {
    let value = row.get(column).unwrap_or(&Value::Null);
    parse(value).map_err(|reason| ShiftForgeError::InvalidValue {
        table,
        row: idx,
        column: column.to_string(),
        reason: format!("{} (got {})", reason, value),
    })
}

fn read_date(row: &Row<'_>, table: InputTable, idx: usize, column: &str) -> Result<NaiveDate> {
    read_cell(row, table, idx, column, |v| {
        v.as_date()
            .ok_or_else(|| "expected an ISO date (YYYY-MM-DD)".to_string())
    })
}

fn read_key(row: &Row<'_>, table: InputTable, idx: usize, column: &str) -> Result<StaffId> {
    read_cell(row, table, idx, column, |v| {
        v.as_key()
            .ok_or_else(|| "expected a staff id".to_string())
    })
}

/// One row of the output schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub date: NaiveDate,
    pub staff_id: StaffId,
    pub name: String,
}

/// The optimizer's output: rows ordered by date, then staff order.
///
/// A schedule is either complete or empty; zero rows signals failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    rows: Vec<ScheduleRow>,
}

impl Schedule {
    pub fn new(rows: Vec<ScheduleRow>) -> Self {
        Self { rows }
    }

    /// The failure schedule.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows scheduled on `date`.
    pub fn rows_on(&self, date: NaiveDate) -> impl Iterator<Item = &ScheduleRow> + '_ {
        self.rows.iter().filter(move |r| r.date == date)
    }

    /// Dates on which `staff_id` works, ascending.
    pub fn dates_for(&self, staff_id: &str) -> Vec<NaiveDate> {
        self.rows
            .iter()
            .filter(|r| r.staff_id == staff_id)
            .map(|r| r.date)
            .collect()
    }

    pub fn contains(&self, staff_id: &str, date: NaiveDate) -> bool {
        self.rows
            .iter()
            .any(|r| r.date == date && r.staff_id == staff_id)
    }

    /// Number of scheduled days per staff member, including idle staff.
    pub fn workloads(&self, staff: &[StaffMember]) -> BTreeMap<StaffId, usize> {
        let mut loads: BTreeMap<StaffId, usize> =
            staff.iter().map(|s| (s.staff_id.clone(), 0)).collect();
        for row in &self.rows {
            *loads.entry(row.staff_id.clone()).or_insert(0) += 1;
        }
        loads
    }

    /// Busiest minus least busy workload across `staff`.
    pub fn fairness_gap(&self, staff: &[StaffMember]) -> usize {
        let loads = self.workloads(staff);
        let max = loads.values().copied().max().unwrap_or(0);
        let min = loads.values().copied().min().unwrap_or(0);
        max - min
    }

    /// Total labour cost under the given wages.
    pub fn total_cost(&self, staff: &[StaffMember]) -> f64 {
        let units: HashMap<&str, i64> = staff
            .iter()
            .map(|s| (s.staff_id.as_str(), s.cost_units()))
            .collect();
        let total: i64 = self
            .rows
            .iter()
            .filter_map(|r| units.get(r.staff_id.as_str()))
            .sum();
        total as f64 / COST_UNITS_PER_WAGE as f64
    }

    /// Converts the schedule into the `date, staff_id, name` output table.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(["date", "staff_id", "name"]);
        for row in &self.rows {
            table.rows_mut().push(vec![
                Value::Date(row.date),
                Value::Text(row.staff_id.clone()),
                Value::Text(row.name.clone()),
            ]);
        }
        table
    }
}
