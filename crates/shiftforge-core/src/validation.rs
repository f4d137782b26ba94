//! Input validation for the three input tables.
//!
//! Checks schema and non-emptiness before anything is modelled:
//! - Required columns per table
//! - Non-empty roster and staff tables
//!
//! Validation never fails by panicking or returning an error directly; it
//! produces a [`ValidationReport`] that callers must inspect before solving.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ShiftForgeError};
use crate::table::Table;

/// Identifies one of the three input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTable {
    Roster,
    Staff,
    Leave,
}

impl InputTable {
    /// Columns that must be present on this table.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            InputTable::Roster => &["date", "required_personnel"],
            InputTable::Staff => &["staff_id", "name", "wage"],
            InputTable::Leave => &["staff_id", "date"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InputTable::Roster => "roster",
            InputTable::Staff => "staff",
            InputTable::Leave => "leave",
        }
    }
}

impl fmt::Display for InputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Columns missing from a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumns {
    pub table: InputTable,
    pub columns: Vec<String>,
}

impl fmt::Display for MissingColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} table is missing columns [{}]",
            self.table,
            self.columns.join(", ")
        )
    }
}

/// Outcome of [`validate_inputs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Missing columns, one entry per affected table.
    pub missing: Vec<MissingColumns>,
    /// Tables that must have rows but have none.
    pub empty: Vec<InputTable>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.empty.is_empty()
    }

    /// Converts the report into a result.
    ///
    /// Schema problems take precedence over empty tables.
    pub fn into_result(self) -> Result<()> {
        if !self.missing.is_empty() {
            return Err(ShiftForgeError::InputSchema {
                missing: self.missing,
            });
        }
        if !self.empty.is_empty() {
            return Err(ShiftForgeError::EmptyInput { tables: self.empty });
        }
        Ok(())
    }
}

/// Validates the schema of the roster, staff and leave tables.
///
/// Logs the missing-column set of every failing table at WARN level.
pub fn validate_inputs(roster: &Table, staff: &Table, leave: &Table) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (kind, table) in [
        (InputTable::Roster, roster),
        (InputTable::Staff, staff),
        (InputTable::Leave, leave),
    ] {
        let columns: Vec<String> = kind
            .required_columns()
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect();

        if !columns.is_empty() {
            warn!(
                event = "validation_failed",
                table = kind.name(),
                missing = ?columns,
                "{} table is missing required columns",
                kind
            );
            report.missing.push(MissingColumns {
                table: kind,
                columns,
            });
        }
    }

    for (kind, table) in [(InputTable::Roster, roster), (InputTable::Staff, staff)] {
        if table.is_empty() {
            warn!(
                event = "validation_failed",
                table = kind.name(),
                "{} table has no rows",
                kind
            );
            report.empty.push(kind);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn roster() -> Table {
        Table::new(["date", "required_personnel"])
            .with_row(["2024-01-01".into(), Value::Int(1)])
            .unwrap()
    }

    fn staff() -> Table {
        Table::new(["staff_id", "name", "wage"])
            .with_row(["s1".into(), "Ada".into(), Value::Int(10)])
            .unwrap()
    }

    fn leave() -> Table {
        Table::new(["staff_id", "date"])
    }

    #[test]
    fn test_valid_inputs() {
        let report = validate_inputs(&roster(), &staff(), &leave());
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_missing_wage_column() {
        let staff = Table::new(["staff_id", "name"])
            .with_row(["s1".into(), "Ada".into()])
            .unwrap();
        let report = validate_inputs(&roster(), &staff, &leave());

        assert!(!report.is_valid());
        assert_eq!(
            report.missing,
            vec![MissingColumns {
                table: InputTable::Staff,
                columns: vec!["wage".to_string()],
            }]
        );
        assert!(matches!(
            report.into_result(),
            Err(ShiftForgeError::InputSchema { .. })
        ));
    }

    #[test]
    fn test_missing_columns_reported_per_table() {
        let roster = Table::new(["day"]);
        let leave = Table::new(["who"]);
        let report = validate_inputs(&roster, &staff(), &leave);

        assert_eq!(report.missing.len(), 2);
        assert_eq!(report.missing[0].table, InputTable::Roster);
        assert_eq!(
            report.missing[0].columns,
            vec!["date".to_string(), "required_personnel".to_string()]
        );
        assert_eq!(report.missing[1].table, InputTable::Leave);
        // The roster table is also empty, but schema errors win.
        assert_eq!(report.empty, vec![InputTable::Roster]);
        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("roster table is missing columns"));
    }

    #[test]
    fn test_empty_tables() {
        let report = validate_inputs(
            &Table::new(["date", "required_personnel"]),
            &Table::new(["staff_id", "name", "wage"]),
            &leave(),
        );
        assert!(report.missing.is_empty());
        assert_eq!(report.empty, vec![InputTable::Roster, InputTable::Staff]);
        assert!(matches!(
            report.into_result(),
            Err(ShiftForgeError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_empty_leave_is_fine() {
        assert!(validate_inputs(&roster(), &staff(), &leave()).is_valid());
    }
}
