//! Error types for ShiftForge

use thiserror::Error;

use crate::validation::{InputTable, MissingColumns};

/// Main error type for ShiftForge operations.
///
/// Every failure of the optimization pipeline maps to exactly one variant.
/// The tabular entry points collapse all of them into an empty schedule,
/// so the variant is the only place the cause survives.
#[derive(Debug, Error)]
pub enum ShiftForgeError {
    /// One or more required columns are absent.
    #[error("Input schema error: {}", describe_missing(.missing))]
    InputSchema { missing: Vec<MissingColumns> },

    /// The roster or staff table has no rows.
    #[error("Empty input: {}", describe_tables(.tables))]
    EmptyInput { tables: Vec<InputTable> },

    /// A cell could not be interpreted.
    #[error("Invalid value in {table} table, row {row}, column '{column}': {reason}")]
    InvalidValue {
        table: InputTable,
        row: usize,
        column: String,
        reason: String,
    },

    /// A key that must be unique appears twice.
    #[error("Duplicate key '{key}' in {table} table")]
    DuplicateKey { table: InputTable, key: String },

    /// A row was pushed with the wrong number of cells.
    #[error("Row has {actual} cells but the table has {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    /// A table document could not be parsed.
    #[error("Table format error: {0}")]
    TableFormat(#[from] serde_json::Error),

    /// The constraint-solving backend cannot run in this process.
    #[error("Solver backend '{backend}' is unavailable: {reason}")]
    SolverUnavailable { backend: String, reason: String },

    /// No assignment satisfies the hard constraints within the cost phase budget.
    #[error("Phase 1 failed to find a solution (status: {status})")]
    Phase1Infeasible { status: String },

    /// The fairness phase could not produce a solution within its budget.
    #[error("Phase 2 failed to find a fair solution (status: {status})")]
    Phase2Infeasible { status: String },

    /// Error in solver configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShiftForgeError {
    /// Returns true for errors caused by the input tables.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ShiftForgeError::InputSchema { .. }
                | ShiftForgeError::EmptyInput { .. }
                | ShiftForgeError::InvalidValue { .. }
                | ShiftForgeError::DuplicateKey { .. }
                | ShiftForgeError::RowWidth { .. }
                | ShiftForgeError::TableFormat(_)
        )
    }
}

fn describe_missing(missing: &[MissingColumns]) -> String {
    missing
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_tables(tables: &[InputTable]) -> String {
    tables
        .iter()
        .map(|t| format!("{} table has no rows", t))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for ShiftForge operations.
pub type Result<T> = std::result::Result<T, ShiftForgeError>;
