//! In-memory column-named tables.
//!
//! Tables are the I/O contract of the optimizer: three input tables
//! (roster requirement, staff, leave) and one output table (schedule).
//! Columns are addressed by name, so column order carries no meaning.
//!
//! # Examples
//!
//! ```
//! use shiftforge_core::table::{Table, Value};
//!
//! let staff = Table::new(["staff_id", "name", "wage"])
//!     .with_row(["s1".into(), "Ada".into(), Value::Int(10)])
//!     .unwrap();
//!
//! assert_eq!(staff.len(), 1);
//! assert!(staff.has_column("wage"));
//! let row = staff.rows().next().unwrap();
//! assert_eq!(row.get("name").and_then(Value::as_str), Some("Ada"));
//! ```

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShiftForgeError};

/// ISO date format accepted in text cells.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single table cell.
///
/// Strings always deserialize as `Text`; `as_date` parses them on demand, so
/// a date-shaped staff id stays a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Null,
}

impl Value {
    /// Returns the cell as an integer, accepting integral floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the cell as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the cell as text if it holds text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the cell as a date, parsing ISO text.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
            _ => None,
        }
    }

    /// Returns the cell rendered as a key (text, integer or date).
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Text(s) if !s.is_empty() => Some(s.clone()),
            Value::Int(v) => Some(v.to_string()),
            Value::Date(d) => Some(d.format(DATE_FORMAT).to_string()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

/// A table with named columns and rows of [`Value`] cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Parses a `{"columns": [...], "rows": [[...]]}` JSON document.
    ///
    /// # Errors
    ///
    /// Returns `TableFormat` for malformed JSON and `RowWidth` when a row
    /// does not match the column count.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let table: Table = serde_json::from_str(s)?;
        if let Some(row) = table.rows.iter().find(|r| r.len() != table.columns.len()) {
            return Err(ShiftForgeError::RowWidth {
                expected: table.columns.len(),
                actual: row.len(),
            });
        }
        Ok(table)
    }

    /// Serializes the table to a JSON document.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns `RowWidth` if the row length differs from the column count.
    pub fn push_row<I>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let row: Vec<Value> = row.into_iter().collect();
        if row.len() != self.columns.len() {
            return Err(ShiftForgeError::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder form of [`Table::push_row`].
    pub fn with_row<I>(mut self, row: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // Callers must keep every row at the column count.
    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.rows
    }

    /// Iterates over the rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            table: self,
            values,
        })
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Returns the cell in the named column.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.table
            .column_index(column)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}
