//! ShiftForge Core - Core types for shift-assignment optimization
//!
//! This crate provides the fundamental abstractions for ShiftForge:
//! - Column-named tables forming the tabular I/O contract
//! - Input validation for the roster, staff and leave tables
//! - Typed domain records and the output schedule
//! - The error taxonomy shared by every pipeline stage

pub mod domain;
pub mod error;
pub mod table;
pub mod validation;

pub use domain::{
    empty_leave_table, LeaveRecord, RosterProblem, RosterRequirement, Schedule, ScheduleRow,
    StaffId, StaffMember, COST_UNITS_PER_WAGE,
};
pub use error::{Result, ShiftForgeError};
pub use table::{Row, Table, Value};
pub use validation::{validate_inputs, InputTable, MissingColumns, ValidationReport};
