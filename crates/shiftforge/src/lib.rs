//! ShiftForge - Cost-then-fairness shift assignment in Rust
//!
//! Give it the days to cover, the staff with their wages, and the approved
//! leave. It returns the cheapest schedule that respects coverage, leave and
//! the consecutive-day and rest-day rules. Among all schedules at that cost
//! it returns the one with the smallest gap between the busiest and the least
//! busy staff member.
//!
//! # Example
//!
//! ```rust
//! use shiftforge::prelude::*;
//!
//! let roster = Table::new(["date", "required_personnel"])
//!     .with_row([Value::from("2024-01-01"), Value::from(1)])
//!     .unwrap();
//! let staff = Table::new(["staff_id", "name", "wage"])
//!     .with_row([Value::from("S1"), Value::from("Alice"), Value::from(10.0)])
//!     .unwrap();
//!
//! let schedule = optimize_schedule(&roster, &staff, &empty_leave_table(), &SolverConfig::default());
//! assert_eq!(schedule.len(), 1);
//! ```

pub mod builder;
pub mod export;
pub mod phase;

mod optimizer;

pub use builder::{ConstraintModelBuilder, RosterModel};
pub use export::ScheduleExporter;
pub use optimizer::{optimize_schedule, ShiftOptimizer, SolvedSchedule};

// Input and output types
pub use shiftforge_core::{
    empty_leave_table, validate_inputs, LeaveRecord, RosterProblem, RosterRequirement, Schedule,
    ScheduleRow, ShiftForgeError, StaffMember, Table, Value,
};

// Configuration
pub use shiftforge_config::{ConfigError, PhaseConfig, SolverConfig, WorkerCount};

// Backends and observers
pub use shiftforge_solver::{
    Availability, BranchAndBoundBackend, CountingObserver, SearchControl, SolutionObserver,
    SolveStatus, SolverBackend, StageReport,
};

#[cfg(feature = "console")]
pub use shiftforge_console as console;

pub mod prelude {
    pub use super::{
        empty_leave_table, optimize_schedule, Schedule, ShiftForgeError, ShiftOptimizer,
        SolverConfig, Table, Value,
    };
}
