//! Shared test fixtures for ShiftForge crates.
//!
//! This crate provides input tables and pure checking functions for testing.
//! It does NOT depend on `shiftforge-solver` so solver results can be checked
//! independently of the search that produced them.
//!
//! - [`fixtures`] - Input table builders, named instances, random instances
//! - [`reference`] - Exhaustive lexicographic optimum for small instances
//! - [`checker`] - Hard-rule violations of a produced schedule
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! shiftforge-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use shiftforge_test::fixtures::{trivial_week, random_instance};
//! use shiftforge_test::reference::solve_exhaustively;
//! ```

pub mod checker;
pub mod fixtures;
pub mod reference;

pub use checker::{check_schedule, Violation};
pub use fixtures::{
    infeasible_leave, missing_wage, random_instance, trivial_week, two_weeks, Instance,
    RandomInstanceConfig,
};
pub use reference::{solve_exhaustively, ReferenceOptimum};
