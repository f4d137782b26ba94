//! ShiftForge Solver Engine
//!
//! This crate provides the search side of ShiftForge:
//! - A boolean decision model with linear constraints and derived integers
//! - The solver backend abstraction and a built-in branch-and-bound backend
//! - Termination conditions and improving-solution observers
//! - Lexicographic multi-objective optimization over any backend

pub mod backend;
pub mod error;
pub mod lexicographic;
pub mod model;
pub mod observer;
pub mod scope;
pub mod search;
pub mod stats;
pub mod termination;

mod propagation;

pub use backend::{
    Availability, Solution, SolveOutcome, SolveParams, SolveStatus, SolverBackend,
};
pub use error::ModelError;
pub use lexicographic::{
    solve_lexicographic, solve_stage, LexicographicError, LexicographicSolution, ObjectiveBuilder,
    ObjectiveStage, SolvedStage, StageReport,
};
pub use model::{BoolVar, IntExpr, IntVar, IntVarDef, LinearConstraint, LinearExpr, Model};
pub use observer::{
    CountingObserver, LoggingObserver, ObserverSupport, SearchControl, SolutionLimitObserver,
    SolutionObserver,
};
pub use scope::SolveScope;
pub use search::BranchAndBoundBackend;
pub use stats::SolveStats;
pub use termination::{
    ExternalTermination, NodeCountTermination, OrTermination, Termination, TimeTermination,
};
