//! Error types for model construction and solving.

use thiserror::Error;

/// A model that cannot be searched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A constraint or expression refers to a boolean variable that does not exist.
    #[error("'{owner}' references unknown boolean variable #{index}")]
    UnknownBoolVar { owner: String, index: usize },

    /// An integer expression refers to an integer variable not defined before it.
    #[error("'{owner}' references integer variable #{index} which is not defined before it")]
    UnknownIntVar { owner: String, index: usize },

    /// A constraint or domain with `lo > hi`.
    #[error("'{owner}' has empty bounds [{lo}, {hi}]")]
    EmptyBounds { owner: String, lo: i64, hi: i64 },

    /// A max/min over zero variables.
    #[error("'{owner}' aggregates over no variables")]
    EmptyAggregate { owner: String },

    /// The solution hint has more values than the model has boolean variables.
    #[error("solution hint has {actual} values but the model has only {expected} boolean variables")]
    HintLength { expected: usize, actual: usize },
}
