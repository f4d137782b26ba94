//! Configuration system for ShiftForge.
//!
//! Load optimizer configuration from TOML or YAML to control phase time
//! budgets, rolling-window rules and search parallelism without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use shiftforge_config::SolverConfig;
//! use std::time::Duration;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     max_consecutive_work_days = 4
//!     worker_count = { count = 2 }
//!
//!     [cost_phase]
//!     seconds_spent_limit = 30
//!
//!     [fairness_phase]
//!     millis_spent_limit = 500
//!     solution_limit = 10
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit_phase1(), Duration::from_secs(30));
//! assert_eq!(config.time_limit_phase2(), Duration::from_millis(500));
//! assert_eq!(config.window_for_off_days, 7);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use shiftforge_config::SolverConfig;
//!
//! let config = SolverConfig::load("shiftforge.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default time budget per phase, in seconds.
pub const DEFAULT_PHASE_SECONDS: u64 = 60;

/// Default cap on consecutive working days.
pub const DEFAULT_MAX_CONSECUTIVE_WORK_DAYS: usize = 5;

/// Default rolling window that must contain a day off.
pub const DEFAULT_WINDOW_FOR_OFF_DAYS: usize = 7;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main optimizer configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Longest run of consecutive working days allowed per staff member.
    #[serde(default = "default_max_consecutive_work_days")]
    pub max_consecutive_work_days: usize,

    /// Every rolling window of this many dates contains a day off.
    #[serde(default = "default_window_for_off_days")]
    pub window_for_off_days: usize,

    /// Number of parallel search workers.
    #[serde(default)]
    pub worker_count: WorkerCount,

    /// Phase 1: cost minimization.
    #[serde(default)]
    pub cost_phase: PhaseConfig,

    /// Phase 2: fairness minimization at frozen cost.
    #[serde(default)]
    pub fairness_phase: PhaseConfig,
}

fn default_max_consecutive_work_days() -> usize {
    DEFAULT_MAX_CONSECUTIVE_WORK_DAYS
}

fn default_window_for_off_days() -> usize {
    DEFAULT_WINDOW_FOR_OFF_DAYS
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_consecutive_work_days: DEFAULT_MAX_CONSECUTIVE_WORK_DAYS,
            window_for_off_days: DEFAULT_WINDOW_FOR_OFF_DAYS,
            worker_count: WorkerCount::default(),
            cost_phase: PhaseConfig::default(),
            fairness_phase: PhaseConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be solved with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_for_off_days == 0 {
            return Err(ConfigError::Invalid(
                "window_for_off_days must be at least 1".to_string(),
            ));
        }
        if self.worker_count == WorkerCount::Count(0) {
            return Err(ConfigError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the Phase 1 time limit.
    pub fn with_time_limit_phase1(mut self, limit: Duration) -> Self {
        self.cost_phase = self.cost_phase.with_time_limit(limit);
        self
    }

    /// Sets the Phase 2 time limit.
    pub fn with_time_limit_phase2(mut self, limit: Duration) -> Self {
        self.fairness_phase = self.fairness_phase.with_time_limit(limit);
        self
    }

    pub fn with_max_consecutive_work_days(mut self, days: usize) -> Self {
        self.max_consecutive_work_days = days;
        self
    }

    pub fn with_window_for_off_days(mut self, days: usize) -> Self {
        self.window_for_off_days = days;
        self
    }

    pub fn with_worker_count(mut self, workers: WorkerCount) -> Self {
        self.worker_count = workers;
        self
    }

    /// Stops both phases after `limit` improving solutions.
    pub fn with_solution_limit(mut self, limit: u64) -> Self {
        self.cost_phase.solution_limit = Some(limit);
        self.fairness_phase.solution_limit = Some(limit);
        self
    }

    /// Returns the Phase 1 (cost) time limit.
    pub fn time_limit_phase1(&self) -> Duration {
        self.cost_phase.time_limit()
    }

    /// Returns the Phase 2 (fairness) time limit.
    pub fn time_limit_phase2(&self) -> Duration {
        self.fairness_phase.time_limit()
    }
}

/// Search worker count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerCount {
    /// One worker per available CPU core.
    #[default]
    Auto,

    /// No parallel search.
    Single,

    /// Specific number of workers.
    Count(usize),
}

impl WorkerCount {
    /// Resolves to a concrete worker count (at least 1).
    pub fn resolve(self) -> usize {
        match self {
            WorkerCount::Auto => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            WorkerCount::Single => 1,
            WorkerCount::Count(n) => n.max(1),
        }
    }
}

/// Per-phase termination configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PhaseConfig {
    /// Maximum seconds to spend in the phase.
    #[serde(default = "default_phase_seconds")]
    pub seconds_spent_limit: u64,

    /// Maximum milliseconds; takes precedence over seconds when set.
    #[serde(default)]
    pub millis_spent_limit: Option<u64>,

    /// Stop after this many improving solutions.
    #[serde(default)]
    pub solution_limit: Option<u64>,

    /// Stop after exploring this many search nodes.
    #[serde(default)]
    pub node_limit: Option<u64>,
}

fn default_phase_seconds() -> u64 {
    DEFAULT_PHASE_SECONDS
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            seconds_spent_limit: DEFAULT_PHASE_SECONDS,
            millis_spent_limit: None,
            solution_limit: None,
            node_limit: None,
        }
    }
}

impl PhaseConfig {
    /// Returns the time limit as a Duration.
    pub fn time_limit(&self) -> Duration {
        match self.millis_spent_limit {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(self.seconds_spent_limit),
        }
    }

    /// Sets the time limit with millisecond precision.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.seconds_spent_limit = limit.as_secs();
        self.millis_spent_limit = Some(limit.as_millis() as u64);
        self
    }
}
