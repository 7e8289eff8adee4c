//! Configuration errors.
//!
//! Everything that can be wrong with a model specification, its exogenous
//! probability tables, or the configuration file is reported here before any
//! enumeration starts. Shape mismatches between arrays handed to the solver
//! by collaborators are programming errors and panic instead.

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("num_periods must be positive")]
    NoPeriods,

    #[error("at least one education level is required")]
    NoEducationLevels,

    #[error("num_types must be positive")]
    NoTypes,

    #[error("num_draws_emax must be positive")]
    NoDraws,

    #[error("model declares {declared} choices, the solver supports exactly {supported}")]
    ChoiceCountMismatch { declared: usize, supported: usize },

    #[error(
        "education level {level} enters at period {entry}, \
         beyond the horizon of {num_periods} periods"
    )]
    EntryBeyondHorizon {
        level: usize,
        entry: usize,
        num_periods: usize,
    },

    #[error("child_age_max must be non-negative, got {0}")]
    InvalidChildAgeMax(i32),

    #[error("child_age_init_max ({init_max}) must lie in -1..=child_age_max ({max})")]
    InvalidChildAgeInitMax { init_max: i32, max: i32 },

    #[error("{name} has length {actual}, expected {expected}")]
    ShapeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{name} at index {index} is {value}, not a probability")]
    InvalidProbability {
        name: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{name} must be a rate in [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("{name} at index {index} must be finite and non-negative, got {value}")]
    NegativeParameter {
        name: &'static str,
        index: usize,
        value: f64,
    },

    #[error(
        "partner transition row (period {period}, level {level}, status {status}) sums to {sum}"
    )]
    PartnerRowNotNormalized {
        period: usize,
        level: usize,
        status: usize,
        sum: f64,
    },

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("shock standard deviation must be finite and non-negative, got {0}")]
    InvalidShockSd(f64),

    #[error("discount factor must lie in [0, 1], got {0}")]
    InvalidDiscountFactor(f64),

    #[error("CRRA parameter mu must be finite and non-zero, got {0}")]
    InvalidMu(f64),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}
