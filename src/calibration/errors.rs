//! Errors for likelihood construction, sampling and ensemble statistics.
//!
//! Numerical edge cases inside a single evaluation (draws outside the prior
//! support, simulator blow-ups) never show up here; they become `-inf`
//! log-posteriors that the sampler rejects. [`CalibrationError`] is reserved
//! for inconsistent inputs and for the two fatal conditions of a run: a
//! zero-probability starting point and a fully degenerate ensemble spread.
use crate::{density::errors::DensityError, models::errors::ModelError};

/// Result alias for calibration operations.
pub type CalibrationResult<T> = Result<T, CalibrationError>;

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    // ---- Likelihood ----
    /// Observation, uncertainty and simulation series must share one length.
    ObservationLengthMismatch { observations: usize, other: usize, what: &'static str },

    /// Warm-up must not exceed the series length.
    WarmupOutOfRange { warmup: usize, len: usize },

    /// Uncertainty must be finite and > 0 wherever an observation exists.
    InvalidUncertainty { index: usize, value: f64 },

    /// One prior per model parameter is required.
    PriorCountMismatch { expected: usize, actual: usize },

    // ---- Sampler ----
    /// The initial state has zero posterior probability.
    NonFiniteInitialState { value: f64 },

    /// Initial state or step vector has the wrong length.
    InitialStateLengthMismatch { expected: usize, actual: usize },

    /// A sampler option is out of range.
    InvalidSamplerOption { name: &'static str, value: f64, reason: &'static str },

    // ---- Ensemble ----
    /// An ensemble needs at least one member.
    EmptyEnsemble,

    /// Ensembles / members with different series lengths cannot be combined.
    EnsembleLengthMismatch { expected: usize, actual: usize },

    /// No strictly positive spread exists to floor the zero entries with.
    DegenerateUncertainty,

    // ---- Wrapped ----
    Model(ModelError),
    Density(DensityError),
}

impl std::error::Error for CalibrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalibrationError::Model(e) => Some(e),
            CalibrationError::Density(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Likelihood ----
            CalibrationError::ObservationLengthMismatch { observations, other, what } => {
                write!(f, "Observations have {observations} steps but {what} has {other}")
            }
            CalibrationError::WarmupOutOfRange { warmup, len } => {
                write!(f, "Warm-up {warmup} exceeds series length {len}")
            }
            CalibrationError::InvalidUncertainty { index, value } => {
                write!(f, "Invalid uncertainty at index {index}: {value} (must be finite and > 0)")
            }
            CalibrationError::PriorCountMismatch { expected, actual } => {
                write!(f, "Model has {expected} parameters but {actual} priors were given")
            }

            // ---- Sampler ----
            CalibrationError::NonFiniteInitialState { value } => {
                write!(f, "Initial state has non-finite log-posterior {value}")
            }
            CalibrationError::InitialStateLengthMismatch { expected, actual } => {
                write!(f, "Initial state length mismatch: expected {expected}, got {actual}")
            }
            CalibrationError::InvalidSamplerOption { name, value, reason } => {
                write!(f, "Invalid sampler option {name} = {value}: {reason}")
            }

            // ---- Ensemble ----
            CalibrationError::EmptyEnsemble => write!(f, "Ensemble has no members"),
            CalibrationError::EnsembleLengthMismatch { expected, actual } => {
                write!(f, "Ensemble length mismatch: expected {expected} steps, got {actual}")
            }
            CalibrationError::DegenerateUncertainty => {
                write!(f, "Ensemble standard deviation is zero (or undefined) at every timestep")
            }

            // ---- Wrapped ----
            CalibrationError::Model(e) => write!(f, "Model error: {e}"),
            CalibrationError::Density(e) => write!(f, "Density error: {e}"),
        }
    }
}

impl From<ModelError> for CalibrationError {
    fn from(err: ModelError) -> Self {
        CalibrationError::Model(err)
    }
}

impl From<DensityError> for CalibrationError {
    fn from(err: DensityError) -> Self {
        CalibrationError::Density(err)
    }
}
