//! Errors for prior/posterior densities.
//!
//! [`DensityError`] covers invalid uniform bounds and invalid sample sets
//! handed to the kernel density estimator. Evaluating a density never fails;
//! values outside the support are reported as `-inf`, not as errors.

/// Result alias for density construction.
pub type DensityResult<T> = Result<T, DensityError>;

#[derive(Debug, Clone, PartialEq)]
pub enum DensityError {
    // ---- Uniform ----
    /// Bounds must be finite with `low < high`.
    InvalidBounds { low: f64, high: f64, reason: &'static str },

    // ---- Kernel density ----
    /// No samples were provided.
    EmptySamples,

    /// A sample is NaN/±inf.
    NonFiniteSample { index: usize, value: f64 },

    /// Bandwidth must be finite and strictly positive.
    InvalidBandwidth { value: f64 },
}

impl std::error::Error for DensityError {}

impl std::fmt::Display for DensityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Uniform ----
            DensityError::InvalidBounds { low, high, reason } => {
                write!(f, "Invalid density bounds [{low}, {high}]: {reason}")
            }

            // ---- Kernel density ----
            DensityError::EmptySamples => {
                write!(f, "Kernel density estimate requires at least one sample")
            }
            DensityError::NonFiniteSample { index, value } => {
                write!(f, "Non-finite sample at index {index}: {value}")
            }
            DensityError::InvalidBandwidth { value } => {
                write!(f, "Invalid bandwidth {value}: must be finite and > 0")
            }
        }
    }
}
