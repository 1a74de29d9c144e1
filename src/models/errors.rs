//! Errors for forcing data and composite model construction.
//!
//! Running a simulator never fails: invalid parameters produce a `+inf`
//! output series that the likelihood turns into a rejected draw. Only
//! structural problems (mismatched lengths, bad area weights) are errors.

/// Result alias for model construction.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Forcing ----
    /// Precipitation and evapotranspiration series differ in length.
    ForcingLengthMismatch { precipitation: usize, evapotranspiration: usize },

    /// Forcing series are empty.
    EmptyForcing,

    /// A forcing value is NaN/±inf.
    NonFiniteForcing { series: &'static str, index: usize, value: f64 },

    // ---- Composite ----
    /// An area weight is negative or non-finite.
    InvalidArea { which: &'static str, value: f64 },

    /// Head and tail areas sum to zero.
    ZeroTotalArea,

    /// Parameter vector length does not match the model layout.
    ParamLengthMismatch { expected: usize, actual: usize },
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Forcing ----
            ModelError::ForcingLengthMismatch { precipitation, evapotranspiration } => {
                write!(
                    f,
                    "Forcing length mismatch: precipitation has {precipitation} steps, \
                     evapotranspiration has {evapotranspiration}"
                )
            }
            ModelError::EmptyForcing => write!(f, "Forcing series must not be empty"),
            ModelError::NonFiniteForcing { series, index, value } => {
                write!(f, "Non-finite {series} at index {index}: {value}")
            }

            // ---- Composite ----
            ModelError::InvalidArea { which, value } => {
                write!(f, "Invalid {which} area weight {value}: must be finite and >= 0")
            }
            ModelError::ZeroTotalArea => {
                write!(f, "Head and tail area weights must have a positive sum")
            }
            ModelError::ParamLengthMismatch { expected, actual } => {
                write!(f, "Parameter length mismatch: expected {expected}, got {actual}")
            }
        }
    }
}
