//! density — evaluable, sampleable 1-D densities for priors and posteriors.
//!
//! Purpose
//! -------
//! Represent the per-parameter probability densities that flow along the
//! calibration chain: flat (uniform) priors at the chain ends and smooth
//! empirical densities fitted to the posterior draws of a previous step.
//!
//! Key behaviors
//! -------------
//! - [`Density::uniform`] builds a flat prior with `logpdf(v) = -ln(hi - lo)`
//!   on `[lo, hi]` and `-inf` elsewhere.
//! - [`Density::from_samples`] fits a Gaussian kernel density estimate with
//!   Scott's bandwidth over the sample range (see [`kernel`]).
//! - [`Density::mode`] locates the most probable value, used to seed the next
//!   sampling step.
//! - [`priors`] provides helpers over parameter-wise prior vectors (joint
//!   log-density with short-circuit, mode vectors, proposal widths).
//!
//! Invariants & assumptions
//! ------------------------
//! - Densities are immutable once built.
//! - Evaluation never fails: values outside the support map to `-inf`.
//! - Construction validates bounds and samples and reports problems through
//!   [`errors::DensityError`].
//!
//! Conventions
//! -----------
//! - A parameter vector `θ` of length `k` is paired with a slice of `k`
//!   densities, one per coordinate, assumed independent.
//!
//! Testing notes
//! -------------
//! - Unit tests cover bounds validation, support handling, normalization,
//!   mode search and sampling for both variants.

pub mod distribution;
pub mod errors;
pub mod kernel;
pub mod priors;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::distribution::{Density, UniformPrior};
pub use self::errors::{DensityError, DensityResult};
pub use self::kernel::{BandwidthRule, KernelDensity, KernelType};
pub use self::priors::{flat, prior_modes, proposal_steps, sum_logpdf};

pub mod prelude {
    pub use super::distribution::Density;
    pub use super::errors::{DensityError, DensityResult};
    pub use super::priors::{flat, prior_modes, proposal_steps, sum_logpdf};
}
