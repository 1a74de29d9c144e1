//! calibration — Bayesian calibration of one composite model.
//!
//! Purpose
//! -------
//! Turn observations, priors and a composite model into posterior parameter
//! draws and a posterior ensemble of simulated series. This is the unit of
//! work the chain orchestrator repeats at every node and direction.
//!
//! Key behaviors
//! -------------
//! - [`likelihood`]: validated [`LikelihoodConfig`] and the [`LogPosterior`]
//!   evaluator (prior short-circuit, Gaussian likelihood with warm-up and
//!   missing data).
//! - [`sampler`]: random-walk [`MetropolisHastings`] with a burn-in /
//!   sampling state machine and optional burn-in step adaptation.
//! - [`ensemble`]: [`Ensemble`] pooling and per-timestep statistics with the
//!   zero-spread floor.
//! - [`driver`]: [`calibrate`] runs several independent chains on
//!   reproducible RNG streams and pools them; [`refine_start`] polishes the
//!   starting point with a MAP search.
//!
//! Invariants & assumptions
//! ------------------------
//! - Zero-probability draws are `-inf` log-posteriors and are always
//!   rejected; they never surface as errors.
//! - A zero-probability starting point is fatal
//!   ([`CalibrationError::NonFiniteInitialState`]).
//!
//! Testing notes
//! -------------
//! - Unit tests use toy targets with known posteriors (Gaussian, constant
//!   simulators) to check acceptance bookkeeping, convergence of the sample
//!   mean, and reproducibility under a fixed seed.

pub mod driver;
pub mod ensemble;
pub mod errors;
pub mod likelihood;
pub mod sampler;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::driver::{Calibration, calibrate, refine_start};
pub use self::ensemble::{Ensemble, EnsembleStats, floor_zero_std};
pub use self::errors::{CalibrationError, CalibrationResult};
pub use self::likelihood::{LikelihoodConfig, LogPosterior};
pub use self::sampler::{
    Evaluation, MetropolisHastings, Phase, SamplerOptions, SamplerOutput, Target,
};

pub mod prelude {
    pub use super::driver::{Calibration, calibrate};
    pub use super::ensemble::{Ensemble, EnsembleStats};
    pub use super::errors::{CalibrationError, CalibrationResult};
    pub use super::likelihood::{LikelihoodConfig, LogPosterior};
    pub use super::sampler::{SamplerOptions, Target};
}
