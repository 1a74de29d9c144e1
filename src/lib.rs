//! rust_hydrochain — hierarchical Bayesian calibration of chained sub-basin models.
//!
//! Purpose
//! -------
//! Calibrate a linear chain of nested sub-basins from partial, noisy outlet
//! measurements. Parameter knowledge is propagated downstream (forward
//! pass) and upstream (backward pass) with Metropolis–Hastings sampling,
//! and the two posterior ensembles of every node are pooled (smoothing).
//!
//! Key behaviors
//! -------------
//! - [`density`]: uniform priors and kernel density estimates of posterior
//!   draws, used as priors of the next calibration step.
//! - [`models`]: the [`Simulator`](models::Simulator) and
//!   [`Delay`](models::Delay) seams, the composite (dual) sub-basin model,
//!   and ready-made GR4J / linear-lag implementations.
//! - [`calibration`]: likelihood, sampler, ensemble statistics and the
//!   multi-chain calibration driver.
//! - [`optimization`]: Nelder–Mead maximization of log-posteriors, used to
//!   refine sampler start points.
//! - [`chain`]: the forward / backward / smoothing orchestrator.
//!
//! Invariants & assumptions
//! ------------------------
//! - All randomness flows through explicitly seeded
//!   `rand_xoshiro::Xoshiro256PlusPlus` generators; runs are reproducible.
//! - Numerical edge cases inside likelihood evaluation become `-inf`
//!   log-posteriors; configuration problems are returned as errors naming
//!   the offending node or index.
//!
//! Conventions
//! -----------
//! - Series are `ndarray::Array1<f64>` with NaN marking missing
//!   observations; ensembles are `Array2<f64>` with one member per row.
//! - Dual-model parameter vectors are laid out `[head.., delay, tail..]`.
//! - The crate logs through `tracing` and never installs a subscriber.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end chain scenarios on toy
//!   simulators live in `tests/`.

pub mod calibration;
pub mod chain;
pub mod density;
pub mod models;
pub mod optimization;

pub mod prelude {
    pub use crate::calibration::prelude::*;
    pub use crate::chain::prelude::*;
    pub use crate::density::prelude::*;
    pub use crate::models::prelude::*;
}
