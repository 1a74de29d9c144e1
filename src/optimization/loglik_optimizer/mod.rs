//! loglik_optimizer — argmin-powered, derivative-free log-likelihood optimizer.
//!
//! Purpose
//! -------
//! Provide a small Argmin-backed layer for **maximizing log-likelihoods or
//! log-posteriors** `ℓ(θ)`. Callers implement a single trait,
//! [`LogLikelihood`], and invoke [`maximize`] to run a Nelder–Mead simplex
//! search with configurable tolerances.
//!
//! Key behaviors
//! -------------
//! - Convert user-supplied `ℓ(θ)` into Argmin-compatible cost functions
//!   `c(θ) = -ℓ(θ)` via [`adapter::ArgMinAdapter`], mapping zero-probability
//!   points to `+inf` cost.
//! - Expose a single, user-facing entrypoint [`maximize`] that:
//!   - validates the initial guess with [`LogLikelihood::check`],
//!   - builds the initial simplex via [`builders`] from per-coordinate
//!     scales ([`LogLikelihood::scales`]),
//!   - executes the solver via [`run::run_nelder_mead`], and
//!   - normalizes results into an [`OptimOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`.
//! - Configuration types ([`Tolerances`], [`MLEOptions`]) are validated on
//!   construction and are treated as internally consistent by the solver
//!   layer.
//!
//! Downstream usage
//! ----------------
//! - The calibration layer implements [`LogLikelihood`] for its
//!   log-posterior and calls [`maximize`] to refine sampler start points.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions in [`adapter`], simplex
//!   construction in [`builders`], configuration invariants in [`traits`]
//!   and convergence on a toy quadratic in [`api`].

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_SIMPLEX_SCALE, FnEvalMap, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Theta};
}
