//! optimization — MAP refinement stack and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer used to refine sampler start points:
//! an Argmin-backed maximizer for log-likelihoods / log-posteriors and a
//! single error/result surface. Callers implement a log-likelihood, choose
//! tolerances, and obtain fitted parameters and diagnostics without touching
//! backend solver details.
//!
//! Conventions
//! -----------
//! - All solvers conceptually maximize `ℓ(θ)` by minimizing an internal
//!   cost `c(θ) = -ℓ(θ)`; user-facing APIs and outcomes are expressed in
//!   terms of `ℓ`.
//! - Public optimization entrypoints that can fail return `OptResult<T>`;
//!   callers never see raw Argmin errors.
//! - Progress is reported through `tracing` at `debug` level only.

pub mod errors;
pub mod loglik_optimizer;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
