//! loglik_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the core numeric types and solver aliases used by the
//! log-likelihood optimizer so the rest of the optimization code stays
//! agnostic to `ndarray` and Argmin generics.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameter vectors are `ndarray` containers over `f64`.
//! - `Cost` is a scalar `f64`; higher layers handle the sign flip between
//!   cost and log-likelihood.
//! - The Nelder–Mead alias assumes Argmin's `(Param, Float)` form as of the
//!   pinned Argmin version.
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Argmin function-evaluation counters (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default relative size of the initial simplex edges.
pub const DEFAULT_SIMPLEX_SCALE: f64 = 0.05;

pub type NelderMeadSolver = NelderMead<Theta, Cost>;
