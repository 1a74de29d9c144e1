//! Adapter traits for the external rainfall-runoff simulator and delay operator.
use crate::models::forcing::Forcing;
use ndarray::{Array1, ArrayView1};

/// A deterministic rainfall-runoff simulator.
///
/// Implementations must:
/// - return a series of length `forcing.len()`;
/// - be pure (no state retained between calls);
/// - never panic on well-formed numeric input. Parameters outside the
///   physically meaningful range should produce a `+inf` series instead.
///
/// `params.len() == self.n_params()` is guaranteed by callers.
pub trait Simulator: Send + Sync {
    fn n_params(&self) -> usize;

    fn run(&self, params: ArrayView1<f64>, forcing: &Forcing) -> Array1<f64>;
}

/// A pure lag operator applied to a simulated series.
///
/// Output has the same length as `series`. A lag the operator cannot apply
/// (e.g. negative) should produce a `+inf` series.
pub trait Delay: Send + Sync {
    fn run(&self, series: ArrayView1<f64>, lag: f64) -> Array1<f64>;
}
