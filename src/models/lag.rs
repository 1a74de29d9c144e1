//! Fractional linear lag, the default [`Delay`] of composite models.
use crate::models::simulator::Delay;
use ndarray::{Array1, ArrayView1};

/// Shifts a series by a real-valued lag `d ≥ 0`.
///
/// With `d0 = ⌊d⌋` and `w1 = d - d0`, input `x[t]` contributes
/// `(1 - w1)·x[t]` to `out[t + d0]` and `w1·x[t]` to `out[t + d0 + 1]`.
/// Contributions past the end of the series are dropped and the first `d0`
/// outputs are zero. A negative or non-finite lag yields an all-`+inf` series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearLag;

impl Delay for LinearLag {
    fn run(&self, series: ArrayView1<f64>, lag: f64) -> Array1<f64> {
        let n = series.len();
        if !lag.is_finite() || lag < 0.0 {
            return Array1::from_elem(n, f64::INFINITY);
        }
        let d0 = lag.floor();
        let w1 = lag - d0;
        let w0 = 1.0 - w1;
        let mut out = Array1::zeros(n);
        if d0 >= n as f64 {
            return out;
        }
        let d0 = d0 as usize;
        for (t, &x) in series.iter().enumerate().take(n - d0) {
            out[t + d0] += w0 * x;
            if let Some(next) = out.get_mut(t + d0 + 1) {
                *next += w1 * x;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // A zero lag is the identity.
    fn zero_lag_is_identity() {
        let x = array![1.0, 2.0, 3.0];
        assert_eq!(LinearLag.run(x.view(), 0.0), x);
    }

    #[test]
    // Purpose
    // -------
    // Integer lags shift, fractional lags split mass between neighbours.
    fn integer_and_fractional_lags() {
        let x = array![4.0, 0.0, 0.0, 0.0];
        assert_eq!(LinearLag.run(x.view(), 2.0), array![0.0, 0.0, 4.0, 0.0]);
        assert_eq!(LinearLag.run(x.view(), 1.25), array![0.0, 3.0, 1.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // Lags beyond the horizon give zeros; negative lags give `+inf`.
    fn out_of_range_lags() {
        let x = array![1.0, 1.0];
        assert_eq!(LinearLag.run(x.view(), 5.0), array![0.0, 0.0]);
        assert!(LinearLag.run(x.view(), -0.5).iter().all(|v| v.is_infinite()));
        assert!(LinearLag.run(x.view(), f64::NAN).iter().all(|v| v.is_infinite()));
    }
}
