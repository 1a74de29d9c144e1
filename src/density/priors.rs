//! Helpers over parameter-wise prior vectors.
use crate::density::distribution::Density;
use ndarray::{Array1, ArrayView1};

/// Joint log-density `Σ_k ln p_k(θ_k)` of independent priors.
///
/// Stops at the first non-finite term and returns `-inf`, so later priors are
/// never evaluated for a draw already outside some support. A length mismatch
/// between `priors` and `theta` also returns `-inf`.
pub fn sum_logpdf(priors: &[Density], theta: ArrayView1<f64>) -> f64 {
    if priors.len() != theta.len() {
        return f64::NEG_INFINITY;
    }
    let mut total = 0.0;
    for (prior, &v) in priors.iter().zip(theta.iter()) {
        let lp = prior.logpdf(v);
        if !lp.is_finite() {
            return f64::NEG_INFINITY;
        }
        total += lp;
    }
    total
}

/// Vector of per-parameter modes.
pub fn prior_modes(priors: &[Density]) -> Array1<f64> {
    priors.iter().map(Density::mode).collect()
}

/// Random-walk step sizes: each prior's characteristic width times `scale`.
pub fn proposal_steps(priors: &[Density], scale: f64) -> Array1<f64> {
    priors.iter().map(|p| p.proposal_width() * scale).collect()
}

/// Flat priors, one per `(low, high)` pair.
pub fn flat(bounds: &[(f64, f64)]) -> crate::density::DensityResult<Vec<Density>> {
    bounds.iter().map(|&(lo, hi)| Density::uniform(lo, hi)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The joint log-density is the sum of marginals inside the support and
    // -inf as soon as one coordinate leaves it.
    fn sum_logpdf_short_circuits_outside_support() {
        let priors = flat(&[(0.0, 2.0), (0.0, 4.0)]).unwrap();
        let inside = sum_logpdf(&priors, array![1.0, 1.0].view());
        assert!((inside + 8.0_f64.ln()).abs() < 1e-12);
        assert_eq!(sum_logpdf(&priors, array![3.0, 1.0].view()), f64::NEG_INFINITY);
        assert_eq!(sum_logpdf(&priors, array![1.0].view()), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Modes and proposal steps are taken coordinate-wise.
    fn modes_and_steps_are_coordinate_wise() {
        let priors = flat(&[(0.0, 2.0), (10.0, 20.0)]).unwrap();
        assert_eq!(prior_modes(&priors), array![1.0, 15.0]);
        assert_eq!(proposal_steps(&priors, 0.1), array![0.2, 1.0]);
    }
}
