//! Kernel density estimation over posterior samples.
//!
//! This module provides:
//! - A `KernelType` enum with the smoothing kernels used to turn a cloud of
//!   posterior draws into a continuous prior (Gaussian, Epanechnikov).
//! - A `BandwidthRule` enum with the usual plug-in bandwidth selectors
//!   (Scott, Silverman) and a fixed-width escape hatch.
//! - [`KernelDensity`], an immutable estimate whose log-density is evaluated
//!   with a log-sum-exp over all samples and is `-inf` outside the observed
//!   sample range.
//!
//! Conventions:
//! - The kernel argument is the standardized distance `u = (v - s_k) / h`.
//! - Log-weights are returned directly so that tail evaluations never underflow
//!   to `ln(0)` before the log-sum-exp is taken.
//! - Support is the closed interval `[min(samples), max(samples)]`, widened
//!   to `x ± reach · h` when every sample equals `x`; the estimate is *not* renormalized to that interval, so the mass lost at the
//!   edges is a constant that cancels in Metropolis–Hastings ratios.
use crate::density::errors::{DensityError, DensityResult};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Number of grid points used when searching for the mode of an estimate.
pub const MODE_GRID_POINTS: usize = 512;

/// Relative width used when all samples coincide and the plug-in bandwidth is 0.
const DEGENERATE_BANDWIDTH_REL: f64 = 1e-3;

/// Absolute floor for the degenerate bandwidth (samples all equal to 0.0).
const DEGENERATE_BANDWIDTH_ABS: f64 = 1e-9;

/// Attempts before kernel sampling gives up on landing inside the support.
const MAX_SAMPLING_ATTEMPTS: usize = 1_000;

/// Smoothing kernel family.
///
/// - `Gaussian`: infinite-support standard normal kernel.
/// - `Epanechnikov`: compact support on `|u| ≤ 1`, `K(u) = 0.75 (1 − u²)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KernelType {
    #[default]
    Gaussian,
    Epanechnikov,
}

impl KernelType {
    /// Evaluate `ln K(u)` at the standardized distance `u`.
    ///
    /// # Returns
    /// The log kernel weight. For `Epanechnikov`, returns `-inf` when `|u| ≥ 1`.
    pub fn log_weight(&self, u: f64) -> f64 {
        match self {
            KernelType::Gaussian => -0.5 * u * u - 0.5 * (2.0 * std::f64::consts::PI).ln(),
            KernelType::Epanechnikov => {
                let one_minus = 1.0 - u * u;
                if one_minus > 0.0 { (0.75 * one_minus).ln() } else { f64::NEG_INFINITY }
            }
        }
    }

    /// Standardized distance beyond which the kernel carries negligible mass.
    pub fn reach(&self) -> f64 {
        match self {
            KernelType::Gaussian => 4.0,
            KernelType::Epanechnikov => 1.0,
        }
    }

    /// Draw a standardized offset `u` from the kernel.
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            KernelType::Gaussian => StandardNormal.sample(rng),
            KernelType::Epanechnikov => {
                // Devroye's three-uniform construction.
                let u1: f64 = rng.random_range(-1.0..1.0);
                let u2: f64 = rng.random_range(-1.0..1.0);
                let u3: f64 = rng.random_range(-1.0..1.0);
                if u3.abs() >= u2.abs() && u3.abs() >= u1.abs() { u2 } else { u3 }
            }
        }
    }
}

/// Plug-in bandwidth selector.
///
/// - `Scott`: `h = σ̂ · n^(-1/5)`.
/// - `Silverman`: `h = 0.9 · min(σ̂, IQR/1.34) · n^(-1/5)`.
/// - `Fixed(h)`: use `h` as given (must be finite and > 0).
///
/// `σ̂` is the sample standard deviation (`n − 1` denominator).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BandwidthRule {
    #[default]
    Scott,
    Silverman,
    Fixed(f64),
}

impl BandwidthRule {
    /// Compute the bandwidth for `samples` (assumed non-empty and finite).
    ///
    /// When the plug-in value collapses to zero (a single sample, or all
    /// samples identical), falls back to a small width relative to the sample
    /// magnitude so the estimate stays a proper density.
    ///
    /// # Errors
    /// - [`DensityError::InvalidBandwidth`] for a non-positive or non-finite
    ///   `Fixed` width.
    pub fn bandwidth(&self, samples: &[f64]) -> DensityResult<f64> {
        let n = samples.len() as f64;
        let plug_in = match self {
            BandwidthRule::Fixed(h) => {
                if !h.is_finite() || *h <= 0.0 {
                    return Err(DensityError::InvalidBandwidth { value: *h });
                }
                return Ok(*h);
            }
            BandwidthRule::Scott => sample_std(samples) * n.powf(-0.2),
            BandwidthRule::Silverman => {
                let sd = sample_std(samples);
                let iqr = Data::new(samples.to_vec()).interquartile_range() / 1.34;
                let spread = if iqr > 0.0 { sd.min(iqr) } else { sd };
                0.9 * spread * n.powf(-0.2)
            }
        };
        if plug_in.is_finite() && plug_in > 0.0 {
            return Ok(plug_in);
        }
        let scale = samples.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
        Ok((scale * DEGENERATE_BANDWIDTH_REL).max(DEGENERATE_BANDWIDTH_ABS))
    }
}

/// `KernelDensity` — smooth non-parametric density fitted to posterior draws.
///
/// Purpose
/// -------
/// Turn one column of MCMC samples into an evaluable, sampleable 1-D density
/// that can serve as the prior of the next calibration step along the chain.
///
/// Fields
/// ------
/// - `samples`: the draws the estimate is centred on.
/// - `bandwidth`: kernel width `h > 0`.
/// - `kernel`: smoothing kernel family.
/// - `low`, `high`: support, i.e. the observed sample range, or
///   `x ± reach · h` when all samples equal `x`.
///
/// Invariants
/// ----------
/// - `samples` is non-empty and finite; `low < high`; `bandwidth > 0`.
/// - `logpdf(v) = -inf` for `v` outside `[low, high]`.
///
/// Performance
/// -----------
/// - Evaluation is O(n) in the number of samples (one log-sum-exp pass).
#[derive(Debug, Clone, PartialEq)]
pub struct KernelDensity {
    samples: Vec<f64>,
    bandwidth: f64,
    kernel: KernelType,
    low: f64,
    high: f64,
    log_norm: f64,
}

impl KernelDensity {
    /// Fit a kernel density estimate to `samples`.
    ///
    /// # Errors
    /// - [`DensityError::EmptySamples`] if `samples` is empty.
    /// - [`DensityError::NonFiniteSample`] for the first NaN/±inf draw.
    /// - [`DensityError::InvalidBandwidth`] from a bad `Fixed` rule.
    pub fn new(samples: &[f64], kernel: KernelType, rule: BandwidthRule) -> DensityResult<Self> {
        if samples.is_empty() {
            return Err(DensityError::EmptySamples);
        }
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DensityError::NonFiniteSample { index, value });
        }
        let bandwidth = rule.bandwidth(samples)?;
        let mut low = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let mut high = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if high <= low {
            let reach = kernel.reach() * bandwidth;
            (low, high) = (low - reach, high + reach);
        }
        let log_norm = -((samples.len() as f64) * bandwidth).ln();
        Ok(Self { samples: samples.to_vec(), bandwidth, kernel, low, high, log_norm })
    }

    /// Log-density at `v`; `-inf` outside the sample range.
    pub fn logpdf(&self, v: f64) -> f64 {
        if !(v >= self.low && v <= self.high) {
            return f64::NEG_INFINITY;
        }
        let inv_h = 1.0 / self.bandwidth;
        let log_terms = self.samples.iter().map(|&s| self.kernel.log_weight((v - s) * inv_h));
        log_sum_exp(log_terms) + self.log_norm
    }

    /// Closed support `(low, high)`.
    pub fn support(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn kernel(&self) -> KernelType {
        self.kernel
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Value maximizing the estimate, located on a regular grid over the support.
    ///
    /// Ties resolve to the lowest grid point.
    pub fn mode(&self) -> f64 {
        let step = (self.high - self.low) / (MODE_GRID_POINTS - 1) as f64;
        let mut best = (self.low, f64::NEG_INFINITY);
        for k in 0..MODE_GRID_POINTS {
            let v = if k + 1 == MODE_GRID_POINTS { self.high } else { self.low + step * k as f64 };
            let lp = self.logpdf(v);
            if lp > best.1 {
                best = (v, lp);
            }
        }
        best.0
    }

    /// Draw from the estimate restricted to its support.
    ///
    /// Picks a sample uniformly, perturbs it with kernel noise and rejects
    /// draws outside `[low, high]`. After repeated rejection the picked sample
    /// itself is returned, which always lies inside the support.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let mut centre = self.samples[0];
        for _ in 0..MAX_SAMPLING_ATTEMPTS {
            centre = self.samples[rng.random_range(0..self.samples.len())];
            let v = centre + self.bandwidth * self.kernel.draw(rng);
            if v >= self.low && v <= self.high {
                return v;
            }
        }
        centre
    }
}

// ---- Helper Methods ----

/// Numerically stable `ln Σ exp(x_k)`; `-inf` for an empty or all `-inf` input.
pub fn log_sum_exp<I: IntoIterator<Item = f64>>(terms: I) -> f64 {
    let terms: Vec<f64> = terms.into_iter().collect();
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + terms.iter().map(|&t| (t - max).exp()).sum::<f64>().ln()
}

fn sample_std(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    samples.iter().std_dev()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Kernel log-weights and bandwidth rules.
    // - Support handling, normalization and mode search of `KernelDensity`.
    // - Sampling stays inside the support.
    // -------------------------------------------------------------------------

    fn symmetric_samples() -> Vec<f64> {
        (0..201).map(|k| -1.0 + 0.01 * k as f64).collect()
    }

    #[test]
    // Purpose
    // -------
    // The Gaussian kernel log-weight at u = 0 equals ln(1/√(2π)).
    fn gaussian_log_weight_matches_standard_normal_at_zero() {
        let expected = -(2.0 * std::f64::consts::PI).sqrt().ln();
        assert!((KernelType::Gaussian.log_weight(0.0) - expected).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The Epanechnikov kernel has compact support on |u| < 1.
    fn epanechnikov_log_weight_is_neg_inf_outside_unit_interval() {
        assert_eq!(KernelType::Epanechnikov.log_weight(1.0), f64::NEG_INFINITY);
        assert_eq!(KernelType::Epanechnikov.log_weight(-2.5), f64::NEG_INFINITY);
        assert!((KernelType::Epanechnikov.log_weight(0.0) - 0.75_f64.ln()).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Scott's rule reproduces σ̂ · n^(-1/5).
    //
    // Given
    // -----
    // - samples = [1, 2, 3, 4], σ̂ = sqrt(5/3).
    fn scott_bandwidth_matches_closed_form() {
        let samples = [1.0, 2.0, 3.0, 4.0];
        let h = BandwidthRule::Scott.bandwidth(&samples).unwrap();
        let expected = (5.0_f64 / 3.0).sqrt() * 4.0_f64.powf(-0.2);
        assert!((h - expected).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Identical samples fall back to a small positive bandwidth.
    fn degenerate_samples_get_positive_bandwidth() {
        let h = BandwidthRule::Scott.bandwidth(&[2.0, 2.0, 2.0]).unwrap();
        assert!(h > 0.0 && h < 0.01);
    }

    #[test]
    // Purpose
    // -------
    // Fixed bandwidths must be finite and positive.
    fn fixed_bandwidth_rejects_non_positive_width() {
        let err = BandwidthRule::Fixed(0.0).bandwidth(&[1.0]).unwrap_err();
        assert_eq!(err, DensityError::InvalidBandwidth { value: 0.0 });
    }

    #[test]
    // Purpose
    // -------
    // Construction rejects empty and non-finite sample sets.
    fn new_rejects_empty_and_non_finite_samples() {
        assert_eq!(
            KernelDensity::new(&[], KernelType::Gaussian, BandwidthRule::Scott).unwrap_err(),
            DensityError::EmptySamples
        );
        assert_eq!(
            KernelDensity::new(&[1.0, f64::NAN], KernelType::Gaussian, BandwidthRule::Scott)
                .unwrap_err()
                .to_string(),
            DensityError::NonFiniteSample { index: 1, value: f64::NAN }.to_string()
        );
    }

    #[test]
    // Purpose
    // -------
    // Outside the sample range the log-density is -inf; inside it is finite.
    fn logpdf_is_neg_inf_outside_sample_range() {
        let kde =
            KernelDensity::new(&symmetric_samples(), KernelType::Gaussian, BandwidthRule::Scott)
                .unwrap();
        assert_eq!(kde.support(), (-1.0, 1.0));
        assert_eq!(kde.logpdf(1.0001), f64::NEG_INFINITY);
        assert_eq!(kde.logpdf(-1.5), f64::NEG_INFINITY);
        assert!(kde.logpdf(0.3).is_finite());
    }

    #[test]
    // Purpose
    // -------
    // The estimate integrates to at most one over its support and loses only
    // a modest amount of edge mass.
    fn density_integrates_close_to_one_over_support() {
        let kde =
            KernelDensity::new(&symmetric_samples(), KernelType::Gaussian, BandwidthRule::Scott)
                .unwrap();
        let n = 4_000;
        let dx = 2.0 / n as f64;
        let mass: f64 = (0..n).map(|k| kde.logpdf(-1.0 + (k as f64 + 0.5) * dx).exp() * dx).sum();
        assert!(mass <= 1.0 + 1e-9);
        assert!(mass > 0.85, "mass = {mass}");
    }

    #[test]
    // Purpose
    // -------
    // The grid mode of a unimodal sample cloud sits at its centre.
    fn mode_of_symmetric_cloud_is_near_centre() {
        let samples: Vec<f64> =
            (0..400).map(|k| 3.0 + 0.5 * ((k as f64 + 0.5) / 400.0 - 0.5)).collect();
        let mut peaked = samples.clone();
        peaked.extend(std::iter::repeat_n(3.0, 200));
        let kde = KernelDensity::new(&peaked, KernelType::Gaussian, BandwidthRule::Scott).unwrap();
        assert!((kde.mode() - 3.0).abs() < 0.01, "mode = {}", kde.mode());
    }

    #[test]
    // Purpose
    // -------
    // Draws never leave the support, for both kernels.
    fn samples_stay_within_support() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for kernel in [KernelType::Gaussian, KernelType::Epanechnikov] {
            let kde = KernelDensity::new(&[0.0, 0.5, 1.0], kernel, BandwidthRule::Scott).unwrap();
            for _ in 0..500 {
                let v = kde.sample(&mut rng);
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // log_sum_exp is stable for very negative terms and handles all -inf.
    fn log_sum_exp_is_stable() {
        let v = log_sum_exp([-1000.0, -1000.0]);
        assert!((v - (-1000.0 + 2.0_f64.ln())).abs() < 1e-12);
        assert_eq!(log_sum_exp([f64::NEG_INFINITY]), f64::NEG_INFINITY);
    }
}
