//! The [`Density`] type: uniform priors and kernel posteriors behind one API.
use crate::density::{
    errors::{DensityError, DensityResult},
    kernel::{BandwidthRule, KernelDensity, KernelType},
};
use rand::Rng;
use statrs::distribution::{Continuous, Uniform};

/// Flat prior on a closed interval.
///
/// Log-density evaluation is delegated to `statrs`' [`Uniform`]; the bounds
/// are kept alongside for support queries and sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformPrior {
    low: f64,
    high: f64,
    dist: Uniform,
}

impl UniformPrior {
    /// Build a flat prior on `[low, high]`.
    ///
    /// # Errors
    /// - [`DensityError::InvalidBounds`] if either bound is non-finite or
    ///   `low >= high`.
    pub fn new(low: f64, high: f64) -> DensityResult<Self> {
        if !low.is_finite() || !high.is_finite() {
            return Err(DensityError::InvalidBounds { low, high, reason: "bounds must be finite" });
        }
        if low >= high {
            return Err(DensityError::InvalidBounds { low, high, reason: "low must be < high" });
        }
        let dist = Uniform::new(low, high).map_err(|_| DensityError::InvalidBounds {
            low,
            high,
            reason: "rejected by uniform distribution",
        })?;
        Ok(Self { low, high, dist })
    }

    pub fn logpdf(&self, v: f64) -> f64 {
        if !(v >= self.low && v <= self.high) {
            return f64::NEG_INFINITY;
        }
        self.dist.ln_pdf(v)
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.low, self.high)
    }
}

/// `Density` — one-dimensional prior or posterior density.
///
/// Purpose
/// -------
/// Give the likelihood builder and the orchestrator a single, immutable
/// object they can evaluate (`logpdf`), sample from, and query for a mode,
/// regardless of whether it came from configuration bounds or from posterior
/// draws.
///
/// Variants
/// --------
/// - `Uniform`: flat prior, `logpdf(v) = -ln(hi - lo)` on `[lo, hi]`.
/// - `Kernel`: Gaussian kernel density estimate over posterior samples,
///   supported on the sample range.
///
/// Invariants
/// ----------
/// - `logpdf(v) = -inf` for every `v` outside [`Density::support`].
#[derive(Debug, Clone, PartialEq)]
pub enum Density {
    Uniform(UniformPrior),
    Kernel(KernelDensity),
}

impl Density {
    /// Flat density on `[low, high]`.
    ///
    /// # Errors
    /// - [`DensityError::InvalidBounds`] for non-finite bounds or `low >= high`.
    pub fn uniform(low: f64, high: f64) -> DensityResult<Self> {
        Ok(Density::Uniform(UniformPrior::new(low, high)?))
    }

    /// Gaussian kernel density estimate with Scott's bandwidth over `samples`.
    ///
    /// # Errors
    /// - [`DensityError::EmptySamples`] or [`DensityError::NonFiniteSample`].
    pub fn from_samples(samples: &[f64]) -> DensityResult<Self> {
        Self::from_samples_with(samples, KernelType::Gaussian, BandwidthRule::Scott)
    }

    /// Kernel density estimate with an explicit kernel and bandwidth rule.
    pub fn from_samples_with(
        samples: &[f64], kernel: KernelType, rule: BandwidthRule,
    ) -> DensityResult<Self> {
        Ok(Density::Kernel(KernelDensity::new(samples, kernel, rule)?))
    }

    pub fn logpdf(&self, v: f64) -> f64 {
        match self {
            Density::Uniform(u) => u.logpdf(v),
            Density::Kernel(k) => k.logpdf(v),
        }
    }

    pub fn pdf(&self, v: f64) -> f64 {
        self.logpdf(v).exp()
    }

    /// Closed support `(low, high)`.
    pub fn support(&self) -> (f64, f64) {
        match self {
            Density::Uniform(u) => u.bounds(),
            Density::Kernel(k) => k.support(),
        }
    }

    /// Most probable value. A uniform density has no unique mode; its
    /// midpoint is returned.
    pub fn mode(&self) -> f64 {
        match self {
            Density::Uniform(u) => {
                let (lo, hi) = u.bounds();
                0.5 * (lo + hi)
            }
            Density::Kernel(k) => k.mode(),
        }
    }

    /// Draw one value from the density (always inside the support).
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Density::Uniform(u) => {
                let (lo, hi) = u.bounds();
                rng.random_range(lo..=hi)
            }
            Density::Kernel(k) => k.sample(rng),
        }
    }

    /// Characteristic width used to scale random-walk proposals.
    ///
    /// The support width; always `> 0`.
    pub fn proposal_width(&self) -> f64 {
        let (lo, hi) = self.support();
        hi - lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    // Purpose
    // -------
    // A uniform density on [2, 6] has logpdf -ln 4 inside and -inf outside,
    // including at non-finite inputs.
    fn uniform_logpdf_inside_and_outside_support() {
        let d = Density::uniform(2.0, 6.0).unwrap();
        assert!((d.logpdf(2.0) + 4.0_f64.ln()).abs() < 1e-12);
        assert!((d.logpdf(6.0) + 4.0_f64.ln()).abs() < 1e-12);
        assert!((d.pdf(3.3) - 0.25).abs() < 1e-12);
        assert_eq!(d.logpdf(6.000_001), f64::NEG_INFINITY);
        assert_eq!(d.logpdf(f64::NAN), f64::NEG_INFINITY);
        assert_eq!(d.mode(), 4.0);
        assert_eq!(d.proposal_width(), 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Uniform construction rejects inverted, empty and non-finite bounds.
    fn uniform_rejects_bad_bounds() {
        assert!(matches!(Density::uniform(1.0, 1.0), Err(DensityError::InvalidBounds { .. })));
        assert!(matches!(Density::uniform(3.0, 1.0), Err(DensityError::InvalidBounds { .. })));
        assert!(matches!(
            Density::uniform(0.0, f64::INFINITY),
            Err(DensityError::InvalidBounds { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A density fitted to samples is supported on the sample range and its
    // mode sits near the sample centre.
    //
    // Given
    // -----
    // - 1000 standard-normal-like draws shifted to 4.0.
    //
    // Expect
    // ------
    // - support equals [min, max]; mode within 0.2 of 4.0.
    fn from_samples_support_and_mode() {
        use rand_distr::{Distribution, Normal};
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let normal = Normal::new(4.0, 0.5).unwrap();
        let draws: Vec<f64> = (0..1000).map(|_| normal.sample(&mut rng)).collect();
        let d = Density::from_samples(&draws).unwrap();
        let lo = draws.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = draws.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(d.support(), (lo, hi));
        assert!((d.mode() - 4.0).abs() < 0.2, "mode = {}", d.mode());
        assert_eq!(d.logpdf(hi + 1.0), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Uniform draws fall inside the declared bounds.
    fn uniform_samples_stay_in_bounds() {
        let d = Density::uniform(-1.0, 1.0).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        assert!((0..1000).all(|_| (-1.0..=1.0).contains(&d.sample(&mut rng))));
    }

    #[test]
    // Purpose
    // -------
    // Identical samples still give a support that random-walk proposals can
    // move inside.
    //
    // Given
    // -----
    // - Ten draws all equal to 5.0, Gaussian kernel with bandwidth h.
    //
    // Expect
    // ------
    // - support = [5 − 4h, 5 + 4h]; proposal width 8h.
    // - finite logpdf at 5 and half way to either edge; mode within one
    //   grid step of 5; draws stay inside the widened support.
    fn degenerate_kernel_support_spans_kernel_reach() {
        let d = Density::from_samples(&[5.0; 10]).unwrap();
        let Density::Kernel(k) = &d else { panic!("expected a kernel density") };
        let h = k.bandwidth();
        let (lo, hi) = d.support();
        assert!((lo - (5.0 - 4.0 * h)).abs() < 1e-12);
        assert!((hi - (5.0 + 4.0 * h)).abs() < 1e-12);
        assert!((d.proposal_width() - 8.0 * h).abs() < 1e-12);
        for v in [5.0, 5.0 - 2.0 * h, 5.0 + 2.0 * h] {
            assert!(d.logpdf(v).is_finite(), "logpdf({v}) = {}", d.logpdf(v));
        }
        assert!((d.mode() - 5.0).abs() <= 8.0 * h / 511.0);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let draws: Vec<f64> = (0..200).map(|_| d.sample(&mut rng)).collect();
        assert!(draws.iter().all(|v| (lo..=hi).contains(v)));
        assert!(draws.iter().any(|&v| v != 5.0));
    }
}
