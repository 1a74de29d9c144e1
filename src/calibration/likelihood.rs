//! Log-posterior construction for one calibration step.
//!
//! Purpose
//! -------
//! Bundle observations, per-timestep uncertainty, priors and a composite
//! model into a [`LogPosterior`] that the sampler and the MAP refinement can
//! evaluate without any hidden captured state.
//!
//! Evaluation
//! ----------
//! For a parameter vector `θ`:
//! 1. `lp = Σ_k ln p_k(θ_k)`. If `lp` is not finite the simulator is **not**
//!    run and `(-inf, [+inf; T])` is returned.
//! 2. `q = model.simulate(θ, forcing)`.
//! 3. Over `t ∈ [warmup, T)` with a finite observation `y_t`:
//!    `ℓ += -(q_t - y_t)² / (2σ_t²) - ln(√(2π)·σ_t)`.
//! 4. Returns `(lp + ℓ, q)` with the full-horizon series `q`.
//!
//! An all-missing window contributes `ℓ = 0`. A NaN total is reported as
//! `-inf` so it is always rejected.
use crate::{
    calibration::{
        ensemble::EnsembleStats,
        errors::{CalibrationError, CalibrationResult},
        sampler::{Evaluation, Target},
    },
    density::{distribution::Density, priors::sum_logpdf},
    models::{composite::CompositeModel, forcing::Forcing},
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, LogLikelihood, Theta},
    },
};
use ndarray::{Array1, ArrayView1};

/// Observations, uncertainty and warm-up for one calibration target.
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodConfig {
    observations: Array1<f64>,
    uncertainty: Array1<f64>,
    warmup: usize,
}

impl LikelihoodConfig {
    /// Validate and bundle a likelihood target.
    ///
    /// `observations` may contain NaN (missing). `uncertainty[t]` must be
    /// finite and `> 0` wherever `observations[t]` is finite.
    ///
    /// # Errors
    /// - [`CalibrationError::ObservationLengthMismatch`]
    /// - [`CalibrationError::WarmupOutOfRange`]
    /// - [`CalibrationError::InvalidUncertainty`]
    pub fn new(
        observations: Array1<f64>, uncertainty: Array1<f64>, warmup: usize,
    ) -> CalibrationResult<Self> {
        if observations.len() != uncertainty.len() {
            return Err(CalibrationError::ObservationLengthMismatch {
                observations: observations.len(),
                other: uncertainty.len(),
                what: "uncertainty",
            });
        }
        if warmup > observations.len() {
            return Err(CalibrationError::WarmupOutOfRange { warmup, len: observations.len() });
        }
        for (index, (&y, &s)) in observations.iter().zip(uncertainty.iter()).enumerate() {
            if y.is_finite() && !(s.is_finite() && s > 0.0) {
                return Err(CalibrationError::InvalidUncertainty { index, value: s });
            }
        }
        Ok(Self { observations, uncertainty, warmup })
    }

    /// Target an ensemble's mean with its floored spread as uncertainty.
    pub fn from_stats(stats: &EnsembleStats, warmup: usize) -> CalibrationResult<Self> {
        Self::new(stats.mean.clone(), stats.std.clone(), warmup)
    }

    pub fn observations(&self) -> &Array1<f64> {
        &self.observations
    }

    pub fn uncertainty(&self) -> &Array1<f64> {
        &self.uncertainty
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of finite observations inside the likelihood window.
    pub fn observed_count(&self) -> usize {
        self.observations.iter().skip(self.warmup).filter(|v| v.is_finite()).count()
    }

    /// Gaussian log-likelihood of `simulated` over the window.
    ///
    /// Returns `-inf` if the sum is NaN (e.g. an infinite simulation).
    pub fn log_likelihood(&self, simulated: ArrayView1<f64>) -> f64 {
        let half_ln_2pi = 0.5 * (2.0 * std::f64::consts::PI).ln();
        let mut total = 0.0;
        for t in self.warmup..self.observations.len() {
            let y = self.observations[t];
            if !y.is_finite() {
                continue;
            }
            let sigma = self.uncertainty[t];
            let r = simulated[t] - y;
            total += -(r * r) / (2.0 * sigma * sigma) - half_ln_2pi - sigma.ln();
        }
        if total.is_nan() { f64::NEG_INFINITY } else { total }
    }
}

/// `LogPosterior` — priors × Gaussian likelihood of a composite model.
///
/// Invariants
/// ----------
/// - `priors.len() == model.n_params()`.
/// - The model is only run for parameter vectors inside every prior support.
pub struct LogPosterior<'a> {
    config: LikelihoodConfig,
    priors: Vec<Density>,
    model: CompositeModel<'a>,
}

impl<'a> LogPosterior<'a> {
    /// # Errors
    /// - [`CalibrationError::PriorCountMismatch`] if the prior count differs
    ///   from the model's parameter count.
    pub fn new(
        config: LikelihoodConfig, priors: Vec<Density>, model: CompositeModel<'a>,
    ) -> CalibrationResult<Self> {
        if priors.len() != model.n_params() {
            return Err(CalibrationError::PriorCountMismatch {
                expected: model.n_params(),
                actual: priors.len(),
            });
        }
        Ok(Self { config, priors, model })
    }

    pub fn config(&self) -> &LikelihoodConfig {
        &self.config
    }

    pub fn priors(&self) -> &[Density] {
        &self.priors
    }

    pub fn model(&self) -> &CompositeModel<'a> {
        &self.model
    }

    /// Evaluate `(log-posterior, simulated series)` at `theta`.
    pub fn evaluate(&self, theta: ArrayView1<f64>, forcing: &Forcing) -> Evaluation {
        let n = forcing.len();
        let lp = sum_logpdf(&self.priors, theta);
        if !lp.is_finite() {
            return Evaluation::rejected(n);
        }
        let output = match self.model.simulate(theta, forcing) {
            Ok(q) if q.len() == self.config.len() => q,
            _ => return Evaluation::rejected(n),
        };
        let ll = self.config.log_likelihood(output.view());
        Evaluation { log_post: lp + ll, output }
    }
}

impl Target for LogPosterior<'_> {
    type Data = Forcing;

    fn dim(&self) -> usize {
        self.priors.len()
    }

    fn evaluate(&self, theta: ArrayView1<f64>, data: &Forcing) -> Evaluation {
        LogPosterior::evaluate(self, theta, data)
    }
}

impl LogLikelihood for LogPosterior<'_> {
    type Data = Forcing;

    fn value(&self, theta: &Theta, data: &Forcing) -> OptResult<Cost> {
        Ok(LogPosterior::evaluate(self, theta.view(), data).log_post)
    }

    fn check(&self, theta: &Theta, data: &Forcing) -> OptResult<()> {
        if theta.len() != self.priors.len() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.priors.len(),
                actual: theta.len(),
            });
        }
        if data.len() != self.config.len() {
            return Err(OptError::DataLengthMismatch {
                expected: self.config.len(),
                actual: data.len(),
            });
        }
        Ok(())
    }

    fn scales(&self, _theta: &Theta, _data: &Forcing) -> Theta {
        self.priors.iter().map(Density::proposal_width).collect()
    }
}
