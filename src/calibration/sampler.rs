//! Random-walk Metropolis–Hastings sampler.
//!
//! Purpose
//! -------
//! Draw posterior parameter samples for one calibration step together with
//! the simulated series produced at every retained step.
//!
//! Key behaviors
//! -------------
//! - Two phases, [`Phase::BurnIn`] and [`Phase::Sampling`], share one
//!   transition rule; only sampling retains draws.
//! - Proposals are `x' = x + s ⊙ z` with `z ~ N(0, I)` and a per-parameter
//!   step vector `s`.
//! - A proposal is accepted with probability `min(1, exp(L' − L))`; a
//!   non-finite `L'` is always rejected.
//! - Rejected steps repeat the current parameters *and* the current
//!   simulated series, so the ensemble keeps one member per step.
//! - Optional burn-in adaptation rescales `s` every [`ADAPT_BATCH`] steps to
//!   steer the acceptance rate toward roughly 0.234; steps are frozen
//!   once sampling starts.
//!
//! Invariants & assumptions
//! ------------------------
//! - The starting log-posterior is finite (checked at construction).
//! - All randomness comes from the caller-supplied RNG.
use crate::calibration::errors::{CalibrationError, CalibrationResult};
use ndarray::{Array1, Array2, ArrayView1, Zip};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Burn-in steps between two proposal-scale adaptations.
pub const ADAPT_BATCH: usize = 25;

/// Result of one target evaluation: log-posterior and simulated series.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub log_post: f64,
    pub output: Array1<f64>,
}

impl Evaluation {
    /// Zero-probability evaluation with an all-`+inf` sentinel series.
    pub fn rejected(n_steps: usize) -> Self {
        Self { log_post: f64::NEG_INFINITY, output: Array1::from_elem(n_steps, f64::INFINITY) }
    }
}

/// Distribution the sampler explores.
///
/// `evaluate` must be deterministic in `(theta, data)`.
pub trait Target: Sync {
    type Data: Sync;

    fn dim(&self) -> usize;

    fn evaluate(&self, theta: ArrayView1<f64>, data: &Self::Data) -> Evaluation;
}

/// Sampler configuration.
///
/// - `burn_in`: discarded transitions before sampling.
/// - `n_steps`: retained transitions per chain.
/// - `proposal_scale`: step size as a fraction of each prior's width.
/// - `adapt`: rescale steps during burn-in.
/// - `n_chains`: independent chains pooled into one result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerOptions {
    pub burn_in: usize,
    pub n_steps: usize,
    pub proposal_scale: f64,
    pub adapt: bool,
    pub n_chains: usize,
}

impl SamplerOptions {
    /// # Errors
    /// - [`CalibrationError::InvalidSamplerOption`] if `n_steps` or `n_chains`
    ///   is zero, or `proposal_scale` is not finite and `> 0`.
    pub fn new(
        burn_in: usize, n_steps: usize, proposal_scale: f64, adapt: bool, n_chains: usize,
    ) -> CalibrationResult<Self> {
        let opts = Self { burn_in, n_steps, proposal_scale, adapt, n_chains };
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> CalibrationResult<()> {
        if self.n_steps == 0 {
            return Err(CalibrationError::InvalidSamplerOption {
                name: "n_steps",
                value: 0.0,
                reason: "at least one sampling step is required",
            });
        }
        if self.n_chains == 0 {
            return Err(CalibrationError::InvalidSamplerOption {
                name: "n_chains",
                value: 0.0,
                reason: "at least one chain is required",
            });
        }
        if !self.proposal_scale.is_finite() || self.proposal_scale <= 0.0 {
            return Err(CalibrationError::InvalidSamplerOption {
                name: "proposal_scale",
                value: self.proposal_scale,
                reason: "must be finite and > 0",
            });
        }
        Ok(())
    }
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self { burn_in: 1_000, n_steps: 1_000, proposal_scale: 0.1, adapt: true, n_chains: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BurnIn,
    Sampling,
}

/// Retained draws of one sampling run.
///
/// - `samples`: `n_steps × dim` parameter draws.
/// - `log_posts`: log-posterior of each draw.
/// - `outputs`: `n_steps × T` simulated series of each draw.
/// - `acceptance_rate`: accepted / proposed over the sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerOutput {
    pub samples: Array2<f64>,
    pub log_posts: Array1<f64>,
    pub outputs: Array2<f64>,
    pub acceptance_rate: f64,
}

pub struct MetropolisHastings<'t, T: Target> {
    target: &'t T,
    data: &'t T::Data,
    state: Array1<f64>,
    current: Evaluation,
    steps: Array1<f64>,
    phase: Phase,
    adapt: bool,
    batch_accepted: usize,
    batch_proposed: usize,
}

impl<'t, T: Target> MetropolisHastings<'t, T> {
    /// Start a chain at `x0` with per-parameter proposal `steps`.
    ///
    /// # Errors
    /// - [`CalibrationError::InitialStateLengthMismatch`] if `x0` or `steps`
    ///   do not match `target.dim()`.
    /// - [`CalibrationError::InvalidSamplerOption`] for a non-finite or
    ///   non-positive step.
    /// - [`CalibrationError::NonFiniteInitialState`] if `L(x0)` is not finite.
    pub fn new(
        target: &'t T, data: &'t T::Data, x0: Array1<f64>, steps: Array1<f64>,
    ) -> CalibrationResult<Self> {
        let dim = target.dim();
        for len in [x0.len(), steps.len()] {
            if len != dim {
                return Err(CalibrationError::InitialStateLengthMismatch {
                    expected: dim,
                    actual: len,
                });
            }
        }
        if let Some(&bad) = steps.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(CalibrationError::InvalidSamplerOption {
                name: "step",
                value: bad,
                reason: "proposal steps must be finite and > 0",
            });
        }
        let current = target.evaluate(x0.view(), data);
        if !current.log_post.is_finite() {
            return Err(CalibrationError::NonFiniteInitialState { value: current.log_post });
        }
        Ok(Self {
            target,
            data,
            state: x0,
            current,
            steps,
            phase: Phase::BurnIn,
            adapt: false,
            batch_accepted: 0,
            batch_proposed: 0,
        })
    }

    /// Enable or disable burn-in step adaptation.
    pub fn with_adaptation(mut self, adapt: bool) -> Self {
        self.adapt = adapt;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &Array1<f64> {
        &self.state
    }

    pub fn log_post(&self) -> f64 {
        self.current.log_post
    }

    pub fn steps(&self) -> &Array1<f64> {
        &self.steps
    }

    /// Freeze the proposal steps and switch to retaining draws.
    pub fn start_sampling(&mut self) {
        self.phase = Phase::Sampling;
    }

    /// One Metropolis–Hastings transition. Returns `true` on acceptance.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let mut proposal = self.state.clone();
        Zip::from(&mut proposal).and(&self.steps).for_each(|x, &s| {
            let z: f64 = rng.sample(StandardNormal);
            *x += s * z;
        });
        let candidate = self.target.evaluate(proposal.view(), self.data);
        let accept = if !candidate.log_post.is_finite() {
            false
        } else {
            let delta = candidate.log_post - self.current.log_post;
            delta >= 0.0 || rng.random::<f64>().ln() < delta
        };
        if accept {
            self.state = proposal;
            self.current = candidate;
        }
        accept
    }

    /// Run `n_steps` transitions.
    ///
    /// In burn-in nothing is retained and `None` is returned. In sampling the
    /// retained draws are returned (`n_steps` rows, rejected steps repeating
    /// the previous row).
    pub fn run<R: Rng + ?Sized>(&mut self, n_steps: usize, rng: &mut R) -> Option<SamplerOutput> {
        match self.phase {
            Phase::BurnIn => {
                for _ in 0..n_steps {
                    let accepted = self.step(rng);
                    if self.adapt {
                        self.record_for_adaptation(accepted);
                    }
                }
                None
            }
            Phase::Sampling => {
                let dim = self.state.len();
                let n_out = self.current.output.len();
                let mut samples = Array2::zeros((n_steps, dim));
                let mut outputs = Array2::zeros((n_steps, n_out));
                let mut log_posts = Array1::zeros(n_steps);
                let mut accepted = 0usize;
                for k in 0..n_steps {
                    if self.step(rng) {
                        accepted += 1;
                    }
                    samples.row_mut(k).assign(&self.state);
                    outputs.row_mut(k).assign(&self.current.output);
                    log_posts[k] = self.current.log_post;
                }
                let acceptance_rate =
                    if n_steps == 0 { 0.0 } else { accepted as f64 / n_steps as f64 };
                Some(SamplerOutput { samples, log_posts, outputs, acceptance_rate })
            }
        }
    }

    fn record_for_adaptation(&mut self, accepted: bool) {
        self.batch_proposed += 1;
        if accepted {
            self.batch_accepted += 1;
        }
        if self.batch_proposed < ADAPT_BATCH {
            return;
        }
        let rate = self.batch_accepted as f64 / self.batch_proposed as f64;
        let factor = adaptation_factor(rate);
        if factor != 1.0 {
            self.steps.mapv_inplace(|s| s * factor);
        }
        self.batch_accepted = 0;
        self.batch_proposed = 0;
    }
}

/// Step multiplier for a burn-in batch with the given acceptance rate.
pub fn adaptation_factor(rate: f64) -> f64 {
    if rate < 0.05 {
        0.5
    } else if rate < 0.15 {
        0.8
    } else if rate > 0.5 {
        2.0
    } else if rate > 0.3 {
        1.25
    } else {
        1.0
    }
}
