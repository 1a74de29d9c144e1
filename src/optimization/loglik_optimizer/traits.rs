//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their objective.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`OptimOutcome`]: normalized result returned by the high-level `maximize` API.
//!
//! Convention: we *maximize* a user log-likelihood (or log-posterior) `ℓ(θ)`
//! by minimizing the cost `c(θ) = -ℓ(θ)` with a derivative-free simplex
//! search, so no gradient is ever requested.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Theta,
        types::DEFAULT_SIMPLEX_SCALE,
        validation::{validate_theta_hat, validate_value, verify_simplex_scale, verify_tol_cost},
    },
};
use argmin::core::TerminationStatus;
use serde::{Deserialize, Serialize};

/// User-implemented log-likelihood interface.
///
/// - `type Data`: per-model data carried into `value`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`. A value of
///   `-inf` (zero probability) is allowed and steers the simplex away.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `scales(&Theta, &Data) -> Theta`: characteristic size of each
///   coordinate, used to shape the initial simplex. Defaults to ones.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn scales(&self, theta: &Theta, _data: &Self::Data) -> Theta {
        Theta::ones(theta.len())
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — stopping tolerance and iteration limit.
/// - `simplex_scale: f64` — initial simplex edge `k` is
///   `simplex_scale · scales[k]` along coordinate `k`.
///
/// Default:
/// - `tols`: `tol_cost = 1e-8`, `max_iter = 500`
/// - `simplex_scale`: `0.05`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub simplex_scale: f64,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidSimplexScale`] for a non-finite or non-positive scale.
    pub fn new(tols: Tolerances, simplex_scale: f64) -> OptResult<Self> {
        verify_simplex_scale(simplex_scale)?;
        Ok(Self { tols, simplex_scale })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_cost: Some(1e-8), max_iter: Some(500) },
            simplex_scale: DEFAULT_SIMPLEX_SCALE,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_cost`: terminate when the standard deviation of the simplex
///   costs falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Either field can be `None` but **at least one** must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_cost` or `max_iter` must be `Some`.
    /// - If provided, `tol_cost` must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if both are `None`.
    /// - [`OptError::InvalidTolCost`] for a non-finite or non-positive tolerance.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(tol_cost: Option<f64>, max_iter: Option<usize>) -> OptResult<Self> {
        if tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_cost, max_iter })
    }
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** value `ℓ(θ)` (not the cost).
/// - `converged`: `true` if the solver reported a terminating status other
///   than `NotTerminated`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let iterations = iterations as usize;
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals })
    }
}
