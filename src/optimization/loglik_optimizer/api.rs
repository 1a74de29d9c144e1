use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_nelder_mead, initial_simplex},
        run::run_nelder_mead,
        traits::{LogLikelihood, MLEOptions},
        validation::validate_theta0,
    },
};

/// Maximize `ℓ(θ)` from `theta0` with a Nelder–Mead simplex search.
///
/// Steps:
/// 1. `f.check(theta0, data)` and a finiteness check of `theta0`.
/// 2. Build the initial simplex from `f.scales(theta0, data)`.
/// 3. Run the solver on `c(θ) = -ℓ(θ)` and wrap the result.
///
/// # Errors
/// - Validation errors from `check`, the initial guess or the simplex.
/// - Backend errors converted from Argmin.
/// - [`crate::optimization::errors::OptError::NonFiniteCost`] when no finite
///   objective value was found.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    validate_theta0(&theta0, theta0.len())?;
    let scales = f.scales(&theta0, data);
    let vertices = initial_simplex(&theta0, &scales, opts)?;
    let solver = build_nelder_mead(vertices, opts)?;
    let problem = ArgMinAdapter::new(f, data);
    run_nelder_mead(opts, problem, solver)
}
