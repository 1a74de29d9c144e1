use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        LogLikelihood, MLEOptions, OptimOutcome, adapter::ArgMinAdapter,
        types::NelderMeadSolver,
    },
};
use argmin::core::{Executor, State};

/// Execute a Nelder–Mead run and normalize the final state.
///
/// The solver's best vertex becomes `theta_hat`, and the best cost is
/// flipped back to log-likelihood space.
pub fn run_nelder_mead<'a, F>(
    opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: NelderMeadSolver,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
{
    let mut optimizer = Executor::new(problem, solver);
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    tracing::debug!(
        iterations,
        best_cost = result.get_best_cost(),
        status = ?termination,
        "nelder-mead finished"
    );
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
    )
}
