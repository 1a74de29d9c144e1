use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        traits::MLEOptions,
        types::{NelderMeadSolver, Theta},
    },
};

/// Initial simplex: `θ0` plus one vertex per coordinate,
/// `θ0 + simplex_scale · scales[k] · e_k`.
///
/// # Errors
/// - [`OptError::ThetaLengthMismatch`] if `scales` and `theta0` differ in length.
/// - [`OptError::InvalidSimplexStep`] for a zero or non-finite step.
pub fn initial_simplex(theta0: &Theta, scales: &Theta, opts: &MLEOptions) -> OptResult<Vec<Theta>> {
    if scales.len() != theta0.len() {
        return Err(OptError::ThetaLengthMismatch { expected: theta0.len(), actual: scales.len() });
    }
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for (index, &scale) in scales.iter().enumerate() {
        let step = opts.simplex_scale * scale;
        if !step.is_finite() || step == 0.0 {
            return Err(OptError::InvalidSimplexStep { index, value: step });
        }
        let mut vertex = theta0.clone();
        vertex[index] += step;
        vertices.push(vertex);
    }
    Ok(vertices)
}

pub fn build_nelder_mead(vertices: Vec<Theta>, opts: &MLEOptions) -> OptResult<NelderMeadSolver> {
    let mut solver = NelderMeadSolver::new(vertices);
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_sd_tolerance(tol)?;
    }
    Ok(solver)
}
