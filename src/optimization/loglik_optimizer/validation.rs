use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::Theta,
};

pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

pub fn verify_simplex_scale(scale: f64) -> OptResult<()> {
    if !scale.is_finite() {
        return Err(OptError::InvalidSimplexScale { scale, reason: "Scale must be finite." });
    }
    if scale <= 0.0 {
        return Err(OptError::InvalidSimplexScale { scale, reason: "Scale must be positive." });
    }
    Ok(())
}

/// Check an initial guess: expected length and finite entries.
pub fn validate_theta0(theta: &Theta, dim: usize) -> OptResult<()> {
    if theta.len() != dim {
        return Err(OptError::ThetaLengthMismatch { expected: dim, actual: theta.len() });
    }
    match theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(OptError::InvalidThetaInput { index, value }),
        None => Ok(()),
    }
}

pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn verify_tol_cost_rejects_non_positive_and_non_finite() {
        assert!(verify_tol_cost(None).is_ok());
        assert!(verify_tol_cost(Some(1e-8)).is_ok());
        assert!(matches!(verify_tol_cost(Some(0.0)), Err(OptError::InvalidTolCost { .. })));
        assert!(matches!(verify_tol_cost(Some(f64::NAN)), Err(OptError::InvalidTolCost { .. })));
    }

    #[test]
    fn validate_theta0_reports_length_and_first_non_finite_index() {
        assert_eq!(
            validate_theta0(&array![1.0, 2.0], 3),
            Err(OptError::ThetaLengthMismatch { expected: 3, actual: 2 })
        );
        assert_eq!(
            validate_theta0(&array![1.0, f64::INFINITY], 2),
            Err(OptError::InvalidThetaInput { index: 1, value: f64::INFINITY })
        );
        assert!(validate_theta0(&array![1.0, 2.0], 2).is_ok());
    }

    #[test]
    fn validate_theta_hat_requires_presence_and_finiteness() {
        assert_eq!(validate_theta_hat(None), Err(OptError::MissingThetaHat));
        assert!(matches!(
            validate_theta_hat(Some(array![0.0, f64::NEG_INFINITY])),
            Err(OptError::InvalidThetaHat { index: 1, .. })
        ));
    }
}
