use crate::optimization::loglik_optimizer::{
    traits::LogLikelihood,
    types::{Cost, Theta},
};
use argmin::core::{CostFunction, Error};

/// Bridges a [`LogLikelihood`] into Argmin's minimization interface.
///
/// The cost is `c(θ) = -ℓ(θ)`. A non-finite `ℓ(θ)` (zero probability or a
/// numerical failure) becomes `c(θ) = +inf`, which the simplex treats as the
/// worst possible vertex instead of aborting the run.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Ok(f64::INFINITY);
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    struct HalfLine;

    impl LogLikelihood for HalfLine {
        type Data = ();

        fn value(&self, theta: &Theta, _data: &()) -> OptResult<Cost> {
            Ok(if theta[0] < 0.0 { f64::NEG_INFINITY } else { -theta[0] })
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // The adapter flips the sign and maps -inf log-likelihoods to +inf cost.
    fn cost_is_negated_and_infinite_outside_domain() {
        let adapter = ArgMinAdapter::new(&HalfLine, &());
        assert_eq!(adapter.cost(&array![2.0]).unwrap(), 2.0);
        assert_eq!(adapter.cost(&array![-1.0]).unwrap(), f64::INFINITY);
    }
}
