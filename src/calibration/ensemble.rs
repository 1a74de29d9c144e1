//! Posterior ensembles of simulated series and their per-timestep statistics.
//!
//! An [`Ensemble`] stores one simulated series per retained MCMC step as the
//! rows of a `members × timesteps` matrix. [`Ensemble::stats`] reduces it to
//! a mean and a standard-deviation series, ignoring non-finite entries and
//! flooring zero spreads, which is the shape a likelihood needs when an
//! ensemble stands in for observations.
use crate::calibration::errors::{CalibrationError, CalibrationResult};
use ndarray::{Array1, Array2, ArrayView1, Axis, concatenate};

/// Per-timestep mean and standard deviation of an ensemble.
///
/// Invariants
/// ----------
/// - Both series have the ensemble's number of timesteps.
/// - Where at least one member is finite, `std` is finite and `> 0`.
/// - Where no member is finite, both `mean` and `std` are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleStats {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

/// Simulated-output ensemble, rows = members, columns = timesteps.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    members: Array2<f64>,
}

impl Ensemble {
    /// Wrap a `members × timesteps` matrix.
    ///
    /// # Errors
    /// - [`CalibrationError::EmptyEnsemble`] if there are no rows.
    pub fn new(members: Array2<f64>) -> CalibrationResult<Self> {
        if members.nrows() == 0 {
            return Err(CalibrationError::EmptyEnsemble);
        }
        Ok(Self { members })
    }

    /// Stack equally long series into an ensemble.
    ///
    /// # Errors
    /// - [`CalibrationError::EmptyEnsemble`] for an empty list.
    /// - [`CalibrationError::EnsembleLengthMismatch`] if lengths differ.
    pub fn from_rows(rows: &[Array1<f64>]) -> CalibrationResult<Self> {
        let first = rows.first().ok_or(CalibrationError::EmptyEnsemble)?;
        let n_steps = first.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n_steps) {
            return Err(CalibrationError::EnsembleLengthMismatch {
                expected: n_steps,
                actual: bad.len(),
            });
        }
        let views: Vec<ArrayView1<f64>> = rows.iter().map(|r| r.view()).collect();
        let members = ndarray::stack(Axis(0), &views).map_err(|_| {
            CalibrationError::EnsembleLengthMismatch { expected: n_steps, actual: n_steps }
        })?;
        Ok(Self { members })
    }

    /// Concatenate ensembles along the member axis, preserving order.
    ///
    /// # Errors
    /// - [`CalibrationError::EmptyEnsemble`] for an empty list.
    /// - [`CalibrationError::EnsembleLengthMismatch`] if timestep counts differ.
    pub fn pool(parts: &[&Ensemble]) -> CalibrationResult<Self> {
        let first = parts.first().ok_or(CalibrationError::EmptyEnsemble)?;
        let n_steps = first.n_steps();
        if let Some(bad) = parts.iter().find(|e| e.n_steps() != n_steps) {
            return Err(CalibrationError::EnsembleLengthMismatch {
                expected: n_steps,
                actual: bad.n_steps(),
            });
        }
        let views: Vec<_> = parts.iter().map(|e| e.members.view()).collect();
        let members = concatenate(Axis(0), &views).map_err(|_| {
            CalibrationError::EnsembleLengthMismatch { expected: n_steps, actual: n_steps }
        })?;
        Ok(Self { members })
    }

    pub fn members(&self) -> &Array2<f64> {
        &self.members
    }

    pub fn n_members(&self) -> usize {
        self.members.nrows()
    }

    pub fn n_steps(&self) -> usize {
        self.members.ncols()
    }

    /// Mean and floored standard deviation per timestep.
    ///
    /// Non-finite member values are ignored. The standard deviation uses the
    /// population (`1/n`) form over the finite values. Any exact zero is then
    /// replaced by the smallest strictly positive entry of the series.
    ///
    /// # Errors
    /// - [`CalibrationError::DegenerateUncertainty`] if no timestep has a
    ///   strictly positive spread.
    pub fn stats(&self) -> CalibrationResult<EnsembleStats> {
        let (mean, std) = self.moments();
        let std = floor_zero_std(std)?;
        Ok(EnsembleStats { mean, std })
    }

    fn moments(&self) -> (Array1<f64>, Array1<f64>) {
        let n_steps = self.n_steps();
        let mut mean = Array1::from_elem(n_steps, f64::NAN);
        let mut std = Array1::from_elem(n_steps, f64::NAN);
        for (t, column) in self.members.axis_iter(Axis(1)).enumerate() {
            let (count, sum) = column
                .iter()
                .filter(|v| v.is_finite())
                .fold((0usize, 0.0), |(c, s), &v| (c + 1, s + v));
            if count == 0 {
                continue;
            }
            let m = sum / count as f64;
            let ss: f64 = column.iter().filter(|v| v.is_finite()).map(|v| (v - m).powi(2)).sum();
            mean[t] = m;
            std[t] = (ss / count as f64).sqrt();
        }
        (mean, std)
    }
}

/// Replace zero entries of `std` by its smallest strictly positive entry.
///
/// NaN entries (timesteps without finite members) are left untouched.
///
/// # Errors
/// - [`CalibrationError::DegenerateUncertainty`] if no entry is finite and `> 0`.
pub fn floor_zero_std(mut std: Array1<f64>) -> CalibrationResult<Array1<f64>> {
    let floor = std
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(f64::INFINITY, f64::min);
    if !floor.is_finite() {
        return Err(CalibrationError::DegenerateUncertainty);
    }
    std.mapv_inplace(|v| if v == 0.0 { floor } else { v });
    Ok(std)
}
