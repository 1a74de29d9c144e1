//! Meteorological forcing shared by every sub-basin of the chain.
use crate::models::errors::{ModelError, ModelResult};
use ndarray::Array1;

/// `Forcing` — precipitation and potential evapotranspiration series.
///
/// Invariants
/// ----------
/// - Both series are non-empty, finite, and have the same length `T`.
/// - Every simulator output produced from a `Forcing` has length `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Forcing {
    precipitation: Array1<f64>,
    potential_evapotranspiration: Array1<f64>,
}

impl Forcing {
    /// Validate and wrap the two forcing series.
    ///
    /// # Errors
    /// - [`ModelError::EmptyForcing`], [`ModelError::ForcingLengthMismatch`],
    ///   or [`ModelError::NonFiniteForcing`] naming the first offending entry.
    pub fn new(
        precipitation: Array1<f64>, potential_evapotranspiration: Array1<f64>,
    ) -> ModelResult<Self> {
        if precipitation.len() != potential_evapotranspiration.len() {
            return Err(ModelError::ForcingLengthMismatch {
                precipitation: precipitation.len(),
                evapotranspiration: potential_evapotranspiration.len(),
            });
        }
        if precipitation.is_empty() {
            return Err(ModelError::EmptyForcing);
        }
        check_finite("precipitation", &precipitation)?;
        check_finite("potential evapotranspiration", &potential_evapotranspiration)?;
        Ok(Self { precipitation, potential_evapotranspiration })
    }

    pub fn precipitation(&self) -> &Array1<f64> {
        &self.precipitation
    }

    pub fn potential_evapotranspiration(&self) -> &Array1<f64> {
        &self.potential_evapotranspiration
    }

    /// Number of timesteps `T`.
    pub fn len(&self) -> usize {
        self.precipitation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.precipitation.is_empty()
    }
}

fn check_finite(series: &'static str, values: &Array1<f64>) -> ModelResult<()> {
    match values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(ModelError::NonFiniteForcing { series, index, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Forcing rejects mismatched, empty and non-finite series.
    fn new_validates_series() {
        assert_eq!(
            Forcing::new(array![1.0, 2.0], array![1.0]).unwrap_err(),
            ModelError::ForcingLengthMismatch { precipitation: 2, evapotranspiration: 1 }
        );
        assert_eq!(
            Forcing::new(Array1::zeros(0), Array1::zeros(0)).unwrap_err(),
            ModelError::EmptyForcing
        );
        assert_eq!(
            Forcing::new(array![1.0, 2.0], array![0.5, f64::INFINITY]).unwrap_err(),
            ModelError::NonFiniteForcing {
                series: "potential evapotranspiration",
                index: 1,
                value: f64::INFINITY
            }
        );
        assert_eq!(Forcing::new(array![1.0, 2.0], array![0.5, 0.5]).unwrap().len(), 2);
    }
}
