//! Observed data for every node of the chain.
use crate::{
    chain::{
        config::ChainConfig,
        errors::{ChainError, ChainResult},
    },
    models::forcing::Forcing,
};
use ndarray::Array1;

/// Observations at one sub-basin outlet.
///
/// `observations` uses NaN for unobserved timesteps. `uncertainty[t]` is the
/// Gaussian error scale `σ_t` of `observations[t]`; it only has to be valid
/// where an observation exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub observations: Array1<f64>,
    pub uncertainty: Array1<f64>,
}

impl NodeData {
    pub fn new(observations: Array1<f64>, uncertainty: Array1<f64>) -> Self {
        Self { observations, uncertainty }
    }

    /// Observations with a constant error scale `sigma`.
    pub fn with_constant_uncertainty(observations: Array1<f64>, sigma: f64) -> Self {
        let uncertainty = Array1::from_elem(observations.len(), sigma);
        Self { observations, uncertainty }
    }
}

/// Forcing shared by every node plus per-node observations, node 0 first.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainInputs {
    pub forcing: Forcing,
    pub nodes: Vec<NodeData>,
}

impl ChainInputs {
    /// # Errors
    /// - [`ChainError::SeriesLengthMismatch`] naming the first node whose
    ///   observations or uncertainty differ from the forcing length.
    pub fn new(forcing: Forcing, nodes: Vec<NodeData>) -> ChainResult<Self> {
        let expected = forcing.len();
        for (node, data) in nodes.iter().enumerate() {
            for actual in [data.observations.len(), data.uncertainty.len()] {
                if actual != expected {
                    return Err(ChainError::SeriesLengthMismatch { node, expected, actual });
                }
            }
        }
        Ok(Self { forcing, nodes })
    }

    /// Check the inputs against a configuration.
    ///
    /// # Errors
    /// - [`ChainError::NodeCountMismatch`] if the node counts differ.
    /// - [`ChainError::WarmupOutOfRange`] if the warm-up leaves no timestep.
    pub fn check(&self, config: &ChainConfig) -> ChainResult<()> {
        if self.nodes.len() != config.n_nodes {
            return Err(ChainError::NodeCountMismatch {
                expected: config.n_nodes,
                actual: self.nodes.len(),
            });
        }
        if config.warmup >= self.forcing.len() {
            return Err(ChainError::WarmupOutOfRange {
                warmup: config.warmup,
                len: self.forcing.len(),
            });
        }
        Ok(())
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Series length problems name the offending node.
    fn new_reports_node_of_length_mismatch() {
        let forcing = Forcing::new(array![1.0, 1.0], array![0.0, 0.0]).unwrap();
        let nodes = vec![
            NodeData::with_constant_uncertainty(array![1.0, 2.0], 0.1),
            NodeData::new(array![1.0, 2.0], array![0.1]),
        ];
        assert_eq!(
            ChainInputs::new(forcing, nodes).unwrap_err(),
            ChainError::SeriesLengthMismatch { node: 1, expected: 2, actual: 1 }
        );
    }
}
