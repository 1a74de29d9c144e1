//! Chain configuration: node count, area weights, priors, sampler and seed.
use crate::{
    calibration::sampler::SamplerOptions,
    chain::errors::{ChainError, ChainResult},
    density::{distribution::Density, priors::flat},
    optimization::loglik_optimizer::MLEOptions,
};
use serde::{Deserialize, Serialize};

/// Area weights of one node's composite model.
///
/// `head` weighs the lagged upstream branch, `tail` the local branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaWeights {
    pub head: f64,
    pub tail: f64,
}

impl AreaWeights {
    /// Default weights of node `i`: `(1, 0)` at the source, `(i, 1)` downstream.
    pub fn default_for(node: usize) -> Self {
        if node == 0 { Self { head: 1.0, tail: 0.0 } } else { Self { head: node as f64, tail: 1.0 } }
    }

    fn validate(&self, node: usize) -> ChainResult<()> {
        let err = |reason| ChainError::InvalidArea { node, head: self.head, tail: self.tail, reason };
        if !self.head.is_finite() || !self.tail.is_finite() {
            return Err(err("weights must be finite"));
        }
        if self.head < 0.0 || self.tail < 0.0 {
            return Err(err("weights must be non-negative"));
        }
        if self.head + self.tail <= 0.0 {
            return Err(err("weights must have a positive sum"));
        }
        Ok(())
    }
}

/// Flat prior bounds per parameter class.
///
/// - `head`: bounds of the upstream (accumulated) model's parameters.
/// - `tail`: bounds of the local model's parameters.
/// - `delay`: bounds of the lag between the two branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    pub head: Vec<(f64, f64)>,
    pub tail: Vec<(f64, f64)>,
    pub delay: (f64, f64),
}

impl ParameterBounds {
    /// # Errors
    /// - [`ChainError::InvalidBounds`] for a non-finite or inverted pair.
    pub fn new(
        head: Vec<(f64, f64)>, tail: Vec<(f64, f64)>, delay: (f64, f64),
    ) -> ChainResult<Self> {
        let bounds = Self { head, tail, delay };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Same bounds for head and tail, as when every node runs one simulator.
    pub fn shared(params: Vec<(f64, f64)>, delay: (f64, f64)) -> ChainResult<Self> {
        Self::new(params.clone(), params, delay)
    }

    pub fn validate(&self) -> ChainResult<()> {
        check_pairs("head", &self.head)?;
        check_pairs("tail", &self.tail)?;
        check_pairs("delay", std::slice::from_ref(&self.delay))
    }

    /// Check both blocks against the simulator's parameter count.
    pub fn check_len(&self, n_params: usize) -> ChainResult<()> {
        for (class, block) in [("head", &self.head), ("tail", &self.tail)] {
            if block.len() != n_params {
                return Err(ChainError::BoundsLengthMismatch {
                    class,
                    expected: n_params,
                    actual: block.len(),
                });
            }
        }
        Ok(())
    }

    pub fn flat_head(&self) -> ChainResult<Vec<Density>> {
        Ok(flat(&self.head)?)
    }

    pub fn flat_tail(&self) -> ChainResult<Vec<Density>> {
        Ok(flat(&self.tail)?)
    }

    pub fn flat_delay(&self) -> ChainResult<Density> {
        Ok(Density::uniform(self.delay.0, self.delay.1)?)
    }
}

fn check_pairs(class: &'static str, pairs: &[(f64, f64)]) -> ChainResult<()> {
    for (index, &(low, high)) in pairs.iter().enumerate() {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ChainError::InvalidBounds { class, index, low, high });
        }
    }
    Ok(())
}

/// `ChainConfig` — everything the orchestrator needs besides data and models.
///
/// Fields
/// ------
/// - `n_nodes`: number of sub-basins `N ≥ 1`, numbered from the source.
/// - `areas`: one [`AreaWeights`] per node (defaults from
///   [`AreaWeights::default_for`]).
/// - `warmup`: leading timesteps excluded from every likelihood.
/// - `sampler`: burn-in / sampling budget of every calibration step.
/// - `bounds`: flat prior bounds per parameter class.
/// - `seed`: seed of the forward stream; the backward stream is derived
///   from it.
/// - `map_refinement`: when set, each sampler start point (the prior mode)
///   is refined by maximizing the log-posterior first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub n_nodes: usize,
    pub areas: Vec<AreaWeights>,
    pub warmup: usize,
    pub sampler: SamplerOptions,
    pub bounds: ParameterBounds,
    pub seed: u64,
    pub map_refinement: Option<MLEOptions>,
}

impl ChainConfig {
    /// Build a configuration with default area weights and no MAP refinement.
    ///
    /// # Errors
    /// - [`ChainError::InvalidNodeCount`] if `n_nodes == 0`.
    /// - [`ChainError::InvalidBounds`] from `bounds`.
    /// - [`ChainError::Calibration`] wrapping an invalid sampler option.
    pub fn new(
        n_nodes: usize, warmup: usize, sampler: SamplerOptions, bounds: ParameterBounds, seed: u64,
    ) -> ChainResult<Self> {
        let areas = (0..n_nodes).map(AreaWeights::default_for).collect();
        let config = Self { n_nodes, areas, warmup, sampler, bounds, seed, map_refinement: None };
        config.validate()?;
        Ok(config)
    }

    /// Override the per-node area weights.
    ///
    /// # Errors
    /// - [`ChainError::AreaCountMismatch`] or [`ChainError::InvalidArea`].
    pub fn with_areas(mut self, areas: Vec<AreaWeights>) -> ChainResult<Self> {
        self.areas = areas;
        self.validate()?;
        Ok(self)
    }

    pub fn with_map_refinement(mut self, opts: MLEOptions) -> Self {
        self.map_refinement = Some(opts);
        self
    }

    /// Re-check every invariant (useful after deserialization).
    pub fn validate(&self) -> ChainResult<()> {
        if self.n_nodes == 0 {
            return Err(ChainError::InvalidNodeCount { n_nodes: 0 });
        }
        if self.areas.len() != self.n_nodes {
            return Err(ChainError::AreaCountMismatch {
                expected: self.n_nodes,
                actual: self.areas.len(),
            });
        }
        for (node, w) in self.areas.iter().enumerate() {
            w.validate(node)?;
        }
        self.sampler.validate()?;
        self.bounds.validate()
    }
}
