//! Per-step reports and the final outcome of a chain run.
use crate::chain::store::Direction;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Which model a calibration step fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    /// One simulator against raw observations.
    Single,
    /// Head + delay + tail against observations or a downstream ensemble.
    Dual,
    /// One simulator refitted against a dual model's ensemble.
    Reduction,
}

/// Summary of one calibration step at a node.
///
/// - `samples`: retained parameter draws, one row per draw.
/// - `observed`: finite targets inside the likelihood window.
/// - `empty_window`: `observed == 0`; the posterior equals the prior.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeReport {
    pub node: usize,
    pub direction: Direction,
    pub kind: StepKind,
    pub samples: Array2<f64>,
    pub acceptance_rate: f64,
    pub observed: usize,
    pub empty_window: bool,
}

impl NodeReport {
    pub fn posterior_mean(&self) -> Array1<f64> {
        self.samples.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(self.samples.ncols()))
    }

    /// Population standard deviation of each parameter.
    pub fn posterior_std(&self) -> Array1<f64> {
        self.samples.std_axis(Axis(0), 0.0)
    }
}

/// Pooled forward + backward estimate at one node.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedNode {
    pub node: usize,
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
    pub n_members: usize,
}

/// Everything [`ChainCalibrator::run`](crate::chain::ChainCalibrator::run)
/// produces: step reports of both passes and the smoothed series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub forward: Vec<NodeReport>,
    pub backward: Vec<NodeReport>,
    pub smoothed: Vec<SmoothedNode>,
}

impl ChainOutcome {
    /// First report of `kind` at `node` in `direction`, if any.
    pub fn report(&self, node: usize, direction: Direction, kind: StepKind) -> Option<&NodeReport> {
        let reports = match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        };
        reports.iter().find(|r| r.node == node && r.kind == kind)
    }

    /// Whether any step observed nothing inside its window.
    pub fn any_empty_window(&self) -> bool {
        self.forward.iter().chain(&self.backward).any(|r| r.empty_window)
    }
}
