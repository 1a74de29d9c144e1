//! chain — forward / backward / smoothing calibration along nested sub-basins.
//!
//! Purpose
//! -------
//! Thread posterior knowledge along a linear chain of sub-basins. Node `i`
//! is modelled as a dual model whose head is the accumulated upstream model
//! and whose tail is the local model; information flows downstream in the
//! forward pass, upstream in the backward pass, and the two ensembles of
//! every node are pooled by smoothing.
//!
//! Key behaviors
//! -------------
//! - [`ChainConfig`] / [`ParameterBounds`] / [`AreaWeights`]: validated,
//!   serde-friendly configuration.
//! - [`ChainInputs`]: shared forcing plus per-node observations.
//! - [`EnsembleStore`]: write-once, read-once ensembles keyed by
//!   `(node, Direction)`.
//! - [`ChainCalibrator`]: `forward`, `backward`, `smooth` and `run`.
//! - [`NodeReport`] / [`SmoothedNode`] / [`ChainOutcome`]: per-step
//!   diagnostics and smoothed series.
//!
//! Invariants & assumptions
//! ------------------------
//! - Dual posteriors are reduced to a single model before being handed on,
//!   so the sampled dimension never grows with the chain length.
//! - Head priors after the first step are kernel density estimates of the
//!   previous (reduced) posterior draws.
//! - Forward and backward passes use independent, seed-derived RNG streams.
//!
//! Testing notes
//! -------------
//! - Unit tests run short chains of constant-level simulators and check the
//!   order of steps, the store bookkeeping, and that errors name the node.
//! - End-to-end scenarios live in `tests/integration_chain_pipeline.rs`.

pub mod calibrator;
pub mod config;
pub mod data;
pub mod errors;
pub mod report;
pub mod store;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::calibrator::ChainCalibrator;
pub use self::config::{AreaWeights, ChainConfig, ParameterBounds};
pub use self::data::{ChainInputs, NodeData};
pub use self::errors::{ChainError, ChainResult};
pub use self::report::{ChainOutcome, NodeReport, SmoothedNode, StepKind};
pub use self::store::{Direction, EnsembleStore};

pub mod prelude {
    pub use super::calibrator::ChainCalibrator;
    pub use super::config::{AreaWeights, ChainConfig, ParameterBounds};
    pub use super::data::{ChainInputs, NodeData};
    pub use super::errors::{ChainError, ChainResult};
    pub use super::report::{ChainOutcome, NodeReport, StepKind};
    pub use super::store::{Direction, EnsembleStore};
}
