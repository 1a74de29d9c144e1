//! Errors for chain configuration, inputs and orchestration.
//!
//! Configuration-level inconsistencies (bad bounds, mismatched series,
//! duplicated ensembles) are surfaced with the offending node index. Errors
//! raised while calibrating a node are wrapped in [`ChainError::Node`] so the
//! caller sees which node and direction failed.
use crate::{
    calibration::errors::CalibrationError, chain::store::Direction,
    density::errors::DensityError, models::errors::ModelError,
};

/// Result alias for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ChainError {
    // ---- Configuration ----
    /// A chain needs at least one node.
    InvalidNodeCount { n_nodes: usize },

    /// One (head, tail) area pair per node is required.
    AreaCountMismatch { expected: usize, actual: usize },

    /// Area weights must be finite, non-negative, with a positive sum.
    InvalidArea { node: usize, head: f64, tail: f64, reason: &'static str },

    /// Prior bounds do not match the simulator's parameter count.
    BoundsLengthMismatch { class: &'static str, expected: usize, actual: usize },

    /// A prior bound pair is invalid.
    InvalidBounds { class: &'static str, index: usize, low: f64, high: f64 },

    // ---- Inputs ----
    /// Per-node data count differs from the configured node count.
    NodeCountMismatch { expected: usize, actual: usize },

    /// A node's series does not match the forcing length.
    SeriesLengthMismatch { node: usize, expected: usize, actual: usize },

    /// Warm-up must be shorter than the forcing.
    WarmupOutOfRange { warmup: usize, len: usize },

    // ---- Ensemble store ----
    /// An ensemble was already recorded for this (node, direction).
    DuplicateEnsemble { node: usize, direction: Direction },

    /// No ensemble is recorded for this (node, direction).
    MissingEnsemble { node: usize, direction: Direction },

    // ---- Node failures ----
    /// Calibration at `node` in `direction` failed.
    Node { node: usize, direction: Direction, source: CalibrationError },

    /// Pooling forward and backward ensembles failed at `node`.
    Smoothing { node: usize, source: CalibrationError },

    // ---- Wrapped ----
    Model(ModelError),
    Density(DensityError),
    Calibration(CalibrationError),
}

impl ChainError {
    /// Attach a node and direction to a calibration failure.
    pub fn at(node: usize, direction: Direction) -> impl Fn(CalibrationError) -> ChainError {
        move |source| ChainError::Node { node, direction, source }
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChainError::Node { source, .. } => Some(source),
            ChainError::Smoothing { source, .. } => Some(source),
            ChainError::Model(e) => Some(e),
            ChainError::Density(e) => Some(e),
            ChainError::Calibration(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            ChainError::InvalidNodeCount { n_nodes } => {
                write!(f, "Invalid node count {n_nodes}: a chain needs at least one node")
            }
            ChainError::AreaCountMismatch { expected, actual } => {
                write!(f, "Expected {expected} area weight pairs, got {actual}")
            }
            ChainError::InvalidArea { node, head, tail, reason } => {
                write!(f, "Invalid area weights ({head}, {tail}) at node {node}: {reason}")
            }
            ChainError::BoundsLengthMismatch { class, expected, actual } => {
                write!(f, "Expected {expected} {class} prior bounds, got {actual}")
            }
            ChainError::InvalidBounds { class, index, low, high } => {
                write!(f, "Invalid {class} prior bounds [{low}, {high}] at index {index}")
            }

            // ---- Inputs ----
            ChainError::NodeCountMismatch { expected, actual } => {
                write!(f, "Expected data for {expected} nodes, got {actual}")
            }
            ChainError::SeriesLengthMismatch { node, expected, actual } => {
                write!(f, "Node {node}: series has {actual} steps, forcing has {expected}")
            }
            ChainError::WarmupOutOfRange { warmup, len } => {
                write!(f, "Warm-up {warmup} must be shorter than the forcing ({len} steps)")
            }

            // ---- Ensemble store ----
            ChainError::DuplicateEnsemble { node, direction } => {
                write!(f, "Ensemble for node {node} ({direction}) already recorded")
            }
            ChainError::MissingEnsemble { node, direction } => {
                write!(f, "No ensemble recorded for node {node} ({direction})")
            }

            // ---- Node failures ----
            ChainError::Node { node, direction, source } => {
                write!(f, "Calibration failed at node {node} ({direction}): {source}")
            }
            ChainError::Smoothing { node, source } => {
                write!(f, "Smoothing failed at node {node}: {source}")
            }

            // ---- Wrapped ----
            ChainError::Model(e) => write!(f, "Model error: {e}"),
            ChainError::Density(e) => write!(f, "Density error: {e}"),
            ChainError::Calibration(e) => write!(f, "Calibration error: {e}"),
        }
    }
}

impl From<ModelError> for ChainError {
    fn from(err: ModelError) -> Self {
        ChainError::Model(err)
    }
}

impl From<DensityError> for ChainError {
    fn from(err: DensityError) -> Self {
        ChainError::Density(err)
    }
}

impl From<CalibrationError> for ChainError {
    fn from(err: CalibrationError) -> Self {
        ChainError::Calibration(err)
    }
}
