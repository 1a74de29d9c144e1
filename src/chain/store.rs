//! Write-once store of posterior ensembles keyed by node and direction.
use crate::{
    calibration::ensemble::Ensemble,
    chain::errors::{ChainError, ChainResult},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of information flow along the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Downstream: node 0 → N-1.
    Forward,
    /// Upstream: node N-1 → 0.
    Backward,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// `EnsembleStore` — posterior ensembles produced by the forward and
/// backward passes.
///
/// Invariants
/// ----------
/// - Each `(node, direction)` is written at most once.
/// - [`EnsembleStore::take`] removes the entry, so each ensemble is consumed
///   at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnsembleStore {
    entries: BTreeMap<(usize, Direction), Ensemble>,
}

impl EnsembleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the ensemble of `node` in `direction`.
    ///
    /// # Errors
    /// - [`ChainError::DuplicateEnsemble`] if the key is already present.
    pub fn insert(
        &mut self, node: usize, direction: Direction, ensemble: Ensemble,
    ) -> ChainResult<()> {
        if self.entries.contains_key(&(node, direction)) {
            return Err(ChainError::DuplicateEnsemble { node, direction });
        }
        self.entries.insert((node, direction), ensemble);
        Ok(())
    }

    /// Remove and return the ensemble of `node` in `direction`.
    ///
    /// # Errors
    /// - [`ChainError::MissingEnsemble`] if nothing was recorded.
    pub fn take(&mut self, node: usize, direction: Direction) -> ChainResult<Ensemble> {
        self.entries.remove(&(node, direction)).ok_or(ChainError::MissingEnsemble { node, direction })
    }

    pub fn get(&self, node: usize, direction: Direction) -> Option<&Ensemble> {
        self.entries.get(&(node, direction))
    }

    pub fn contains(&self, node: usize, direction: Direction) -> bool {
        self.entries.contains_key(&(node, direction))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ensemble(v: f64) -> Ensemble {
        Ensemble::from_rows(&[array![v, v]]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Each (node, direction) is write-once and read-once.
    fn insert_is_write_once_and_take_is_read_once() {
        let mut store = EnsembleStore::new();
        store.insert(0, Direction::Forward, ensemble(1.0)).unwrap();
        store.insert(0, Direction::Backward, ensemble(2.0)).unwrap();
        assert_eq!(
            store.insert(0, Direction::Forward, ensemble(3.0)).unwrap_err(),
            ChainError::DuplicateEnsemble { node: 0, direction: Direction::Forward }
        );
        assert_eq!(store.take(0, Direction::Forward).unwrap(), ensemble(1.0));
        assert_eq!(
            store.take(0, Direction::Forward).unwrap_err(),
            ChainError::MissingEnsemble { node: 0, direction: Direction::Forward }
        );
        assert_eq!(store.len(), 1);
    }
}
