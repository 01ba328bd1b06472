use super::molecule::{IdentityKey, Molecule};
use crate::core::chem::canonical::{Canonicalizer, ChemError};
use std::collections::BTreeSet;

/// A single planning problem together with its known-good starting-material sets.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub target: Molecule,
    /// Identity-key sets of the starting materials of every reference route.
    pub ground_truth_sets: Vec<BTreeSet<IdentityKey>>,
    /// Maximum number of backward steps explored below the target.
    pub max_depth: usize,
}

impl Task {
    pub fn new(id: impl Into<String>, target: Molecule, max_depth: usize) -> Self {
        Self {
            id: id.into(),
            target,
            ground_truth_sets: Vec::new(),
            max_depth,
        }
    }

    /// Builds a task from raw SMILES, deriving the ground-truth key sets once.
    ///
    /// # Errors
    ///
    /// Returns a [`ChemError`] if the target or any reference material cannot be
    /// canonicalized.
    pub fn from_smiles(
        id: impl Into<String>,
        target: &str,
        material_lists: &[Vec<String>],
        max_depth: usize,
        canonicalizer: &dyn Canonicalizer,
    ) -> Result<Self, ChemError> {
        let target = Molecule::parse(target, canonicalizer)?;
        let ground_truth_sets = material_lists
            .iter()
            .map(|materials| {
                materials
                    .iter()
                    .map(|smiles| Molecule::parse(smiles, canonicalizer).map(|m| m.key().clone()))
                    .collect::<Result<BTreeSet<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: id.into(),
            target,
            ground_truth_sets,
            max_depth,
        })
    }

    pub fn with_ground_truth(mut self, sets: Vec<BTreeSet<IdentityKey>>) -> Self {
        self.ground_truth_sets = sets;
        self
    }
}
