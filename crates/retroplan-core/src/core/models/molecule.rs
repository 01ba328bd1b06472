use crate::core::chem::canonical::{Canonicalizer, ChemError};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Number of leading structural-hash characters kept in an identity key.
pub const IDENTITY_KEY_LEN: usize = 14;

/// A short fixed-length key used to test chemical equivalence.
///
/// Two molecular representations describe the same compound exactly when their
/// identity keys are equal, regardless of how their SMILES strings are written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Truncates a structural hash to an identity key.
    ///
    /// Returns `None` when the hash is shorter than [`IDENTITY_KEY_LEN`] characters.
    pub fn from_hash(hash: &str) -> Option<Self> {
        let prefix: String = hash.trim().chars().take(IDENTITY_KEY_LEN).collect();
        if prefix.chars().count() == IDENTITY_KEY_LEN {
            Some(Self(prefix))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonicalized molecule.
///
/// Molecules are created on demand from SMILES strings through a [`Canonicalizer`]
/// and never mutated afterwards. Equality, hashing and ordering all go through the
/// identity key, so two differently written SMILES of the same compound compare equal.
#[derive(Debug, Clone)]
pub struct Molecule {
    smiles: Arc<str>,
    key: IdentityKey,
}

impl Molecule {
    /// Canonicalizes `smiles` and computes its identity key.
    ///
    /// # Errors
    ///
    /// Returns [`ChemError::Unparsable`] if the string is not a valid molecule, or the
    /// canonicalizer's error if no identity key can be derived.
    pub fn parse(smiles: &str, canonicalizer: &dyn Canonicalizer) -> Result<Self, ChemError> {
        let canonical = canonicalizer
            .canonicalize(smiles)
            .ok_or_else(|| ChemError::Unparsable(smiles.to_string()))?;
        let key = canonicalizer.identity_key(&canonical)?;
        Ok(Self::from_parts(canonical, key))
    }

    /// Builds a molecule from an already canonical string and its key.
    pub fn from_parts(smiles: impl Into<Arc<str>>, key: IdentityKey) -> Self {
        Self {
            smiles: smiles.into(),
            key,
        }
    }

    #[inline]
    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    #[inline]
    pub fn key(&self) -> &IdentityKey {
        &self.key
    }
}

impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Molecule {}

impl Hash for Molecule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Molecule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Molecule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.smiles)
    }
}

/// Sorts molecules by canonical SMILES, the order used for joined reactant strings.
pub fn sort_by_smiles(molecules: &mut [Molecule]) {
    molecules.sort_by(|a, b| a.smiles().cmp(b.smiles()));
}
