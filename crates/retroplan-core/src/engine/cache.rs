use crate::core::models::molecule::{IdentityKey, Molecule};
use crate::core::scoring::ScoringError;
use crate::core::scoring::value::ValueEstimator;
use std::collections::HashMap;

/// Per-task memo of value estimates, keyed by identity key.
#[derive(Debug, Default, Clone)]
pub struct ValueCache {
    data: HashMap<IdentityKey, f64>,
    hits: usize,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, molecule: &Molecule) -> Option<f64> {
        self.data.get(molecule.key()).copied()
    }

    /// Returns the estimate for `molecule`, querying `estimator` only on the first request.
    ///
    /// Negative or non-finite estimates break the cost bookkeeping of the search and are
    /// reported as estimator failures.
    pub fn value_of(
        &mut self,
        molecule: &Molecule,
        estimator: &dyn ValueEstimator,
    ) -> Result<f64, ScoringError> {
        if let Some(value) = self.get(molecule) {
            self.hits += 1;
            return Ok(value);
        }
        let value = estimator.estimate(molecule.smiles())?;
        if !(value.is_finite() && value >= 0.0) {
            return Err(ScoringError::ValueEstimator {
                smiles: molecule.smiles().to_string(),
                message: format!("estimate must be finite and nonnegative, got {}", value),
            });
        }
        self.data.insert(molecule.key().clone(), value);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::canonical::SmilesCanonicalizer;
    use std::cell::Cell;

    fn mol(smiles: &str) -> Molecule {
        Molecule::parse(smiles, &SmilesCanonicalizer::new()).unwrap()
    }

    #[test]
    fn value_of_queries_estimator_once_per_molecule() {
        let calls = Cell::new(0);
        let estimator = |s: &str| {
            calls.set(calls.get() + 1);
            Ok::<_, ScoringError>(s.len() as f64)
        };
        let mut cache = ValueCache::new();

        assert_eq!(cache.value_of(&mol("CCO"), &estimator).unwrap(), 3.0);
        assert_eq!(cache.value_of(&mol("CCO"), &estimator).unwrap(), 3.0);
        assert_eq!(cache.value_of(&mol("N"), &estimator).unwrap(), 1.0);

        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn value_of_rejects_negative_estimates() {
        let estimator = |_: &str| Ok::<_, ScoringError>(-1.0);
        let mut cache = ValueCache::new();
        let result = cache.value_of(&mol("C"), &estimator);
        assert!(matches!(result, Err(ScoringError::ValueEstimator { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn value_of_propagates_estimator_failures() {
        let estimator = |_: &str| {
            Err::<f64, _>(ScoringError::ValueEstimator {
                smiles: "C".to_string(),
                message: "model unavailable".to_string(),
            })
        };
        let mut cache = ValueCache::new();
        assert!(cache.value_of(&mol("C"), &estimator).is_err());
    }
}
