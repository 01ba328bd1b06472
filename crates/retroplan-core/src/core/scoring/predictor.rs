use super::ScoringError;
use crate::core::chem::canonical::Canonicalizer;
use crate::core::chem::vocab::{END_SYMBOL, START_SYMBOL, Vocabulary};
use crate::core::io::tables::{TableLoadError, read_records};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// A conditioned sequence model over the decoder vocabulary.
///
/// `logits` returns one unnormalized log-score per vocabulary symbol for the symbol that
/// follows `partial` in the reactant string of `product`. A logit of negative infinity
/// marks a symbol that can never follow.
pub trait StepPredictor {
    fn logits(&self, product: &str, partial: &str) -> Result<Vec<f64>, ScoringError>;
}

impl<F> StepPredictor for F
where
    F: Fn(&str, &str) -> Result<Vec<f64>, ScoringError>,
{
    fn logits(&self, product: &str, partial: &str) -> Result<Vec<f64>, ScoringError> {
        self(product, partial)
    }
}

#[derive(Debug, Deserialize)]
struct ReactionRow {
    product: String,
    reactants: String,
    probability: f64,
}

/// A step predictor backed by a table of known single-step reactions.
///
/// For a given product and partial string, the probability mass of every tabulated
/// decomposition that extends the partial string is put on its next symbol, or on the end
/// symbol when the partial string is already complete. Unknown products only allow the
/// end symbol.
#[derive(Debug, Clone)]
pub struct ReactionTablePredictor {
    vocabulary: Vocabulary,
    reactions: HashMap<String, Vec<(String, f64)>>,
}

impl ReactionTablePredictor {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            reactions: HashMap::new(),
        }
    }

    /// Registers a decomposition. Both sides are expected in canonical form.
    pub fn insert(
        &mut self,
        product: impl Into<String>,
        reactants: impl Into<String>,
        probability: f64,
    ) {
        self.reactions
            .entry(product.into())
            .or_default()
            .push((reactants.into(), probability));
    }

    /// Loads a `product,reactants,probability` CSV table.
    ///
    /// Products and every reactant fragment are canonicalized on load; the fragments of
    /// each row are deduplicated, sorted and re-joined with `.` so that the table speaks
    /// the same language the decoder validates against.
    pub fn load(
        path: &Path,
        vocabulary: Vocabulary,
        canonicalizer: &dyn Canonicalizer,
    ) -> Result<Self, TableLoadError> {
        let rows: Vec<ReactionRow> = read_records(path)?;
        let invalid = |record: usize, message: String| TableLoadError::InvalidRecord {
            path: path.display().to_string(),
            record,
            message,
        };

        let mut predictor = Self::new(vocabulary);
        for (idx, row) in rows.into_iter().enumerate() {
            let record = idx + 1;
            if !(row.probability > 0.0 && row.probability.is_finite()) {
                return Err(invalid(
                    record,
                    format!("probability must be positive, got {}", row.probability),
                ));
            }
            let product = canonicalizer
                .canonicalize(&row.product)
                .ok_or_else(|| invalid(record, format!("unparsable product '{}'", row.product)))?;

            let mut fragments = row
                .reactants
                .split('.')
                .map(|fragment| {
                    canonicalizer.canonicalize(fragment).ok_or_else(|| {
                        invalid(record, format!("unparsable reactant '{}'", fragment))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            fragments.sort();
            fragments.dedup();
            let reactants = fragments.join(".");

            if let Some(symbol) = reactants.chars().find(|c| {
                *c == START_SYMBOL || *c == END_SYMBOL || predictor.vocabulary.index_of(*c).is_none()
            }) {
                return Err(invalid(
                    record,
                    format!("symbol '{}' cannot be generated", symbol),
                ));
            }
            predictor.insert(product, reactants, row.probability);
        }

        info!(
            products = predictor.reactions.len(),
            "Loaded reaction table from {:?}",
            path
        );
        Ok(predictor)
    }

    pub fn num_products(&self) -> usize {
        self.reactions.len()
    }
}

impl StepPredictor for ReactionTablePredictor {
    fn logits(&self, product: &str, partial: &str) -> Result<Vec<f64>, ScoringError> {
        let mut mass = vec![0.0; self.vocabulary.len()];

        for (reactants, probability) in self.reactions.get(product).into_iter().flatten() {
            let Some(rest) = reactants.strip_prefix(partial) else {
                continue;
            };
            let index = match rest.chars().next() {
                Some(next) => self.vocabulary.index_of(next),
                None => Some(self.vocabulary.end_index()),
            };
            if let Some(index) = index {
                mass[index] += probability;
            }
        }

        if mass.iter().all(|m| *m == 0.0) {
            mass[self.vocabulary.end_index()] = 1.0;
        }

        Ok(mass
            .into_iter()
            .map(|m| if m > 0.0 { m.ln() } else { f64::NEG_INFINITY })
            .collect())
    }
}
