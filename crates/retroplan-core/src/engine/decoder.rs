use super::context::PlanningContext;
use super::error::EngineError;
use crate::core::models::molecule::{Molecule, sort_by_smiles};
use crate::core::models::route::ReactionCandidate;
use crate::core::scoring::ScoringError;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::trace;

/// Produces single-step decompositions of a product molecule.
///
/// The route search only depends on this seam; [`BeamDecoder`] is the production
/// implementation, and any `Fn(&Molecule, usize) -> Result<Vec<ReactionCandidate>, _>`
/// can stand in for it.
pub trait Expander {
    fn expand(
        &self,
        product: &Molecule,
        beam_width: usize,
    ) -> Result<Vec<ReactionCandidate>, EngineError>;
}

impl<F> Expander for F
where
    F: Fn(&Molecule, usize) -> Result<Vec<ReactionCandidate>, EngineError>,
{
    fn expand(
        &self,
        product: &Molecule,
        beam_width: usize,
    ) -> Result<Vec<ReactionCandidate>, EngineError> {
        self(product, beam_width)
    }
}

#[derive(Debug, Clone)]
struct LiveBeam {
    text: String,
    cost: f64,
}

/// One possible extension of a live beam by one vocabulary symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extension {
    beam_index: usize,
    symbol_index: usize,
    cost: f64,
}

impl Extension {
    fn rank(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.beam_index.cmp(&other.beam_index))
            .then(self.symbol_index.cmp(&other.symbol_index))
    }
}

#[derive(Debug, Clone)]
struct FinishedString {
    text: String,
    normalized_cost: f64,
}

/// Character-level beam search over reactant strings.
#[derive(Clone, Copy)]
pub struct BeamDecoder<'a> {
    context: PlanningContext<'a>,
}

impl<'a> BeamDecoder<'a> {
    pub fn new(context: PlanningContext<'a>) -> Self {
        Self { context }
    }

    /// Decodes up to `beam_width` ranked reactant sets for `product`.
    ///
    /// Candidates come back in ascending length-normalized cost. Finished strings with a
    /// fragment the canonicalizer rejects are dropped silently.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::Collaborator`] if the step predictor fails or returns a
    /// malformed distribution, and with [`EngineError::Chemistry`] if a fragment that
    /// canonicalized cannot be given an identity key.
    pub fn decode(
        &self,
        product: &Molecule,
        beam_width: usize,
    ) -> Result<Vec<ReactionCandidate>, EngineError> {
        let finished = self.search_strings(product, beam_width)?;
        let mut candidates = Vec::with_capacity(beam_width);
        for string in finished {
            if candidates.len() == beam_width {
                break;
            }
            if let Some(reactants) = self.validate(&string.text)? {
                candidates.push(ReactionCandidate::new(reactants, string.normalized_cost));
            }
        }
        trace!(
            product = product.smiles(),
            count = candidates.len(),
            "Decoded reaction candidates"
        );
        Ok(candidates)
    }

    fn search_strings(
        &self,
        product: &Molecule,
        beam_width: usize,
    ) -> Result<Vec<FinishedString>, EngineError> {
        let vocabulary = self.context.vocabulary;
        let decoding = &self.context.config.decoding;
        let end_index = vocabulary.end_index();

        let mut live = vec![LiveBeam {
            text: String::new(),
            cost: 0.0,
        }];
        let mut finished: Vec<FinishedString> = Vec::new();
        let mut open_slots = beam_width;

        for _ in 0..decoding.max_generation_length {
            if live.is_empty() || open_slots == 0 {
                break;
            }

            let mut extensions = Vec::with_capacity(live.len() * vocabulary.len());
            for (beam_index, beam) in live.iter().enumerate() {
                let logits = self.context.predictor.logits(product.smiles(), &beam.text)?;
                if logits.len() != vocabulary.len() {
                    return Err(ScoringError::LengthMismatch {
                        collaborator: "Step predictor",
                        expected: vocabulary.len(),
                        actual: logits.len(),
                    }
                    .into());
                }
                let probabilities = softmax(&logits, decoding.temperature).ok_or_else(|| {
                    ScoringError::DegenerateDistribution {
                        product: product.smiles().to_string(),
                        partial: beam.text.clone(),
                    }
                })?;
                extensions.extend(
                    probabilities
                        .iter()
                        .enumerate()
                        .filter(|(_, p)| **p > 0.0)
                        .map(|(symbol_index, p)| Extension {
                            beam_index,
                            symbol_index,
                            cost: beam.cost - p.log10(),
                        }),
                );
            }
            extensions.sort_by(Extension::rank);

            let mut next = Vec::with_capacity(open_slots);
            for extension in extensions.into_iter().take(open_slots) {
                let parent = &live[extension.beam_index];
                if extension.symbol_index == end_index {
                    if !parent.text.is_empty() {
                        let length = parent.text.chars().count() + 1;
                        finished.push(FinishedString {
                            text: parent.text.clone(),
                            normalized_cost: extension.cost / length as f64,
                        });
                    }
                    open_slots -= 1;
                } else if let Some(symbol) = vocabulary.symbol(extension.symbol_index) {
                    let mut text = parent.text.clone();
                    text.push(symbol);
                    next.push(LiveBeam {
                        text,
                        cost: extension.cost,
                    });
                }
            }
            live = next;
        }

        finished.sort_by(|a, b| a.normalized_cost.total_cmp(&b.normalized_cost));
        Ok(finished)
    }

    /// Splits a finished string into unique canonical reactants, or `None` if any
    /// fragment does not parse.
    fn validate(&self, text: &str) -> Result<Option<Vec<Molecule>>, EngineError> {
        let canonicalizer = self.context.canonicalizer;
        let fragments: BTreeSet<&str> = text.split('.').collect();

        let mut canonical = BTreeSet::new();
        for fragment in fragments {
            match canonicalizer.canonicalize(fragment) {
                Some(smiles) => {
                    canonical.insert(smiles);
                }
                None => return Ok(None),
            }
        }
        if canonical.is_empty() {
            return Ok(None);
        }

        let mut reactants = canonical
            .into_iter()
            .map(|smiles| -> Result<Molecule, EngineError> {
                let key = canonicalizer.identity_key(&smiles)?;
                Ok(Molecule::from_parts(smiles, key))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut seen = HashSet::new();
        reactants.retain(|m| seen.insert(m.key().clone()));
        sort_by_smiles(&mut reactants);
        Ok(Some(reactants))
    }
}

impl Expander for BeamDecoder<'_> {
    fn expand(
        &self,
        product: &Molecule,
        beam_width: usize,
    ) -> Result<Vec<ReactionCandidate>, EngineError> {
        self.decode(product, beam_width)
    }
}

/// Temperature-scaled softmax, stabilized by the largest finite logit.
///
/// Returns `None` when no logit is finite or a logit is NaN.
pub(crate) fn softmax(logits: &[f64], temperature: f64) -> Option<Vec<f64>> {
    if logits.iter().any(|l| l.is_nan()) {
        return None;
    }
    let scaled: Vec<f64> = logits.iter().map(|l| l / temperature).collect();
    let max = scaled
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .max_by(f64::total_cmp)?;
    let exps: Vec<f64> = scaled.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    Some(exps.into_iter().map(|e| e / sum).collect())
}
