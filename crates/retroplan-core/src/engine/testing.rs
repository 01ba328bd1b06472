use super::config::{PlanningConfig, PlanningConfigBuilder};
use super::context::PlanningContext;
use super::progress::ProgressReporter;
use crate::core::chem::canonical::{Canonicalizer, SmilesCanonicalizer};
use crate::core::chem::stock::KeyStock;
use crate::core::chem::vocab::Vocabulary;
use crate::core::models::molecule::{IdentityKey, Molecule};
use crate::core::scoring::ScoringError;
use crate::core::scoring::predictor::{ReactionTablePredictor, StepPredictor};
use crate::core::scoring::reranker::{RouteReranker, UniformReranker};
use crate::core::scoring::value::{ConstantValueEstimator, ValueEstimator};
use std::collections::HashMap;

/// Owns a full set of in-memory collaborators for engine and workflow tests.
pub(crate) struct Fixture {
    pub config: PlanningConfig,
    pub canonicalizer: SmilesCanonicalizer,
    pub vocabulary: Vocabulary,
    pub predictor: Box<dyn StepPredictor>,
    pub value_estimator: Box<dyn ValueEstimator>,
    pub reranker: Box<dyn RouteReranker>,
    pub stock: KeyStock,
    pub reporter: ProgressReporter<'static>,
}

impl Fixture {
    pub fn new(beam_width: usize) -> Self {
        let vocabulary = Vocabulary::default();
        Self {
            config: PlanningConfigBuilder::new()
                .beam_width(beam_width)
                .max_generation_length(50)
                .temperature(1.0)
                .rerank_alpha(0.01)
                .build()
                .unwrap(),
            canonicalizer: SmilesCanonicalizer::new(),
            predictor: Box::new(ReactionTablePredictor::new(vocabulary.clone())),
            vocabulary,
            value_estimator: Box::new(ConstantValueEstimator(0.0)),
            reranker: Box::new(UniformReranker),
            stock: KeyStock::from_keys([]),
            reporter: ProgressReporter::new(),
        }
    }

    pub fn with_stock(mut self, smiles: &[&str]) -> Self {
        self.stock = KeyStock::from_keys(smiles.iter().map(|s| self.mol(s).key().clone()));
        self
    }

    pub fn with_predictor(mut self, predictor: impl StepPredictor + 'static) -> Self {
        self.predictor = Box::new(predictor);
        self
    }

    pub fn with_value_estimator(mut self, estimator: impl ValueEstimator + 'static) -> Self {
        self.value_estimator = Box::new(estimator);
        self
    }

    pub fn with_reranker(mut self, reranker: impl RouteReranker + 'static) -> Self {
        self.reranker = Box::new(reranker);
        self
    }

    pub fn mol(&self, smiles: &str) -> Molecule {
        Molecule::parse(smiles, &self.canonicalizer).unwrap()
    }

    pub fn context(&self) -> PlanningContext<'_> {
        PlanningContext::new(
            &self.config,
            &self.canonicalizer,
            &self.vocabulary,
            self.predictor.as_ref(),
            self.value_estimator.as_ref(),
            self.reranker.as_ref(),
            &self.stock,
            &self.reporter,
        )
    }
}

/// A step predictor answering from a `partial -> [(symbol, probability)]` script.
///
/// Partial strings without an entry only allow the end symbol.
pub(crate) struct ScriptedPredictor {
    vocabulary: Vocabulary,
    script: HashMap<String, Vec<(char, f64)>>,
}

impl ScriptedPredictor {
    pub fn new(vocabulary: &Vocabulary, script: &[(&str, Vec<(char, f64)>)]) -> Self {
        Self {
            vocabulary: vocabulary.clone(),
            script: script
                .iter()
                .map(|(partial, dist)| (partial.to_string(), dist.clone()))
                .collect(),
        }
    }
}

impl StepPredictor for ScriptedPredictor {
    fn logits(&self, _product: &str, partial: &str) -> Result<Vec<f64>, ScoringError> {
        let mut logits = vec![f64::NEG_INFINITY; self.vocabulary.len()];
        match self.script.get(partial) {
            Some(dist) => {
                for (symbol, p) in dist {
                    logits[self.vocabulary.index_of(*symbol).unwrap()] = p.ln();
                }
            }
            None => logits[self.vocabulary.end_index()] = 0.0,
        }
        Ok(logits)
    }
}

pub(crate) fn key_of(fixture: &Fixture, smiles: &str) -> IdentityKey {
    fixture.canonicalizer.identity_key(smiles).unwrap()
}
