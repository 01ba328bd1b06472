use super::config::PlanningConfig;
use super::progress::ProgressReporter;
use crate::core::chem::canonical::Canonicalizer;
use crate::core::chem::stock::Stock;
use crate::core::chem::vocab::Vocabulary;
use crate::core::scoring::predictor::StepPredictor;
use crate::core::scoring::reranker::RouteReranker;
use crate::core::scoring::value::ValueEstimator;

/// Everything a planning run reads: configuration and external collaborators.
///
/// Built once per run and never mutated; the search and reranking stages only borrow it.
#[derive(Clone, Copy)]
pub struct PlanningContext<'a> {
    pub config: &'a PlanningConfig,
    pub canonicalizer: &'a dyn Canonicalizer,
    pub vocabulary: &'a Vocabulary,
    pub predictor: &'a dyn StepPredictor,
    pub value_estimator: &'a dyn ValueEstimator,
    pub reranker: &'a dyn RouteReranker,
    pub stock: &'a dyn Stock,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> PlanningContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &'a PlanningConfig,
        canonicalizer: &'a dyn Canonicalizer,
        vocabulary: &'a Vocabulary,
        predictor: &'a dyn StepPredictor,
        value_estimator: &'a dyn ValueEstimator,
        reranker: &'a dyn RouteReranker,
        stock: &'a dyn Stock,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            canonicalizer,
            vocabulary,
            predictor,
            value_estimator,
            reranker,
            stock,
            reporter,
        }
    }

    #[inline]
    pub fn beam_width(&self) -> usize {
        self.config.search.beam_width
    }
}
