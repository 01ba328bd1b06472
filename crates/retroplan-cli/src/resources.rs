use crate::config::{AppConfig, ResourcePaths};
use crate::error::{CliError, Result};
use retroplan::core::chem::canonical::SmilesCanonicalizer;
use retroplan::core::chem::stock::KeyStock;
use retroplan::core::chem::vocab::Vocabulary;
use retroplan::core::scoring::predictor::ReactionTablePredictor;
use retroplan::core::scoring::reranker::{RouteReranker, TableReranker, UniformReranker};
use retroplan::core::scoring::value::{ConstantValueEstimator, MlpValueEstimator, ValueEstimator};
use retroplan::engine::context::PlanningContext;
use retroplan::engine::progress::ProgressReporter;
use std::path::Path;
use tracing::info;

/// The collaborators a planning run reads from disk.
pub struct Resources {
    pub canonicalizer: SmilesCanonicalizer,
    pub vocabulary: Vocabulary,
    pub stock: KeyStock,
    pub predictor: ReactionTablePredictor,
    pub value_estimator: Box<dyn ValueEstimator>,
    pub reranker: Box<dyn RouteReranker>,
}

fn parse_error(path: &Path, source: impl Into<anyhow::Error>) -> CliError {
    CliError::FileParsing {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

impl Resources {
    pub fn load(config: &AppConfig) -> Result<Self> {
        let paths: &ResourcePaths = &config.resources;
        let canonicalizer = SmilesCanonicalizer::new();
        let vocabulary = Vocabulary::default();

        info!("Loading stock from {:?}", paths.stock);
        let stock = KeyStock::load(&paths.stock, &canonicalizer)
            .map_err(|e| parse_error(&paths.stock, e))?;

        info!("Loading reaction table from {:?}", paths.reactions);
        let predictor =
            ReactionTablePredictor::load(&paths.reactions, vocabulary.clone(), &canonicalizer)
                .map_err(|e| parse_error(&paths.reactions, e))?;

        let value_estimator: Box<dyn ValueEstimator> = match &paths.value_model {
            Some(path) => {
                info!("Loading value model from {:?}", path);
                let model = MlpValueEstimator::load(path).map_err(|e| parse_error(path, e))?;
                let expected = config.core_config.value.fingerprint_dim;
                if model.fingerprint_dim() != expected {
                    return Err(CliError::Config(format!(
                        "Value model '{}' expects {}-dimensional fingerprints but value.fingerprint-dim is {}.",
                        path.display(),
                        model.fingerprint_dim(),
                        expected
                    )));
                }
                Box::new(model)
            }
            None => Box::new(ConstantValueEstimator(0.0)),
        };

        let reranker: Box<dyn RouteReranker> = match &paths.rerank_table {
            Some(path) => {
                info!("Loading rerank table from {:?}", path);
                Box::new(
                    TableReranker::load(
                        path,
                        paths.rerank_default_log_likelihood,
                        &canonicalizer,
                    )
                    .map_err(|e| parse_error(path, e))?,
                )
            }
            None => Box::new(UniformReranker),
        };

        info!(
            stock = stock.len(),
            products = predictor.num_products(),
            "Planning resources loaded."
        );
        Ok(Self {
            canonicalizer,
            vocabulary,
            stock,
            predictor,
            value_estimator,
            reranker,
        })
    }

    pub fn context<'a>(
        &'a self,
        config: &'a AppConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> PlanningContext<'a> {
        PlanningContext::new(
            &config.core_config,
            &self.canonicalizer,
            &self.vocabulary,
            &self.predictor,
            self.value_estimator.as_ref(),
            self.reranker.as_ref(),
            &self.stock,
            reporter,
        )
    }
}
