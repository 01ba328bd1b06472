use super::ScoringError;
use crate::core::chem::canonical::Canonicalizer;
use crate::core::io::tables::{TableLoadError, read_records};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// A second-pass model scoring whole routes.
///
/// `score_batch` receives parallel slices of products and `.`-joined starting materials
/// and returns one log-likelihood per pair; higher means more plausible.
pub trait RouteReranker {
    fn score_batch(
        &self,
        products: &[String],
        joined: &[String],
    ) -> Result<Vec<f64>, ScoringError>;
}

impl<F> RouteReranker for F
where
    F: Fn(&[String], &[String]) -> Result<Vec<f64>, ScoringError>,
{
    fn score_batch(
        &self,
        products: &[String],
        joined: &[String],
    ) -> Result<Vec<f64>, ScoringError> {
        self(products, joined)
    }
}

/// Gives every route the same log-likelihood, leaving the search order untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformReranker;

impl RouteReranker for UniformReranker {
    fn score_batch(
        &self,
        products: &[String],
        joined: &[String],
    ) -> Result<Vec<f64>, ScoringError> {
        check_batch(products, joined)?;
        Ok(vec![0.0; products.len()])
    }
}

#[derive(Debug, Deserialize)]
struct RerankRow {
    product: String,
    reactants: String,
    log_likelihood: f64,
}

/// Looks up route log-likelihoods in a precomputed table.
#[derive(Debug, Clone)]
pub struct TableReranker {
    scores: HashMap<(String, String), f64>,
    default_log_likelihood: f64,
}

impl TableReranker {
    pub fn new(default_log_likelihood: f64) -> Self {
        Self {
            scores: HashMap::new(),
            default_log_likelihood,
        }
    }

    pub fn insert(&mut self, product: impl Into<String>, joined: impl Into<String>, score: f64) {
        self.scores.insert((product.into(), joined.into()), score);
    }

    /// Loads a `product,reactants,log_likelihood` CSV table.
    ///
    /// Product and materials are canonicalized, and the materials re-joined in sorted
    /// order, so lookups match the queries built from ranked routes.
    pub fn load(
        path: &Path,
        default_log_likelihood: f64,
        canonicalizer: &dyn Canonicalizer,
    ) -> Result<Self, TableLoadError> {
        let rows: Vec<RerankRow> = read_records(path)?;
        let mut reranker = Self::new(default_log_likelihood);

        for (idx, row) in rows.into_iter().enumerate() {
            let invalid = |message: String| TableLoadError::InvalidRecord {
                path: path.display().to_string(),
                record: idx + 1,
                message,
            };
            let product = canonicalizer
                .canonicalize(&row.product)
                .ok_or_else(|| invalid(format!("unparsable product '{}'", row.product)))?;
            let mut materials = row
                .reactants
                .split('.')
                .map(|m| {
                    canonicalizer
                        .canonicalize(m)
                        .ok_or_else(|| invalid(format!("unparsable material '{}'", m)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            materials.sort();
            materials.dedup();
            reranker.insert(product, materials.join("."), row.log_likelihood);
        }

        info!(
            entries = reranker.scores.len(),
            "Loaded rerank table from {:?}",
            path
        );
        Ok(reranker)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl RouteReranker for TableReranker {
    fn score_batch(
        &self,
        products: &[String],
        joined: &[String],
    ) -> Result<Vec<f64>, ScoringError> {
        check_batch(products, joined)?;
        Ok(products
            .iter()
            .zip(joined)
            .map(|(product, materials)| {
                self.scores
                    .get(&(product.clone(), materials.clone()))
                    .copied()
                    .unwrap_or(self.default_log_likelihood)
            })
            .collect())
    }
}

fn check_batch(products: &[String], joined: &[String]) -> Result<(), ScoringError> {
    if products.len() == joined.len() {
        Ok(())
    } else {
        Err(ScoringError::Reranker(format!(
            "batch has {} products but {} material strings",
            products.len(),
            joined.len()
        )))
    }
}
