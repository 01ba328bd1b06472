//! Contracts of the scoring collaborators and their file-backed implementations.
//!
//! All three collaborators are pure functions of their inputs. Any failure they report is
//! treated as fatal for the run by the engine.

pub mod predictor;
pub mod reranker;
pub mod value;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Step predictor failed: {0}")]
    Predictor(String),
    #[error("Value estimator failed for '{smiles}': {message}")]
    ValueEstimator { smiles: String, message: String },
    #[error("Route reranker failed: {0}")]
    Reranker(String),
    #[error("Step predictor returned no finite logit for product '{product}' after '{partial}'")]
    DegenerateDistribution { product: String, partial: String },
    #[error("{collaborator} returned {actual} values, expected {expected}")]
    LengthMismatch {
        collaborator: &'static str,
        expected: usize,
        actual: usize,
    },
}
