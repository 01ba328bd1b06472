use thiserror::Error;

use super::config::ConfigError;
use crate::core::chem::canonical::ChemError;
use crate::core::scoring::ScoringError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Data integrity fault: {source}")]
    Chemistry {
        #[from]
        source: ChemError,
    },

    #[error("Collaborator failed: {source}")]
    Collaborator {
        #[from]
        source: ScoringError,
    },

    #[error("Task '{task_id}' failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
