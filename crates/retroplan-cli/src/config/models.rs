use retroplan::engine::config::PlanningConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePaths {
    pub stock: PathBuf,
    pub reactions: PathBuf,
    /// Without a model every molecule is valued at zero.
    pub value_model: Option<PathBuf>,
    /// Without a table every route gets the same rerank score.
    pub rerank_table: Option<PathBuf>,
    pub rerank_default_log_likelihood: f64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub core_config: PlanningConfig,
    pub resources: ResourcePaths,
}
