use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSearchConfig {
    pub beam_width: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_rounds: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDecodingConfig {
    pub max_length: Option<usize>,
    pub temperature: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRerankConfig {
    pub alpha: Option<f64>,
    pub default_log_likelihood: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileValueConfig {
    pub fingerprint_dim: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileResourcesConfig {
    pub stock: Option<PathBuf>,
    pub reactions: Option<PathBuf>,
    pub value_model: Option<PathBuf>,
    pub rerank_table: Option<PathBuf>,
}

impl FileResourcesConfig {
    /// Makes relative paths relative to the directory holding the config file.
    fn rebase(&mut self, base: &Path) {
        for path in [
            &mut self.stock,
            &mut self.reactions,
            &mut self.value_model,
            &mut self.rerank_table,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub seed: Option<u64>,
    pub search: Option<FileSearchConfig>,
    pub decoding: Option<FileDecodingConfig>,
    pub rerank: Option<FileRerankConfig>,
    pub value: Option<FileValueConfig>,
    pub resources: Option<FileResourcesConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        if let (Some(resources), Some(base)) = (config.resources.as_mut(), path.parent()) {
            resources.rebase(base);
        }
        Ok(config)
    }
}
