use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, ResourcePaths};
use crate::cli::PlannerArgs;
use crate::error::{CliError, Result};
use retroplan::engine::config::{DepthLimit, PlanningConfigBuilder};
use std::path::PathBuf;
use std::str::FromStr;

pub fn build_config(args: &PlannerArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let file_config = apply_set_values(file_config, &args.set_values)?;

    let search = file_config.search.unwrap_or_default();
    let decoding = file_config.decoding.unwrap_or_default();
    let rerank = file_config.rerank.unwrap_or_default();
    let value = file_config.value.unwrap_or_default();
    let resources = file_config.resources.unwrap_or_default();

    let beam_width = args
        .beam_width
        .or(search.beam_width)
        .unwrap_or(defaults.beam_width);
    let depth_limit = search
        .max_depth
        .map(DepthLimit::Fixed)
        .unwrap_or(DepthLimit::FromTask);
    let temperature = args
        .temperature
        .or(decoding.temperature)
        .unwrap_or(defaults.temperature);

    let core_config = PlanningConfigBuilder::new()
        .beam_width(beam_width)
        .depth_limit(depth_limit)
        .max_rounds(search.max_rounds)
        .max_generation_length(
            decoding
                .max_length
                .unwrap_or(defaults.max_generation_length),
        )
        .temperature(temperature)
        .rerank_alpha(rerank.alpha.unwrap_or(defaults.rerank_alpha))
        .fingerprint_dim(value.fingerprint_dim.unwrap_or(defaults.fingerprint_dim))
        .seed(file_config.seed.unwrap_or(defaults.seed))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let required = |cli: &Option<PathBuf>, file: Option<PathBuf>, key: &str| {
        cli.clone().or(file).ok_or_else(|| {
            CliError::Config(format!(
                "A value for 'resources.{}' is required either in the config file or via CLI argument.",
                key
            ))
        })
    };
    let resources = ResourcePaths {
        stock: required(&args.stock, resources.stock, "stock")?,
        reactions: required(&args.reactions, resources.reactions, "reactions")?,
        value_model: args.value_model.clone().or(resources.value_model),
        rerank_table: args.rerank_table.clone().or(resources.rerank_table),
        rerank_default_log_likelihood: rerank
            .default_log_likelihood
            .unwrap_or(defaults.rerank_default_log_likelihood),
    };

    Ok(AppConfig {
        core_config,
        resources,
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "seed" => config.seed = Some(parse_value(key, value, "integer")?),
            "search.beam-width" => {
                config
                    .search
                    .get_or_insert_with(Default::default)
                    .beam_width = Some(parse_value(key, value, "integer")?);
            }
            "search.max-depth" => {
                config
                    .search
                    .get_or_insert_with(Default::default)
                    .max_depth = Some(parse_value(key, value, "integer")?);
            }
            "search.max-rounds" => {
                config
                    .search
                    .get_or_insert_with(Default::default)
                    .max_rounds = Some(parse_value(key, value, "integer")?);
            }
            "decoding.max-length" => {
                config
                    .decoding
                    .get_or_insert_with(Default::default)
                    .max_length = Some(parse_value(key, value, "integer")?);
            }
            "decoding.temperature" => {
                config
                    .decoding
                    .get_or_insert_with(Default::default)
                    .temperature = Some(parse_value(key, value, "float")?);
            }
            "rerank.alpha" => {
                config.rerank.get_or_insert_with(Default::default).alpha =
                    Some(parse_value(key, value, "float")?);
            }
            "rerank.default-log-likelihood" => {
                config
                    .rerank
                    .get_or_insert_with(Default::default)
                    .default_log_likelihood = Some(parse_value(key, value, "float")?);
            }
            "value.fingerprint-dim" => {
                config
                    .value
                    .get_or_insert_with(Default::default)
                    .fingerprint_dim = Some(parse_value(key, value, "integer")?);
            }
            "resources.stock" => {
                config.resources.get_or_insert_with(Default::default).stock =
                    Some(PathBuf::from(value));
            }
            "resources.reactions" => {
                config
                    .resources
                    .get_or_insert_with(Default::default)
                    .reactions = Some(PathBuf::from(value));
            }
            "resources.value-model" => {
                config
                    .resources
                    .get_or_insert_with(Default::default)
                    .value_model = Some(PathBuf::from(value));
            }
            "resources.rerank-table" => {
                config
                    .resources
                    .get_or_insert_with(Default::default)
                    .rerank_table = Some(PathBuf::from(value));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
