use crate::core::scoring::value::DEFAULT_FINGERPRINT_DIM;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// How many backward steps the search may take below a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthLimit {
    /// Use each task's own `max_depth`.
    #[default]
    FromTask,
    /// Override every task with the same limit.
    Fixed(usize),
}

impl DepthLimit {
    pub fn resolve(&self, task_depth: usize) -> usize {
        match self {
            DepthLimit::FromTask => task_depth,
            DepthLimit::Fixed(depth) => *depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub beam_width: usize,
    pub depth_limit: DepthLimit,
    /// Stop after this many rounds even if the frontier is not exhausted.
    pub max_rounds: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodingConfig {
    pub max_generation_length: usize,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RerankConfig {
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueConfig {
    pub fingerprint_dim: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanningConfig {
    pub search: SearchConfig,
    pub decoding: DecodingConfig,
    pub rerank: RerankConfig,
    pub value: ValueConfig,
    pub seed: u64,
}

#[derive(Default)]
pub struct PlanningConfigBuilder {
    beam_width: Option<usize>,
    depth_limit: Option<DepthLimit>,
    max_rounds: Option<usize>,
    max_generation_length: Option<usize>,
    temperature: Option<f64>,
    rerank_alpha: Option<f64>,
    fingerprint_dim: Option<usize>,
    seed: Option<u64>,
}

impl PlanningConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beam_width(mut self, width: usize) -> Self {
        self.beam_width = Some(width);
        self
    }
    pub fn depth_limit(mut self, limit: DepthLimit) -> Self {
        self.depth_limit = Some(limit);
        self
    }
    pub fn max_rounds(mut self, rounds: Option<usize>) -> Self {
        self.max_rounds = rounds;
        self
    }
    pub fn max_generation_length(mut self, length: usize) -> Self {
        self.max_generation_length = Some(length);
        self
    }
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
    pub fn rerank_alpha(mut self, alpha: f64) -> Self {
        self.rerank_alpha = Some(alpha);
        self
    }
    pub fn fingerprint_dim(mut self, dim: usize) -> Self {
        self.fingerprint_dim = Some(dim);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<PlanningConfig, ConfigError> {
        let beam_width = self
            .beam_width
            .ok_or(ConfigError::MissingParameter("beam_width"))?;
        if beam_width == 0 {
            return Err(invalid("beam_width", "must be at least 1"));
        }
        if self.max_rounds == Some(0) {
            return Err(invalid("max_rounds", "must be at least 1 when set"));
        }

        let max_generation_length = self
            .max_generation_length
            .ok_or(ConfigError::MissingParameter("max_generation_length"))?;
        if max_generation_length == 0 {
            return Err(invalid("max_generation_length", "must be at least 1"));
        }

        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(invalid("temperature", "must be a positive number"));
        }

        let alpha = self
            .rerank_alpha
            .ok_or(ConfigError::MissingParameter("rerank_alpha"))?;
        if !alpha.is_finite() {
            return Err(invalid("rerank_alpha", "must be finite"));
        }

        let fingerprint_dim = self.fingerprint_dim.unwrap_or(DEFAULT_FINGERPRINT_DIM);
        if fingerprint_dim == 0 {
            return Err(invalid("fingerprint_dim", "must be at least 1"));
        }

        Ok(PlanningConfig {
            search: SearchConfig {
                beam_width,
                depth_limit: self.depth_limit.unwrap_or_default(),
                max_rounds: self.max_rounds,
            },
            decoding: DecodingConfig {
                max_generation_length,
                temperature,
            },
            rerank: RerankConfig { alpha },
            value: ValueConfig { fingerprint_dim },
            seed: self.seed.unwrap_or(42),
        })
    }
}

fn invalid(parameter: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        parameter,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> PlanningConfigBuilder {
        PlanningConfigBuilder::new()
            .beam_width(5)
            .max_generation_length(200)
            .temperature(1.2)
            .rerank_alpha(0.01)
    }

    #[test]
    fn build_fills_optional_defaults() {
        let config = complete().build().unwrap();
        assert_eq!(config.search.beam_width, 5);
        assert_eq!(config.search.depth_limit, DepthLimit::FromTask);
        assert_eq!(config.search.max_rounds, None);
        assert_eq!(config.value.fingerprint_dim, 2048);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn build_fails_without_required_parameters() {
        let result = PlanningConfigBuilder::new()
            .max_generation_length(10)
            .temperature(1.0)
            .rerank_alpha(0.0)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("beam_width")));

        let result = PlanningConfigBuilder::new()
            .beam_width(1)
            .max_generation_length(10)
            .rerank_alpha(0.0)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("temperature")));
    }

    #[test]
    fn build_rejects_invalid_values() {
        assert!(matches!(
            complete().beam_width(0).build(),
            Err(ConfigError::InvalidValue { parameter: "beam_width", .. })
        ));
        assert!(matches!(
            complete().temperature(0.0).build(),
            Err(ConfigError::InvalidValue { parameter: "temperature", .. })
        ));
        assert!(matches!(
            complete().max_rounds(Some(0)).build(),
            Err(ConfigError::InvalidValue { parameter: "max_rounds", .. })
        ));
        assert!(matches!(
            complete().rerank_alpha(f64::NAN).build(),
            Err(ConfigError::InvalidValue { parameter: "rerank_alpha", .. })
        ));
    }

    #[test]
    fn depth_limit_resolves_against_task_depth() {
        assert_eq!(DepthLimit::FromTask.resolve(3), 3);
        assert_eq!(DepthLimit::Fixed(1).resolve(3), 1);
    }
}
