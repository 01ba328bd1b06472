pub struct DefaultsConfig {
    pub beam_width: usize,
    pub plan_depth: usize,
    pub max_generation_length: usize,
    pub temperature: f64,
    pub rerank_alpha: f64,
    pub rerank_default_log_likelihood: f64,
    pub fingerprint_dim: usize,
    pub seed: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            beam_width: 5,
            plan_depth: 5,
            max_generation_length: 200,
            temperature: 1.2,
            rerank_alpha: 0.01,
            rerank_default_log_likelihood: -10.0,
            fingerprint_dim: 2048,
            seed: 42,
        }
    }
}
