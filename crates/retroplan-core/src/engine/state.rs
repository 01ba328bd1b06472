use crate::core::models::route::CompletedRoute;

/// Counters collected while searching one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub rounds: usize,
    pub nodes_expanded: usize,
    pub nodes_pruned_by_depth: usize,
    pub decoder_calls: usize,
    pub value_cache_hits: usize,
}

/// The unbounded answer set of one search, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub routes: Vec<CompletedRoute>,
    pub stats: SearchStats,
    /// Set when the round limit ended the search before the frontier was exhausted.
    pub truncated: bool,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The lowest-scoring route found, if any.
    pub fn best(&self) -> Option<&CompletedRoute> {
        self.routes
            .iter()
            .min_by(|a, b| a.score.total_cmp(&b.score))
    }
}
