use super::cache::ValueCache;
use super::context::PlanningContext;
use super::decoder::Expander;
use super::error::EngineError;
use super::progress::Progress;
use super::state::{SearchOutcome, SearchStats};
use crate::core::models::molecule::Molecule;
use crate::core::models::route::{CompletedRoute, ReactionCandidate, SearchNode};
use crate::core::models::task::Task;
use tracing::{debug, warn};

/// Best-first, beam-pruned search for complete routes.
///
/// Each round pops the head branch of every frontier node, decomposes it with the
/// expander and keeps the `beam_width` cheapest children as the next frontier. A node
/// whose head branch is deeper than the depth limit yields nothing.
pub struct RouteSearch<'a, E: Expander> {
    context: PlanningContext<'a>,
    expander: &'a E,
}

impl<'a, E: Expander> RouteSearch<'a, E> {
    pub fn new(context: PlanningContext<'a>, expander: &'a E) -> Self {
        Self { context, expander }
    }

    pub fn run(&self, task: &Task) -> Result<SearchOutcome, EngineError> {
        let beam_width = self.context.beam_width();
        let max_depth = self.context.config.search.depth_limit.resolve(task.max_depth);
        let max_rounds = self.context.config.search.max_rounds;

        let mut cache = ValueCache::new();
        let mut stats = SearchStats::default();
        let mut routes = Vec::new();
        let mut truncated = false;

        let root_value = cache.value_of(&task.target, self.context.value_estimator)?;
        let mut queue = vec![SearchNode::root(task.target.clone(), root_value)];

        while !queue.is_empty() {
            if max_rounds.is_some_and(|limit| stats.rounds >= limit) {
                warn!(
                    task = task.id.as_str(),
                    rounds = stats.rounds,
                    frontier = queue.len(),
                    "Round limit reached; stopping search early"
                );
                truncated = true;
                break;
            }
            stats.rounds += 1;

            let mut children = Vec::new();
            for node in &queue {
                self.expand_node(
                    node,
                    max_depth,
                    beam_width,
                    &mut cache,
                    &mut stats,
                    &mut routes,
                    &mut children,
                )?;
            }

            children.sort_by(|a, b| a.score.total_cmp(&b.score));
            children.truncate(beam_width);

            debug!(
                task = task.id.as_str(),
                round = stats.rounds,
                frontier = children.len(),
                routes = routes.len(),
                "Search round complete"
            );
            self.context.reporter.report(Progress::StatusUpdate {
                text: format!(
                    "Round {}: {} open, {} routes",
                    stats.rounds,
                    children.len(),
                    routes.len()
                ),
            });
            queue = children;
        }

        stats.value_cache_hits = cache.hits();
        Ok(SearchOutcome {
            routes,
            stats,
            truncated,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_node(
        &self,
        node: &SearchNode,
        max_depth: usize,
        beam_width: usize,
        cache: &mut ValueCache,
        stats: &mut SearchStats,
        routes: &mut Vec<CompletedRoute>,
        children: &mut Vec<SearchNode>,
    ) -> Result<(), EngineError> {
        let (head, rest) = node
            .pending
            .first()
            .zip(node.pending.drop_first())
            .ok_or_else(|| {
                EngineError::Internal("frontier node has no pending branch".to_string())
            })?;
        if head.depth > max_depth {
            stats.nodes_pruned_by_depth += 1;
            return Ok(());
        }

        stats.nodes_expanded += 1;
        stats.decoder_calls += 1;
        let candidates = self.expander.expand(head.molecule(), beam_width)?;
        let head_value = cache.value_of(head.molecule(), self.context.value_estimator)?;
        let longest_path = node.longest_path.max(head.path_len());

        for ReactionCandidate { reactants, cost } in candidates {
            let base_score = node.score + cost - head_value;
            let (purchasable, open): (Vec<&Molecule>, Vec<&Molecule>) = reactants
                .iter()
                .partition(|r| self.context.stock.is_purchasable(r));

            let mut resolved = node.resolved_materials.clone();
            for material in purchasable {
                if !resolved.iter().any(|m| m == material) {
                    resolved.push_front_mut(material.clone());
                }
            }

            if open.is_empty() && rest.is_empty() {
                routes.push(CompletedRoute {
                    score: base_score,
                    resolved_materials: resolved.iter().cloned().collect(),
                    longest_path,
                });
                continue;
            }

            let mut score = base_score;
            let mut pending = rest.clone();
            for reactant in open {
                score += cache.value_of(reactant, self.context.value_estimator)?;
                pending.push_front_mut(head.branch(reactant.clone()));
            }
            children.push(SearchNode {
                score,
                pending,
                resolved_materials: resolved,
                longest_path,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::ScoringError;
    use crate::engine::testing::Fixture;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// An expander answering from a `product -> [(reactants, cost)]` table.
    fn table_expander(
        fixture: &Fixture,
        table: &[(&str, Vec<(Vec<&str>, f64)>)],
    ) -> impl Fn(&Molecule, usize) -> Result<Vec<ReactionCandidate>, EngineError> + use<> {
        let table: HashMap<String, Vec<ReactionCandidate>> = table
            .iter()
            .map(|(product, options)| {
                let candidates = options
                    .iter()
                    .map(|(reactants, cost)| {
                        ReactionCandidate::new(
                            reactants.iter().map(|s| fixture.mol(s)).collect(),
                            *cost,
                        )
                    })
                    .collect();
                (fixture.mol(product).smiles().to_string(), candidates)
            })
            .collect();
        move |product: &Molecule, width: usize| {
            Ok(table
                .get(product.smiles())
                .map(|c| c.iter().take(width).cloned().collect())
                .unwrap_or_default())
        }
    }

    fn task(fixture: &Fixture, target: &str, max_depth: usize) -> Task {
        Task::new("t", fixture.mol(target), max_depth)
    }

    fn material_smiles(route: &CompletedRoute) -> Vec<String> {
        let mut smiles: Vec<String> = route
            .resolved_materials
            .iter()
            .map(|m| m.smiles().to_string())
            .collect();
        smiles.sort();
        smiles
    }

    #[test]
    fn single_step_route_subtracts_consumed_value() {
        let fixture = Fixture::new(3)
            .with_stock(&["CCO", "CC(=O)O"])
            .with_value_estimator(|s: &str| Ok::<_, ScoringError>(s.len() as f64));
        let expander = table_expander(
            &fixture,
            &[("CCOC(C)=O", vec![(vec!["CC(=O)O", "CCO"], 0.5)])],
        );
        let search = RouteSearch::new(fixture.context(), &expander);

        let outcome = search.run(&task(&fixture, "CCOC(C)=O", 1)).unwrap();
        assert_eq!(outcome.routes.len(), 1);
        let route = &outcome.routes[0];
        // V(target) + cost - V(target)
        assert!((route.score - 0.5).abs() < 1e-12);
        assert_eq!(material_smiles(route), vec!["CC(=O)O", "CCO"]);
        assert_eq!(route.longest_path, 1);
        assert_eq!(outcome.stats.rounds, 1);
    }

    #[test]
    fn non_purchasable_reactants_open_new_branches() {
        let fixture = Fixture::new(3)
            .with_stock(&["CCO", "O", "CC=O"])
            .with_value_estimator(|s: &str| Ok::<_, ScoringError>(s.len() as f64));
        let expander = table_expander(
            &fixture,
            &[
                ("CCOC(C)=O", vec![(vec!["CC(=O)O", "CCO"], 0.5)]),
                ("CC(=O)O", vec![(vec!["CC=O", "O"], 0.25)]),
            ],
        );
        let search = RouteSearch::new(fixture.context(), &expander);

        let outcome = search.run(&task(&fixture, "CCOC(C)=O", 2)).unwrap();
        assert_eq!(outcome.routes.len(), 1);
        let route = &outcome.routes[0];
        // V(t) + 0.5 + V(CC(=O)O) - V(t) + 0.25 - V(CC(=O)O)
        assert!((route.score - 0.75).abs() < 1e-12);
        assert_eq!(material_smiles(route), vec!["CC=O", "CCO", "O"]);
        assert_eq!(route.longest_path, 2);
        assert_eq!(outcome.stats.rounds, 2);
        assert_eq!(outcome.stats.nodes_expanded, 2);
    }

    /// The ester splits into two open reactants; `acid` decides how CC(=O)O decomposes.
    fn ester_with_two_open_reactants(
        fixture: &Fixture,
        acid: Vec<(Vec<&str>, f64)>,
    ) -> impl Fn(&Molecule, usize) -> Result<Vec<ReactionCandidate>, EngineError> + use<> {
        table_expander(
            fixture,
            &[
                ("CCOC(C)=O", vec![(vec!["CC(=O)O", "CCO"], 0.5)]),
                ("CCO", vec![(vec!["C", "O"], 0.25)]),
                ("CC(=O)O", acid),
            ],
        )
    }

    #[test]
    fn last_open_reactant_in_sorted_order_is_expanded_first() {
        let fixture = Fixture::new(2)
            .with_stock(&["C", "O"])
            .with_value_estimator(|s: &str| Ok::<_, ScoringError>(s.len() as f64));
        let inner = ester_with_two_open_reactants(&fixture, vec![(vec!["O"], 0.125)]);
        let calls = RefCell::new(Vec::new());
        let expander = |product: &Molecule, width: usize| {
            calls.borrow_mut().push(product.smiles().to_string());
            inner(product, width)
        };
        let search = RouteSearch::new(fixture.context(), &expander);

        let outcome = search.run(&task(&fixture, "CCOC(C)=O", 1)).unwrap();
        assert_eq!(*calls.borrow(), vec!["CCOC(C)=O", "CCO", "CC(=O)O"]);
        assert_eq!(outcome.routes.len(), 1);
        let route = &outcome.routes[0];
        // 9 + 0.5 + V(CC(=O)O) + V(CCO) - 9, then + 0.25 - V(CCO), then + 0.125 - V(CC(=O)O)
        assert!((route.score - 0.875).abs() < 1e-12);
        assert_eq!(material_smiles(route), vec!["C", "O"]);
        // Sibling branches each sit one step below the target.
        assert_eq!(route.longest_path, 2);
        assert_eq!(outcome.stats.nodes_pruned_by_depth, 0);
        assert_eq!(outcome.stats.rounds, 3);
    }

    #[test]
    fn purchasable_reactants_do_not_end_a_route_with_open_siblings() {
        let fixture = Fixture::new(2).with_stock(&["C", "O"]);
        let inner = ester_with_two_open_reactants(&fixture, vec![]);
        let calls = RefCell::new(Vec::new());
        let expander = |product: &Molecule, width: usize| {
            calls.borrow_mut().push(product.smiles().to_string());
            inner(product, width)
        };
        let search = RouteSearch::new(fixture.context(), &expander);

        let outcome = search.run(&task(&fixture, "CCOC(C)=O", 2)).unwrap();
        // CCO resolves to stock, but CC(=O)O is still open and has no decomposition.
        assert!(outcome.is_empty());
        assert_eq!(*calls.borrow(), vec!["CCOC(C)=O", "CCO", "CC(=O)O"]);
        assert_eq!(outcome.stats.nodes_expanded, 3);
        assert_eq!(outcome.stats.rounds, 3);
    }

    #[test]
    fn branches_beyond_depth_limit_are_dropped() {
        let fixture = Fixture::new(3).with_stock(&["O", "CC=O"]);
        let expander = table_expander(
            &fixture,
            &[
                ("CCOC(C)=O", vec![(vec!["CC(=O)O", "CCO"], 0.5)]),
                ("CC(=O)O", vec![(vec!["CC=O", "O"], 0.25)]),
                ("CCO", vec![(vec!["CC=O"], 0.1)]),
            ],
        );
        let search = RouteSearch::new(fixture.context(), &expander);

        let outcome = search.run(&task(&fixture, "CCOC(C)=O", 0)).unwrap();
        assert!(outcome.is_empty());
        assert!(outcome.stats.nodes_pruned_by_depth > 0);

        let outcome = search.run(&task(&fixture, "CCOC(C)=O", 1)).unwrap();
        assert_eq!(outcome.routes.len(), 1);
        assert!(outcome.routes.iter().all(|r| r.longest_path <= 2));
    }

    #[test]
    fn frontier_is_pruned_to_beam_width() {
        let fixture = Fixture::new(1).with_stock(&["C", "N"]);
        let expander = table_expander(
            &fixture,
            &[
                (
                    "CCN",
                    vec![(vec!["CC", "N"], 0.1), (vec!["CN", "C"], 0.2)],
                ),
                ("CC", vec![(vec!["C"], 0.1)]),
                ("CN", vec![(vec!["C", "N"], 0.0)]),
            ],
        );
        let search = RouteSearch::new(fixture.context(), &expander);

        let outcome = search.run(&task(&fixture, "CCN", 3)).unwrap();
        // Width 1 decodes only the cheapest candidate and keeps one child per round.
        assert_eq!(outcome.routes.len(), 1);
        assert_eq!(material_smiles(&outcome.routes[0]), vec!["C", "N"]);
        assert!((outcome.routes[0].score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn resolved_materials_do_not_repeat() {
        let fixture = Fixture::new(2).with_stock(&["C"]);
        let expander = table_expander(
            &fixture,
            &[
                ("CCCC", vec![(vec!["CC", "C"], 0.0)]),
                ("CC", vec![(vec!["C"], 0.0)]),
            ],
        );
        let search = RouteSearch::new(fixture.context(), &expander);
        let outcome = search.run(&task(&fixture, "CCCC", 2)).unwrap();
        assert_eq!(outcome.routes.len(), 1);
        assert_eq!(outcome.routes[0].resolved_materials.len(), 1);
    }

    #[test]
    fn round_limit_truncates_search() {
        let mut fixture = Fixture::new(2);
        fixture.config.search.max_rounds = Some(2);
        // CC decomposes into itself forever.
        let expander = table_expander(&fixture, &[("CC", vec![(vec!["CC"], 0.1)])]);
        let search = RouteSearch::new(fixture.context(), &expander);

        let outcome = search.run(&task(&fixture, "CC", 100)).unwrap();
        assert!(outcome.truncated);
        assert_eq!(outcome.stats.rounds, 2);
        assert!(outcome.is_empty());
    }

    #[test]
    fn value_estimates_are_memoized_per_molecule() {
        let calls = std::rc::Rc::new(Cell::new(0));
        let counter = calls.clone();
        let fixture = Fixture::new(2)
            .with_stock(&["O"])
            .with_value_estimator(move |_: &str| {
                counter.set(counter.get() + 1);
                Ok::<_, ScoringError>(1.0)
            });
        let expander = table_expander(
            &fixture,
            &[
                ("CCO", vec![(vec!["CC", "O"], 0.1)]),
                ("CC", vec![(vec!["O"], 0.1)]),
            ],
        );
        let search = RouteSearch::new(fixture.context(), &expander);
        let outcome = search.run(&task(&fixture, "CCO", 3)).unwrap();

        assert_eq!(outcome.routes.len(), 1);
        assert_eq!(calls.get(), 2);
        assert!(outcome.stats.value_cache_hits >= 1);
    }

    #[test]
    fn expander_failures_abort_the_search() {
        let fixture = Fixture::new(1);
        let expander = |_: &Molecule, _: usize| -> Result<Vec<ReactionCandidate>, EngineError> {
            Err(ScoringError::Predictor("model unavailable".to_string()).into())
        };
        let search = RouteSearch::new(fixture.context(), &expander);
        let result = search.run(&task(&fixture, "CC", 1));
        assert!(matches!(result, Err(EngineError::Collaborator { .. })));
    }
}
