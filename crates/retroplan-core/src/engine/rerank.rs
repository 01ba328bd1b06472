use super::context::PlanningContext;
use super::error::EngineError;
use crate::core::chem::canonical::Canonicalizer;
use crate::core::models::molecule::{IdentityKey, Molecule, sort_by_smiles};
use crate::core::models::route::{CompletedRoute, RankedCandidate};
use crate::core::scoring::ScoringError;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Collapses routes that use the same set of starting materials.
///
/// Routes are sorted ascending by score first (stably), so the cheapest route of every
/// identity-key set survives. Materials are re-canonicalized here; a material that no
/// longer yields an identity key is a data-integrity fault.
pub fn deduplicate(
    mut routes: Vec<CompletedRoute>,
    canonicalizer: &dyn Canonicalizer,
) -> Result<Vec<RankedCandidate>, EngineError> {
    routes.sort_by(|a, b| a.score.total_cmp(&b.score));

    let mut seen: HashSet<Vec<IdentityKey>> = HashSet::new();
    let mut unique = Vec::new();
    for route in routes {
        let mut by_key: BTreeMap<IdentityKey, Molecule> = BTreeMap::new();
        for material in &route.resolved_materials {
            let molecule = Molecule::parse(material.smiles(), canonicalizer)?;
            by_key.entry(molecule.key().clone()).or_insert(molecule);
        }
        let identity_keys: Vec<IdentityKey> = by_key.keys().cloned().collect();
        if !seen.insert(identity_keys.clone()) {
            continue;
        }
        let mut materials: Vec<Molecule> = by_key.into_values().collect();
        sort_by_smiles(&mut materials);
        unique.push(RankedCandidate {
            score: route.score,
            rerank_score: 0.0,
            total_score: route.score,
            identity_keys,
            materials,
        });
    }
    Ok(unique)
}

/// Deduplicates the answer set of one search and reorders it with the route reranker.
///
/// `total_score = score + alpha * rerank_score`, where `rerank_score` is the negated
/// log-likelihood. The result holds at most `beam_width` candidates in ascending total
/// score; ties keep the order of the deduplicated list.
pub fn rerank(
    routes: Vec<CompletedRoute>,
    product: &Molecule,
    context: &PlanningContext<'_>,
) -> Result<Vec<RankedCandidate>, EngineError> {
    let mut candidates = deduplicate(routes, context.canonicalizer)?;
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let products = vec![product.smiles().to_string(); candidates.len()];
    let joined: Vec<String> = candidates.iter().map(RankedCandidate::joined_materials).collect();
    let log_likelihoods = context.reranker.score_batch(&products, &joined)?;
    if log_likelihoods.len() != candidates.len() {
        return Err(ScoringError::LengthMismatch {
            collaborator: "Route reranker",
            expected: candidates.len(),
            actual: log_likelihoods.len(),
        }
        .into());
    }

    let alpha = context.config.rerank.alpha;
    for (candidate, log_likelihood) in candidates.iter_mut().zip(log_likelihoods) {
        candidate.rerank_score = -log_likelihood;
        candidate.total_score = candidate.score + alpha * candidate.rerank_score;
    }

    candidates.sort_by(|a, b| a.total_score.total_cmp(&b.total_score));
    candidates.truncate(context.beam_width());
    debug!(
        product = product.smiles(),
        kept = candidates.len(),
        "Reranked candidate routes"
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::canonical::SmilesCanonicalizer;
    use crate::core::scoring::reranker::TableReranker;
    use crate::engine::testing::{Fixture, key_of};

    fn route(fixture: &Fixture, score: f64, materials: &[&str]) -> CompletedRoute {
        CompletedRoute {
            score,
            resolved_materials: materials.iter().map(|s| fixture.mol(s)).collect(),
            longest_path: 1,
        }
    }

    #[test]
    fn deduplicate_collapses_permuted_material_sets() {
        let fixture = Fixture::new(5);
        let routes = vec![
            route(&fixture, 2.0, &["CCO", "CC(=O)O"]),
            route(&fixture, 1.0, &["CC(=O)O", "CCO"]),
        ];
        let unique = deduplicate(routes, &SmilesCanonicalizer::new()).unwrap();

        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].score, 1.0);
        assert_eq!(unique[0].joined_materials(), "CC(=O)O.CCO");
        let mut expected = vec![key_of(&fixture, "CCO"), key_of(&fixture, "CC(=O)O")];
        expected.sort();
        assert_eq!(unique[0].identity_keys, expected);
    }

    #[test]
    fn deduplicate_keeps_distinct_sets_in_score_order() {
        let fixture = Fixture::new(5);
        let routes = vec![
            route(&fixture, 3.0, &["N"]),
            route(&fixture, 1.0, &["O"]),
            route(&fixture, 2.0, &["N", "O"]),
        ];
        let unique = deduplicate(routes, &SmilesCanonicalizer::new()).unwrap();
        let scores: Vec<f64> = unique.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![1.0, 2.0, 3.0]);

        let key_sets: HashSet<Vec<IdentityKey>> =
            unique.iter().map(|c| c.identity_keys.clone()).collect();
        assert_eq!(key_sets.len(), unique.len());
    }

    #[test]
    fn deduplicate_reports_materials_that_lost_their_identity() {
        let bogus = Molecule::from_parts("C(", IdentityKey::from_hash("ZZZZZZZZZZZZZZ").unwrap());
        let routes = vec![CompletedRoute {
            score: 0.0,
            resolved_materials: vec![bogus],
            longest_path: 1,
        }];
        let result = deduplicate(routes, &SmilesCanonicalizer::new());
        assert!(matches!(result, Err(EngineError::Chemistry { .. })));
    }

    #[test]
    fn rerank_combines_scores_with_alpha_and_truncates() {
        let mut reranker = TableReranker::new(0.0);
        reranker.insert("CCN", "N", -100.0);
        let mut fixture = Fixture::new(2).with_reranker(reranker);
        fixture.config.rerank.alpha = 0.01;

        let routes = vec![
            route(&fixture, 1.0, &["N"]),
            route(&fixture, 1.5, &["O"]),
            route(&fixture, 1.8, &["C"]),
        ];
        let ranked = rerank(routes, &fixture.mol("CCN"), &fixture.context()).unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].joined_materials(), "O");
        assert_eq!(ranked[1].joined_materials(), "C");
        assert!(ranked.windows(2).all(|w| w[0].total_score <= w[1].total_score));

        // N falls to 1.0 + 0.01 * 100 = 2.0 and is cut by the beam.
        assert!(ranked.iter().all(|c| c.joined_materials() != "N"));
    }

    #[test]
    fn rerank_keeps_input_order_for_equal_totals() {
        let fixture = Fixture::new(5);
        let routes = vec![
            route(&fixture, 1.0, &["O"]),
            route(&fixture, 1.0, &["N"]),
            route(&fixture, 1.0, &["C"]),
        ];
        let ranked = rerank(routes, &fixture.mol("CCN"), &fixture.context()).unwrap();
        let order: Vec<String> = ranked.iter().map(|c| c.joined_materials()).collect();
        assert_eq!(order, vec!["O", "N", "C"]);
        assert!(ranked.iter().all(|c| c.rerank_score == 0.0));
    }

    #[test]
    fn rerank_of_empty_answer_set_skips_the_reranker() {
        let fixture = Fixture::new(3).with_reranker(
            |_: &[String], _: &[String]| -> Result<Vec<f64>, ScoringError> {
                panic!("reranker must not be called")
            },
        );
        let ranked = rerank(Vec::new(), &fixture.mol("C"), &fixture.context()).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn rerank_rejects_short_batches() {
        let fixture = Fixture::new(3).with_reranker(
            |_: &[String], _: &[String]| -> Result<Vec<f64>, ScoringError> { Ok(vec![]) },
        );
        let routes = vec![route(&fixture, 1.0, &["O"])];
        let result = rerank(routes, &fixture.mol("CO"), &fixture.context());
        assert!(matches!(
            result,
            Err(EngineError::Collaborator {
                source: ScoringError::LengthMismatch { .. }
            })
        ));
    }
}
