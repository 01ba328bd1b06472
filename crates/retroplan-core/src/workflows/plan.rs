use crate::core::models::molecule::Molecule;
use crate::core::models::route::RankedCandidate;
use crate::core::models::task::Task;
use crate::engine::context::PlanningContext;
use crate::engine::decoder::{BeamDecoder, Expander};
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::rerank;
use crate::engine::search::RouteSearch;
use crate::engine::state::SearchStats;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct PlanResult {
    pub task_id: String,
    pub target: Molecule,
    /// Depth limit the search actually ran with.
    pub depth_limit: usize,
    /// Number of complete routes found before deduplication.
    pub num_routes: usize,
    pub candidates: Vec<RankedCandidate>,
    pub stats: SearchStats,
    pub truncated: bool,
}

/// Plans one task: beam-decoded route search followed by deduplication and reranking.
#[instrument(skip_all, name = "plan_workflow", fields(task = %task.id))]
pub fn run(task: &Task, context: &PlanningContext) -> Result<PlanResult, EngineError> {
    let decoder = BeamDecoder::new(*context);
    run_with(task, context, &decoder)
}

/// Like [`run`], but decomposes molecules with a caller-supplied expander.
pub fn run_with<E: Expander>(
    task: &Task,
    context: &PlanningContext,
    expander: &E,
) -> Result<PlanResult, EngineError> {
    let depth_limit = context.config.search.depth_limit.resolve(task.max_depth);
    info!(
        molecule = task.target.smiles(),
        depth_limit,
        "Planning routes for task."
    );

    context.reporter.report(Progress::PhaseStart {
        name: "Route Search",
    });
    let outcome = RouteSearch::new(*context, expander).run(task)?;
    context.reporter.report(Progress::PhaseFinish);

    context.reporter.report(Progress::PhaseStart { name: "Reranking" });
    let num_routes = outcome.routes.len();
    let candidates = rerank::rerank(outcome.routes, &task.target, context)?;
    context.reporter.report(Progress::PhaseFinish);

    info!(
        routes = num_routes,
        candidates = candidates.len(),
        rounds = outcome.stats.rounds,
        "Planning complete."
    );
    Ok(PlanResult {
        task_id: task.id.clone(),
        target: task.target.clone(),
        depth_limit,
        num_routes,
        candidates,
        stats: outcome.stats,
        truncated: outcome.truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::route::ReactionCandidate;
    use crate::core::scoring::ScoringError;
    use crate::core::scoring::predictor::ReactionTablePredictor;
    use crate::engine::testing::{Fixture, key_of};
    use crate::workflows::evaluate::match_rank;
    use std::collections::BTreeSet;

    fn ester_fixture(beam_width: usize) -> Fixture {
        let fixture = Fixture::new(beam_width).with_stock(&["CCO", "CC(=O)O", "CC(=O)Cl"]);
        let mut predictor = ReactionTablePredictor::new(fixture.vocabulary.clone());
        predictor.insert("CCOC(C)=O", "CC(=O)O.CCO", 0.7);
        predictor.insert("CCOC(C)=O", "CC(=O)Cl.CCO", 0.3);
        fixture
            .with_predictor(predictor)
            .with_value_estimator(|s: &str| Ok::<_, ScoringError>(s.len() as f64 / 10.0))
    }

    fn ester_task(fixture: &Fixture, max_depth: usize) -> Task {
        let truth: BTreeSet<_> = ["CCO", "CC(=O)Cl"]
            .iter()
            .map(|s| key_of(fixture, s))
            .collect();
        Task::new("ester", fixture.mol("CCOC(C)=O"), max_depth).with_ground_truth(vec![truth])
    }

    #[test]
    fn run_plans_full_pipeline_with_table_predictor() {
        let fixture = ester_fixture(5);
        let task = ester_task(&fixture, 1);
        let result = run(&task, &fixture.context()).unwrap();

        assert_eq!(result.num_routes, 2);
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[0].joined_materials(), "CC(=O)O.CCO");
        assert_eq!(result.candidates[1].joined_materials(), "CC(=O)Cl.CCO");
        assert_eq!(match_rank(&task, &result.candidates), Some(1));
    }

    #[test]
    fn target_already_in_stock_completes_in_one_round() {
        let fixture = Fixture::new(3).with_stock(&["c1ccccc1"]);
        let task = Task::new("benzene", fixture.mol("c1ccccc1"), 2);
        let expander = |product: &Molecule, _: usize| {
            Ok::<_, EngineError>(vec![ReactionCandidate::new(vec![product.clone()], 0.0)])
        };

        let result = run_with(&task, &fixture.context(), &expander).unwrap();
        assert_eq!(result.num_routes, 1);
        assert_eq!(result.stats.rounds, 1);
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].joined_materials(), "c1ccccc1");
        assert_eq!(result.candidates[0].score, 0.0);
    }

    #[test]
    fn greedy_beam_is_deterministic() {
        let fixture = ester_fixture(1);
        let task = ester_task(&fixture, 1);

        let first = run(&task, &fixture.context()).unwrap();
        let second = run(&task, &fixture.context()).unwrap();

        let outcome = |r: &PlanResult| (r.depth_limit, match_rank(&task, &r.candidates));
        assert_eq!(outcome(&first), outcome(&second));
        assert_eq!(first.candidates, second.candidates);
        assert_eq!(first.candidates.len(), 1);
    }

    #[test]
    fn permuted_material_sets_collapse_to_one_candidate() {
        let fixture = Fixture::new(5).with_stock(&["CCO", "CC(=O)O"]);
        let task = Task::new("ester", fixture.mol("CCOC(C)=O"), 1);
        let a = fixture.mol("CC(=O)O");
        let b = fixture.mol("CCO");
        let expander = move |_: &Molecule, _: usize| {
            Ok::<_, EngineError>(vec![
                ReactionCandidate::new(vec![a.clone(), b.clone()], 0.1),
                ReactionCandidate::new(vec![b.clone(), a.clone()], 0.2),
            ])
        };

        let result = run_with(&task, &fixture.context(), &expander).unwrap();
        assert_eq!(result.num_routes, 2);
        assert_eq!(result.candidates.len(), 1);
        assert!((result.candidates[0].score - 0.1).abs() < 1e-12);
    }

    #[test]
    fn zero_depth_without_terminal_step_finds_nothing() {
        let fixture = Fixture::new(3).with_stock(&["CC=O"]);
        let mut predictor = ReactionTablePredictor::new(fixture.vocabulary.clone());
        predictor.insert("CCOC(C)=O", "CC(=O)O.CCO", 1.0);
        predictor.insert("CC(=O)O", "CC=O", 1.0);
        predictor.insert("CCO", "CC=O", 1.0);
        let fixture = fixture.with_predictor(predictor);

        let truth: BTreeSet<_> = [key_of(&fixture, "CC=O")].into_iter().collect();
        let task = Task::new("ester", fixture.mol("CCOC(C)=O"), 0).with_ground_truth(vec![truth]);

        let result = run(&task, &fixture.context()).unwrap();
        assert!(result.candidates.is_empty());
        assert_eq!(match_rank(&task, &result.candidates), None);
    }

    #[test]
    fn run_reports_search_and_rerank_phases() {
        use crate::engine::progress::ProgressReporter;
        use std::sync::{Arc, Mutex};

        let phases = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&phases);
        let mut fixture = ester_fixture(2);
        fixture.reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::PhaseStart { name } = event {
                sink.lock().unwrap().push(name);
            }
        }));

        let task = ester_task(&fixture, 1);
        run(&task, &fixture.context()).unwrap();
        assert_eq!(*phases.lock().unwrap(), vec!["Route Search", "Reranking"]);
    }
}
