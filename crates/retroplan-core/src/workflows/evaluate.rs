use super::plan;
use crate::core::models::molecule::IdentityKey;
use crate::core::models::route::RankedCandidate;
use crate::core::models::task::Task;
use crate::engine::context::PlanningContext;
use crate::engine::decoder::{BeamDecoder, Expander};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use tracing::{info, instrument, warn};

/// Zero-based position of the first candidate whose starting materials match a
/// ground-truth set of `task`.
pub fn match_rank(task: &Task, candidates: &[RankedCandidate]) -> Option<usize> {
    candidates.iter().position(|candidate| {
        let keys: BTreeSet<IdentityKey> = candidate.identity_keys.iter().cloned().collect();
        task.ground_truth_sets.iter().any(|truth| *truth == keys)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub max_depth: usize,
    /// Zero-based rank of the first matching candidate.
    pub rank: Option<usize>,
    pub num_routes: usize,
    pub num_candidates: usize,
    /// Set when the task was abandoned because of a data-integrity fault.
    pub failed: bool,
}

impl TaskOutcome {
    fn abandoned(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            max_depth: task.max_depth,
            rank: None,
            num_routes: 0,
            num_candidates: 0,
            failed: true,
        }
    }
}

/// Solved counts per cutoff for one slice of the corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthStats {
    /// `solved_within[k]` counts tasks whose match rank is at most `k`.
    pub solved_within: Vec<usize>,
    pub total: usize,
}

impl DepthStats {
    fn new(beam_width: usize) -> Self {
        Self {
            solved_within: vec![0; beam_width],
            total: 0,
        }
    }

    fn record(&mut self, rank: Option<usize>) {
        self.total += 1;
        if let Some(rank) = rank {
            for solved in self.solved_within.iter_mut().skip(rank) {
                *solved += 1;
            }
        }
    }

    /// Percentage of tasks solved within the top `k` candidates (`k >= 1`).
    pub fn hit_rate(&self, k: usize) -> f64 {
        if self.total == 0 || k == 0 {
            return 0.0;
        }
        let index = k.min(self.solved_within.len()).saturating_sub(1);
        let solved = self.solved_within.get(index).copied().unwrap_or(0);
        100.0 * solved as f64 / self.total as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    pub beam_width: usize,
    pub overall: DepthStats,
    pub by_depth: BTreeMap<usize, DepthStats>,
    pub outcomes: Vec<TaskOutcome>,
}

#[derive(Serialize)]
struct SummaryRow {
    scope: String,
    top_k: usize,
    solved: usize,
    total: usize,
    hit_rate: f64,
}

impl EvaluationSummary {
    pub fn new(beam_width: usize) -> Self {
        Self {
            beam_width,
            overall: DepthStats::new(beam_width),
            by_depth: BTreeMap::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: TaskOutcome) {
        self.overall.record(outcome.rank);
        self.by_depth
            .entry(outcome.max_depth)
            .or_insert_with(|| DepthStats::new(self.beam_width))
            .record(outcome.rank);
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.overall.total
    }

    pub fn hit_rate(&self, k: usize) -> f64 {
        self.overall.hit_rate(k)
    }

    pub fn failed_tasks(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed).count()
    }

    /// Writes one row per scope (`all` and `depth_<d>`) and cutoff.
    pub fn write_summary_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let scopes = std::iter::once(("all".to_string(), &self.overall)).chain(
            self.by_depth
                .iter()
                .map(|(depth, stats)| (format!("depth_{depth}"), stats)),
        );
        for (scope, stats) in scopes {
            for (index, &solved) in stats.solved_within.iter().enumerate() {
                csv_writer.serialize(SummaryRow {
                    scope: scope.clone(),
                    top_k: index + 1,
                    solved,
                    total: stats.total,
                    hit_rate: stats.hit_rate(index + 1),
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_outcomes_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for outcome in &self.outcomes {
            csv_writer.serialize(outcome)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Plans every task in order and scores the results against the ground truth.
///
/// A data-integrity fault abandons only the task it occurred in; the task is counted as
/// unsolved. Any other failure stops the run.
#[instrument(skip_all, name = "evaluate_workflow", fields(tasks = tasks.len()))]
pub fn evaluate(
    tasks: &[Task],
    context: &PlanningContext,
) -> Result<EvaluationSummary, EngineError> {
    let decoder = BeamDecoder::new(*context);
    evaluate_with(tasks, context, &decoder)
}

pub fn evaluate_with<E: Expander>(
    tasks: &[Task],
    context: &PlanningContext,
    expander: &E,
) -> Result<EvaluationSummary, EngineError> {
    let silent = ProgressReporter::new();
    let task_context = PlanningContext {
        reporter: &silent,
        ..*context
    };

    let mut summary = EvaluationSummary::new(context.beam_width());
    context.reporter.report(Progress::TaskStart {
        total_steps: tasks.len() as u64,
    });

    for task in tasks {
        context.reporter.report(Progress::StatusUpdate {
            text: format!("Task {}", task.id),
        });
        let outcome = match plan::run_with(task, &task_context, expander) {
            Ok(result) => TaskOutcome {
                task_id: task.id.clone(),
                max_depth: task.max_depth,
                rank: match_rank(task, &result.candidates),
                num_routes: result.num_routes,
                num_candidates: result.candidates.len(),
                failed: false,
            },
            Err(EngineError::Chemistry { source }) => {
                warn!(
                    task = %task.id,
                    error = %source,
                    "Abandoning task after data-integrity fault."
                );
                context.reporter.report(Progress::Message(format!(
                    "Task {} abandoned: {}",
                    task.id, source
                )));
                TaskOutcome::abandoned(task)
            }
            Err(e) => {
                return Err(EngineError::TaskFailed {
                    task_id: task.id.clone(),
                    reason: e.to_string(),
                });
            }
        };
        summary.record(outcome);
        context.reporter.report(Progress::TaskIncrement);
    }
    context.reporter.report(Progress::TaskFinish);

    info!(
        total = summary.total(),
        failed = summary.failed_tasks(),
        top1 = summary.hit_rate(1),
        "Evaluation complete."
    );
    Ok(summary)
}
