use crate::cli::EvaluateArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::resources::Resources;
use crate::utils::progress::CliProgressHandler;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use retroplan::core::io::dataset;
use retroplan::core::models::task::Task;
use retroplan::engine::progress::ProgressReporter;
use retroplan::workflows::evaluate::{self as evaluation, EvaluationSummary};
use std::fs::File;
use std::path::Path;
use tracing::info;

pub fn run(args: EvaluateArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args.planner)?;
    let resources = Resources::load(&config)?;

    let tasks = dataset::load_tasks(&args.dataset, &resources.canonicalizer).map_err(|e| {
        CliError::FileParsing {
            path: args.dataset.clone(),
            source: e.into(),
        }
    })?;
    let available = tasks.len();
    let tasks = sample_tasks(tasks, args.limit, config.core_config.seed);
    info!("Evaluating {} of {} task(s).", tasks.len(), available);

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let context = resources.context(&config, &reporter);

    println!("Evaluating {} task(s)...", tasks.len());
    let summary = evaluation::evaluate(&tasks, &context)?;
    print!("{}", format_summary(&summary));

    if let Some(path) = &args.report {
        write_report(path, |file| summary.write_summary_csv(file))?;
        println!("✓ Summary written to: {}", path.display());
    }
    if let Some(path) = &args.outcomes {
        write_report(path, |file| summary.write_outcomes_csv(file))?;
        println!("✓ Per-task outcomes written to: {}", path.display());
    }

    Ok(())
}

/// Keeps a seeded random subset of `limit` tasks, in their original order.
fn sample_tasks(tasks: Vec<Task>, limit: Option<usize>, seed: u64) -> Vec<Task> {
    let Some(limit) = limit.filter(|&limit| limit < tasks.len()) else {
        return tasks;
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, tasks.len(), limit).into_vec();
    picked.sort_unstable();

    let mut slots: Vec<Option<Task>> = tasks.into_iter().map(Some).collect();
    picked
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect()
}

fn write_report(
    path: &Path,
    write: impl FnOnce(File) -> std::result::Result<(), csv::Error>,
) -> Result<()> {
    let file = File::create(path)?;
    write(file).map_err(|source| CliError::Report {
        path: path.to_path_buf(),
        source,
    })
}

fn format_summary(summary: &EvaluationSummary) -> String {
    let mut out = format!(
        "Evaluated {} task(s) with beam width {}",
        summary.total(),
        summary.beam_width
    );
    match summary.failed_tasks() {
        0 => out.push_str(".\n"),
        failed => out.push_str(&format!(" ({} abandoned).\n", failed)),
    }

    for k in 1..=summary.beam_width {
        out.push_str(&format!("  top-{:<3} {:>6.2}%\n", k, summary.hit_rate(k)));
    }
    for (depth, stats) in &summary.by_depth {
        out.push_str(&format!(
            "  depth {:<2} {:>5} task(s)  top-1 {:>6.2}%  top-{} {:>6.2}%\n",
            depth,
            stats.total,
            stats.hit_rate(1),
            summary.beam_width,
            stats.hit_rate(summary.beam_width)
        ));
    }
    out
}
