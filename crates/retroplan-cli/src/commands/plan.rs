use crate::cli::PlanArgs;
use crate::config::{DefaultsConfig, build_config};
use crate::error::{CliError, Result};
use crate::resources::Resources;
use crate::utils::progress::CliProgressHandler;
use retroplan::core::models::molecule::Molecule;
use retroplan::core::models::route::RankedCandidate;
use retroplan::core::models::task::Task;
use retroplan::engine::progress::ProgressReporter;
use retroplan::workflows;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

#[derive(Serialize)]
struct CandidateRow<'a> {
    rank: usize,
    total_score: f64,
    score: f64,
    rerank_score: f64,
    materials: &'a str,
}

pub fn run(args: PlanArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args.planner)?;
    let resources = Resources::load(&config)?;

    let target = Molecule::parse(&args.target, &resources.canonicalizer).map_err(|e| {
        CliError::Argument(format!("Invalid target '{}': {}", args.target, e))
    })?;
    let depth = args.depth.unwrap_or(DefaultsConfig::default().plan_depth);
    let task = Task::new("target", target, depth);

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let context = resources.context(&config, &reporter);

    println!("Planning routes for {} ...", task.target);
    let result = workflows::plan::run(&task, &context)?;
    info!(
        "Workflow finished with {} candidate(s) from {} route(s).",
        result.candidates.len(),
        result.num_routes
    );

    if result.truncated {
        warn!("Search stopped at the round limit; the candidate list may be incomplete.");
    }

    if result.candidates.is_empty() {
        println!(
            "No route to purchasable materials found within depth {}.",
            result.depth_limit
        );
    } else {
        print!("{}", format_candidates(&result.candidates));
    }

    if let Some(path) = &args.output {
        write_candidates_file(path, &result.candidates)?;
        println!("✓ Candidates written to: {}", path.display());
    }

    Ok(())
}

fn format_candidates(candidates: &[RankedCandidate]) -> String {
    let mut out = format!(
        "{:>4}  {:>10}  {:>10}  {:>10}  materials\n",
        "rank", "total", "search", "rerank"
    );
    for (i, candidate) in candidates.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:>10.4}  {:>10.4}  {:>10.4}  {}\n",
            i + 1,
            candidate.total_score,
            candidate.score,
            candidate.rerank_score,
            candidate.joined_materials()
        ));
    }
    out
}

fn write_candidates_file(path: &Path, candidates: &[RankedCandidate]) -> Result<()> {
    let file = File::create(path)?;
    write_candidates(file, candidates).map_err(|source| CliError::Report {
        path: path.to_path_buf(),
        source,
    })
}

fn write_candidates<W: Write>(writer: W, candidates: &[RankedCandidate]) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (i, candidate) in candidates.iter().enumerate() {
        let materials = candidate.joined_materials();
        csv_writer.serialize(CandidateRow {
            rank: i + 1,
            total_score: candidate.total_score,
            score: candidate.score,
            rerank_score: candidate.rerank_score,
            materials: &materials,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
