use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "RetroPlan CLI - Multi-step retrosynthesis route planning with beam-decoded single-step predictions, value-guided route search and route reranking.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan synthesis routes for a single target molecule.
    Plan(PlanArgs),
    /// Evaluate route planning against a dataset of reference routes.
    Evaluate(EvaluateArgs),
}

/// Options shared by every command that runs the planner.
#[derive(Args, Debug, Clone, Default)]
pub struct PlannerArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Resource Overrides ---
    /// Override the purchasable stock file (CSV with a `smiles` or `identity_key` column).
    #[arg(long, value_name = "PATH")]
    pub stock: Option<PathBuf>,

    /// Override the single-step reaction table (CSV of product,reactants,probability).
    #[arg(long, value_name = "PATH")]
    pub reactions: Option<PathBuf>,

    /// Override the value model weights (TOML).
    #[arg(long, value_name = "PATH")]
    pub value_model: Option<PathBuf>,

    /// Override the route rerank table (CSV of product,reactants,log_likelihood).
    #[arg(long, value_name = "PATH")]
    pub rerank_table: Option<PathBuf>,

    // --- Search Overrides ---
    /// Override the beam width used for decoding and route search.
    #[arg(short, long, value_name = "INT")]
    pub beam_width: Option<usize>,

    /// Override the logit temperature of the single-step decoder.
    #[arg(short = 'T', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.beam-width=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `plan` subcommand.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// SMILES string of the target molecule.
    #[arg(short, long, required = true, value_name = "SMILES")]
    pub target: String,

    /// Maximum number of backward steps below the target.
    #[arg(short, long, value_name = "INT")]
    pub depth: Option<usize>,

    /// Write the ranked candidates to a CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub planner: PlannerArgs,
}

/// Arguments for the `evaluate` subcommand.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to the JSON dataset of targets and reference routes.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub dataset: PathBuf,

    /// Evaluate a random sample of this many tasks, drawn with the configured seed.
    #[arg(short = 'n', long, value_name = "INT")]
    pub limit: Option<usize>,

    /// Write the hit-rate summary to a CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Write per-task outcomes to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub outcomes: Option<PathBuf>,

    #[command(flatten)]
    pub planner: PlannerArgs,
}
