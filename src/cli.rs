use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::{MisalignmentCategory, TestScope};

#[derive(Parser, Debug)]
#[command(
    name = "specbench",
    version,
    about = "Score and aggregate specification-misalignment detection runs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Score(ScoreArgs),
    ScoreAll(ScoreAllArgs),
    Aggregate(AggregateArgs),
    Compare(CompareArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CategoryArg {
    Type1,
    Type2,
    Type3,
    Combined,
}

impl CategoryArg {
    pub fn scope(self) -> TestScope {
        match self {
            Self::Type1 => TestScope::from_category(MisalignmentCategory::MissingImplementation),
            Self::Type2 => TestScope::from_category(MisalignmentCategory::IncorrectImplementation),
            Self::Type3 => TestScope::from_category(MisalignmentCategory::ExtraneousCode),
            Self::Combined => TestScope::CombinedAllTypes,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long)]
    pub prediction: PathBuf,

    #[arg(long)]
    pub ground_truth: PathBuf,

    /// Inferred from the ground truth `test_type` or prediction `analysis_type` when omitted.
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    #[arg(long, default_value = "unknown")]
    pub framework: String,

    #[arg(long)]
    pub branch: Option<String>,

    #[arg(long)]
    pub run: Option<u32>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreAllArgs {
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    #[arg(long, default_value = "benchmark")]
    pub benchmark_dir: PathBuf,

    /// Restrict to these frameworks; all under `raw/` when empty.
    #[arg(long = "framework")]
    pub frameworks: Vec<String>,

    #[arg(long = "branch")]
    pub branches: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AggregateArgs {
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    #[arg(long)]
    pub framework: String,

    #[arg(long)]
    pub branch: String,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    #[arg(long)]
    pub framework_a: String,

    #[arg(long)]
    pub framework_b: String,

    /// Branches to compare; every summarized branch when empty.
    #[arg(long = "branch")]
    pub branches: Vec<String>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}
