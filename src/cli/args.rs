use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReferenceArg {
    /// Fixed built-in reference per dimension
    Prior,
    /// Reference derived from the two codebases, anchored by the prior mean
    Batch,
}

impl ReferenceArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceArg::Prior => "prior",
            ReferenceArg::Batch => "batch",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "codebench")]
#[command(about = "Statistically fair quality comparison of two codebases", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two codebases across every quality dimension
    Compare {
        /// First codebase (A)
        a: PathBuf,

        /// Second codebase (B)
        b: PathBuf,

        /// Dimension weights as a JSON object, e.g. '{"security": 2.0}'
        #[arg(long)]
        weights: Option<String>,

        /// Dimensions to leave out (comma-separated)
        #[arg(long, value_delimiter = ',')]
        skip: Vec<String>,

        /// Write the full report as JSON to this file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Confidence coefficient for score intervals
        #[arg(long = "confidence")]
        confidence: Option<f64>,

        /// Per-plugin timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,

        /// Worker threads (0 = one per CPU)
        #[arg(short = 'j', long, env = "CODEBENCH_JOBS")]
        jobs: Option<usize>,

        /// Reference distribution used for standardization
        #[arg(long, value_enum)]
        reference: Option<ReferenceArg>,

        /// Config file (defaults to the nearest .codebench.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// History database
        #[arg(long, env = "CODEBENCH_STORE", conflicts_with = "no_store")]
        store: Option<PathBuf>,

        /// Do not persist the report
        #[arg(long)]
        no_store: bool,
    },

    /// List stored comparison runs
    History {
        /// Only runs involving this codebase id (its absolute path)
        #[arg(long)]
        codebase: Option<String>,

        /// Show at most this many of the newest runs
        #[arg(long, default_value = "20")]
        limit: usize,

        /// History database
        #[arg(long, env = "CODEBENCH_STORE")]
        store: Option<PathBuf>,
    },

    /// List the dimensions that can be measured
    Plugins {
        /// Config file whose external tools should be included
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
