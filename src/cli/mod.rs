//! Command-line parsing for the gamma+jet finalizer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! processing code; `app` turns these structs into run configurations.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{JetAlgo, JetType};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gammajet", version, about = "Photon+jet response finalizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select events, accumulate response distributions and export them.
    Run(RunArgs),
    /// Write a synthetic gamma+jet input directory.
    Generate(GenerateArgs),
}

/// Jet collection selection, shared by both subcommands.
#[derive(Debug, Args, Clone)]
pub struct JetArgs {
    /// Jet reconstruction type.
    #[arg(long = "type", value_enum, default_value_t = JetType::Pf)]
    pub jet_type: JetType,

    /// Jet clustering algorithm.
    #[arg(long, value_enum, default_value_t = JetAlgo::Ak5)]
    pub algo: JetAlgo,

    /// Charged-hadron-subtracted jets.
    #[arg(long)]
    pub chs: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Dataset name, used in output and pileup profile file names.
    #[arg(long)]
    pub dataset: String,

    /// Input directory (repeatable).
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub inputs: Vec<PathBuf>,

    /// File listing input directories, one per line.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    #[command(flatten)]
    pub jets: JetArgs,

    /// Input is simulation.
    #[arg(long)]
    pub mc: bool,

    /// Maximum second-jet to photon pt ratio for the response distributions.
    #[arg(long, default_value_t = 0.2)]
    pub alpha: f64,

    /// Batch job index (0-based), requires --num-jobs.
    #[arg(long, requires = "num_jobs")]
    pub job: Option<usize>,

    /// Number of batch jobs, requires --job.
    #[arg(long, requires = "job")]
    pub num_jobs: Option<usize>,

    /// Disable pileup reweighting of simulation.
    #[arg(long)]
    pub no_pu_reweighting: bool,

    /// External jet-energy correction table (JSON).
    #[arg(long, value_name = "FILE")]
    pub jec: Option<PathBuf>,

    /// Log every skipped event.
    #[arg(short, long)]
    pub verbose: bool,

    /// Trigger mapping (JSON).
    #[arg(long, value_name = "FILE", default_value = "triggers.json")]
    pub triggers: PathBuf,

    /// Binning overrides (JSON).
    #[arg(long, value_name = "FILE")]
    pub binning: Option<PathBuf>,

    /// Directory with pileup profiles [env: GAMMAJET_PU_DIR, default: pileup].
    #[arg(long, value_name = "DIR")]
    pub pu_dir: Option<PathBuf>,

    /// Classify "fired another configured path" separately.
    #[arg(long)]
    pub strict_trigger: bool,

    /// Only keep photons in the unprescaled region (pt >= 165).
    #[arg(long)]
    pub mc_comparison: bool,

    /// Where result files are written.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Output input-directory.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Number of events.
    #[arg(long, default_value_t = 10_000)]
    pub events: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Run number stamped on every event.
    #[arg(long, default_value_t = 200_000)]
    pub run: u32,

    /// Also write simulated-truth streams.
    #[arg(long)]
    pub mc: bool,

    #[command(flatten)]
    pub jets: JetArgs,

    /// Trigger mapping the fired paths follow; a default ladder is written otherwise.
    #[arg(long, value_name = "FILE")]
    pub triggers: Option<PathBuf>,

    /// Mean number of pileup interactions.
    #[arg(long, default_value_t = 20.0)]
    pub pileup: f64,
}
