//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - runs the analysis or the sample generator
//! - prints the summary and writes the result files

use clap::Parser;
use clap::error::ErrorKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GenerateArgs, RunArgs};
use crate::config::{TriggerFile, load_json, resolve_pu_dir};
use crate::data::{GenerateConfig, generate_sample};
use crate::domain::{AnalysisConfig, JetConfig};
use crate::error::{AppError, EXIT_USAGE};

pub mod pipeline;

/// Entry point for the `gammajet` binary.
pub fn run() -> Result<(), AppError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(AppError::new(EXIT_USAGE, err.to_string().trim_end())),
    };

    match cli.command {
        Command::Run(args) => {
            init_tracing(args.verbose);
            handle_run(args)
        }
        Command::Generate(args) => {
            init_tracing(false);
            handle_generate(args)
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` in verbose mode.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(args)?;

    let cancel = crate::cancel::CancellationToken::new();
    cancel.install_ctrlc()?;

    let output = pipeline::run_analysis(&config, &cancel)?;
    println!(
        "{}",
        crate::report::format_run_summary(&output.metadata, &output.counters, &output.fits)
    );

    let (json, csv) = pipeline::write_outputs(&config, &output)?;
    info!(json = %json.display(), csv = %csv.display(), "results written");
    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let triggers = args
        .triggers
        .as_deref()
        .map(load_json::<TriggerFile>)
        .transpose()?;
    let config = GenerateConfig {
        out: args.out,
        events: args.events,
        seed: args.seed,
        run: args.run,
        is_mc: args.mc,
        jets: jet_config(&args.jets),
        triggers,
        mean_pileup: args.pileup,
    };

    let summary = generate_sample(&config)?;
    println!(
        "Wrote {} events ({} with a second jet) to {}",
        summary.events,
        summary.with_second_jet,
        summary.root.display()
    );
    if let Some(path) = &summary.triggers_file {
        println!("Trigger mapping: {}", path.display());
    }
    Ok(())
}

fn jet_config(args: &crate::cli::JetArgs) -> JetConfig {
    JetConfig {
        jet_type: args.jet_type,
        algo: args.algo,
        chs: args.chs,
    }
}

/// Turn `run` flags into a run configuration; inputs from `-i` come first.
pub fn analysis_config_from_args(args: RunArgs) -> Result<AnalysisConfig, AppError> {
    if !(args.alpha.is_finite() && args.alpha > 0.0) {
        return Err(AppError::config("--alpha must be > 0."));
    }

    let mut inputs = args.inputs;
    if let Some(list) = &args.input_list {
        inputs.extend(crate::io::ingest::read_input_list(list)?);
    }

    let batch = match (args.job, args.num_jobs) {
        (Some(job), Some(jobs)) => Some((job, jobs)),
        _ => None,
    };

    Ok(AnalysisConfig {
        dataset: args.dataset,
        inputs,
        jets: jet_config(&args.jets),
        is_mc: args.mc,
        alpha_cut: args.alpha,
        batch,
        pu_reweighting: !args.no_pu_reweighting,
        jec_file: args.jec,
        verbose: args.verbose,
        triggers_file: args.triggers,
        binning_file: args.binning,
        pu_dir: resolve_pu_dir(args.pu_dir),
        strict_trigger: args.strict_trigger,
        mc_comparison: args.mc_comparison,
        output_dir: args.output_dir,
    })
}
