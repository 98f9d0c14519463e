//! The `run` workflow as a library call.
//!
//! configuration -> input validation -> event loop -> alpha extrapolation
//!
//! `app` only adds argument handling, signal wiring and printing on top.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::accum::AccumulationEngine;
use crate::binning::Binning;
use crate::cancel::CancellationToken;
use crate::config::{BinningFile, JecFile, TriggerFile, load_json};
use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::fit::{ExtrapolationFit, extrapolate_all};
use crate::io::export::{RunMetadata, output_paths, write_leaves_csv, write_results_json};
use crate::io::ingest::validate_inputs;
use crate::io::source::EventSource;
use crate::process::{
    Counters, EtaTableCorrector, EventProcessor, EventRange, JetCorrector, ProcessorSettings,
    RunStatus,
};
use crate::reweight::{CsvProfileSource, ReweightCache};
use crate::trigger::{ResolutionPolicy, TriggerMap, TriggerResolver};

/// Everything a finished (or interrupted) run produced.
pub struct RunOutput {
    pub metadata: RunMetadata,
    pub counters: Counters,
    pub engine: AccumulationEngine,
    pub fits: Vec<ExtrapolationFit>,
}

/// Execute one analysis run. Nothing is written to disk here.
pub fn run_analysis(config: &AnalysisConfig, cancel: &CancellationToken) -> Result<RunOutput, AppError> {
    // 1) Configuration resources. All of them load before the first event.
    let trigger_file: TriggerFile = load_json(&config.triggers_file)?;
    let policy = if config.strict_trigger {
        ResolutionPolicy::Strict
    } else {
        ResolutionPolicy::Baseline
    };
    let resolver = TriggerResolver::new(TriggerMap::from_file(&trigger_file)?, policy);

    let binning_file = config
        .binning_file
        .as_deref()
        .map(load_json::<BinningFile>)
        .transpose()?;
    let binning = Binning::from_config(binning_file.as_ref(), config.jets.jet_type, config.alpha_cut)?;

    let corrector = match &config.jec_file {
        Some(path) => {
            let file: JecFile = load_json(path)?;
            info!(path = %path.display(), "jet energy re-correction enabled");
            Some(Box::new(EtaTableCorrector::from_file(&file)?) as Box<dyn JetCorrector>)
        }
        None => None,
    };

    // 2) Inputs.
    if config.inputs.is_empty() {
        return Err(AppError::config("No inputs given (use -i or --input-list)."));
    }
    let postfix = config.jets.postfix();
    let (valid, rejected) = validate_inputs(&config.inputs, &postfix);
    for bad in &rejected {
        error!(input = %bad.root.display(), "excluding input: {}", bad.message);
    }
    if valid.is_empty() {
        return Err(AppError::config("No valid inputs remain after validation."));
    }
    let source = EventSource::new(valid);
    info!(
        inputs = source.inputs().len(),
        excluded = rejected.len(),
        events = source.len(),
        "inputs validated"
    );

    // 3) Event range.
    let range = match config.batch {
        Some((job, jobs)) => EventRange::for_job(source.len(), job, jobs)?,
        None => EventRange::all(source.len()),
    };
    info!(from = range.from, to = range.to, "processing event range");

    // 4) Event loop.
    let reweight = if config.is_mc && config.pu_reweighting {
        ReweightCache::new(
            true,
            Box::new(CsvProfileSource::new(&config.pu_dir, &config.dataset)),
        )
    } else {
        ReweightCache::disabled()
    };
    info!(pileup_reweighting = reweight.is_enabled(), "event loop starting");
    let settings = ProcessorSettings {
        is_mc: config.is_mc,
        alpha_cut: config.alpha_cut,
        mc_comparison: config.mc_comparison,
    };
    let mut processor = EventProcessor::new(settings, binning, resolver, reweight, corrector);
    let status = processor.run(source.events(range), cancel)?;
    if status == RunStatus::Interrupted {
        warn!("run interrupted, results cover the events processed so far");
    }
    let (engine, counters) = processor.into_parts();

    // 5) Alpha extrapolation.
    let fits = extrapolate_all(engine.profiles());

    let metadata = RunMetadata {
        dataset: config.dataset.clone(),
        postfix,
        is_mc: config.is_mc,
        alpha_cut: config.alpha_cut,
        luminosity: source.luminosity(),
        range,
        interrupted: status == RunStatus::Interrupted,
        inputs: source
            .inputs()
            .iter()
            .map(|i| i.layout.root().to_path_buf())
            .collect(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    };

    Ok(RunOutput {
        metadata,
        counters,
        engine,
        fits,
    })
}

/// Write the JSON document and the leaf CSV; returns their paths.
pub fn write_outputs(config: &AnalysisConfig, output: &RunOutput) -> Result<(PathBuf, PathBuf), AppError> {
    let (json, csv) = output_paths(&config.output_dir, &config.output_stem());
    write_results_json(
        &json,
        &output.metadata,
        &output.counters,
        &output.engine,
        &output.fits,
    )?;
    write_leaves_csv(&csv, &output.engine)?;
    Ok((json, csv))
}
