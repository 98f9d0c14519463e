//! Shared domain types.
//!
//! The stream record types are serializable so the same structs are used to:
//!
//! - read JSON-lines input streams
//! - write synthetic samples (`gammajet generate`)
//! - build in-memory events in tests

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Jet reconstruction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JetType {
    Pf,
    Calo,
}

impl JetType {
    pub fn label(self) -> &'static str {
        match self {
            JetType::Pf => "PFlow",
            JetType::Calo => "Calo",
        }
    }
}

/// Jet clustering algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JetAlgo {
    Ak5,
    Ak7,
}

impl JetAlgo {
    pub fn label(self) -> &'static str {
        match self {
            JetAlgo::Ak5 => "AK5",
            JetAlgo::Ak7 => "AK7",
        }
    }
}

/// Jet configuration: names the per-jet stream directory and the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JetConfig {
    pub jet_type: JetType,
    pub algo: JetAlgo,
    /// Charged-hadron subtraction (pileup-subtracted PF jets).
    pub chs: bool,
}

impl JetConfig {
    /// `PFlowAK5chs`, `CaloAK7`, ...
    pub fn postfix(&self) -> String {
        let mut postfix = format!("{}{}", self.jet_type.label(), self.algo.label());
        if self.chs {
            postfix.push_str("chs");
        }
        postfix
    }
}

/// Event-level record (`analysis.jsonl`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub run: u32,
    #[serde(default)]
    pub nvertex: u32,
    /// Simulated number of true pileup interactions.
    #[serde(default)]
    pub ntrue_interactions: f32,
    /// Cross-section weight of the simulated sample.
    #[serde(default = "unit_weight")]
    pub event_weight: f64,
    #[serde(default = "unit_weight")]
    pub generator_weight: f64,
    #[serde(default)]
    pub trigger_names: Vec<String>,
    #[serde(default)]
    pub trigger_results: Vec<bool>,
}

fn unit_weight() -> f64 {
    1.0
}

/// Photon record (`photon.jsonl`, `photon_gen.jsonl`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotonRecord {
    #[serde(default)]
    pub is_present: bool,
    #[serde(default)]
    pub pt: f64,
    #[serde(default)]
    pub eta: f64,
    #[serde(default)]
    pub phi: f64,
}

/// Jet record (`first_jet*.jsonl`, `second_jet*.jsonl`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JetRecord {
    #[serde(default)]
    pub is_present: bool,
    #[serde(default)]
    pub pt: f64,
    #[serde(default)]
    pub eta: f64,
    #[serde(default)]
    pub phi: f64,
    #[serde(default)]
    pub jet_area: f64,
}

/// Missing transverse energy record (`met*.jsonl`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetRecord {
    #[serde(default)]
    pub et: f64,
    #[serde(default)]
    pub phi: f64,
}

/// Miscellaneous per-event inputs (`misc.jsonl`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MiscRecord {
    /// Median energy density, used by the external jet corrector.
    #[serde(default)]
    pub rho: f64,
}

/// Corrected, raw and simulated-truth variants of one jet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JetVariants {
    pub reco: JetRecord,
    pub raw: JetRecord,
    pub truth: JetRecord,
}

/// Corrected, raw and simulated-truth missing transverse energy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetVariants {
    pub reco: MetRecord,
    pub raw: MetRecord,
    pub truth: MetRecord,
}

/// One collision, assembled from every stream at the same index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub analysis: AnalysisRecord,
    pub photon: PhotonRecord,
    pub gen_photon: PhotonRecord,
    pub first_jet: JetVariants,
    pub second_jet: JetVariants,
    pub met: MetVariants,
    pub misc: MiscRecord,
}

impl Event {
    pub fn run(&self) -> u32 {
        self.analysis.run
    }

    /// Fired-path list as `(name, fired)` pairs, in stored order.
    pub fn fired_paths(&self) -> impl DoubleEndedIterator<Item = (&str, bool)> + Clone + '_ {
        self.analysis
            .trigger_names
            .iter()
            .zip(self.analysis.trigger_results.iter())
            .map(|(name, fired)| (name.as_str(), *fired))
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub dataset: String,
    pub inputs: Vec<PathBuf>,
    pub jets: JetConfig,
    pub is_mc: bool,
    /// Maximum `pt(second jet) / pt(photon)` for the response distributions.
    pub alpha_cut: f64,
    /// `(job, total jobs)` when running as one part of a batch.
    pub batch: Option<(usize, usize)>,
    pub pu_reweighting: bool,
    pub jec_file: Option<PathBuf>,
    pub verbose: bool,
    pub triggers_file: PathBuf,
    pub binning_file: Option<PathBuf>,
    pub pu_dir: PathBuf,
    pub strict_trigger: bool,
    /// Drop photons below the lowest unprescaled trigger threshold.
    pub mc_comparison: bool,
    pub output_dir: PathBuf,
}

impl AnalysisConfig {
    /// `PhotonJet_<dataset>_<postfix>` plus `_partNN` in batch mode.
    pub fn output_stem(&self) -> String {
        let base = format!("PhotonJet_{}_{}", self.dataset, self.jets.postfix());
        match self.batch {
            Some((job, _)) => format!("{base}_part{job:02}"),
            None => base,
        }
    }
}
