//! Result exports.
//!
//! - a JSON document with run metadata, counters, every leaf, the profiles,
//!   the monitoring histograms and the alpha extrapolation fits
//! - a per-leaf CSV summary that is easy to consume in spreadsheets

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::accum::{AccumulationEngine, GaussianProfile, Hist1D, Hist2D};
use crate::error::AppError;
use crate::fit::ExtrapolationFit;
use crate::process::{Counters, EventRange};

/// Description of the run, stored alongside the results.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub dataset: String,
    pub postfix: String,
    pub is_mc: bool,
    pub alpha_cut: f64,
    pub luminosity: f64,
    pub range: EventRange,
    pub interrupted: bool,
    pub inputs: Vec<PathBuf>,
    /// RFC 3339, UTC.
    pub generated_at: String,
}

#[derive(Debug, Serialize)]
struct LeafRecord<'a> {
    name: &'a str,
    mean: Option<f64>,
    rms: Option<f64>,
    #[serde(flatten)]
    hist: &'a Hist1D,
}

#[derive(Debug, Serialize)]
struct ResultsDocument<'a> {
    metadata: &'a RunMetadata,
    counters: &'a Counters,
    leaves: Vec<LeafRecord<'a>>,
    profiles: &'a [GaussianProfile],
    monitoring: BTreeMap<&'static str, &'a Hist1D>,
    monitoring_2d: BTreeMap<&'static str, &'a Hist2D>,
    extrapolation: &'a [ExtrapolationFit],
}

#[derive(Debug, Serialize)]
struct LeafRow<'a> {
    name: &'a str,
    entries: u64,
    sum_weights: f64,
    mean: Option<f64>,
    rms: Option<f64>,
}

/// Paths of the two output files for an output stem.
pub fn output_paths(dir: &Path, stem: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{stem}.json")),
        dir.join(format!("{stem}_leaves.csv")),
    )
}

/// Write the full JSON results document.
pub fn write_results_json(
    path: &Path,
    metadata: &RunMetadata,
    counters: &Counters,
    engine: &AccumulationEngine,
    fits: &[ExtrapolationFit],
) -> Result<(), AppError> {
    ensure_parent(path)?;
    let named = engine.named_leaves();
    let leaves = named
        .iter()
        .map(|(name, hist)| LeafRecord {
            name,
            mean: hist.mean(),
            rms: hist.rms(),
            hist,
        })
        .collect();
    let doc = ResultsDocument {
        metadata,
        counters,
        leaves,
        profiles: engine.profiles(),
        monitoring: engine.monitors.named().into_iter().collect(),
        monitoring_2d: engine.monitors.named_2d().into_iter().collect(),
        extrapolation: fits,
    };

    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create results '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, &doc)
        .map_err(|e| AppError::output(format!("Failed to write results '{}': {e}", path.display())))?;
    out.flush()
        .map_err(|e| AppError::output(format!("Failed to flush results '{}': {e}", path.display())))
}

/// Write one `name,entries,sum_weights,mean,rms` row per leaf.
pub fn write_leaves_csv(path: &Path, engine: &AccumulationEngine) -> Result<(), AppError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create leaf CSV '{}': {e}", path.display())))?;
    for (name, hist) in engine.named_leaves() {
        writer
            .serialize(LeafRow {
                name: &name,
                entries: hist.entries,
                sum_weights: hist.sum_w,
                mean: hist.mean(),
                rms: hist.rms(),
            })
            .map_err(|e| AppError::output(format!("Failed to write leaf CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush leaf CSV '{}': {e}", path.display())))
}

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).map_err(|e| {
            AppError::output(format!("Failed to create output directory '{}': {e}", dir.display()))
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accum::{Coords, Family, Observable, Slice};
    use crate::binning::Binning;
    use crate::domain::JetType;

    fn engine() -> AccumulationEngine {
        let binning = Binning::from_config(None, JetType::Pf, 0.2).unwrap();
        let mut engine = AccumulationEngine::new(&binning, false);
        engine.fill(
            Family::Response(Observable::Balancing),
            Coords::new(Slice::Central, Some(0)),
            0.9,
            1.0,
        );
        engine
    }

    fn metadata() -> RunMetadata {
        RunMetadata {
            dataset: "Photon_Run2012".into(),
            postfix: "PFlowAK5chs".into(),
            is_mc: false,
            alpha_cut: 0.2,
            luminosity: 0.0,
            range: EventRange::all(1),
            interrupted: false,
            inputs: vec![],
            generated_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn csv_has_one_row_per_leaf() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine();
        let (_, csv_path) = output_paths(dir.path(), "PhotonJet_test_PFlowAK5chs");
        write_leaves_csv(&csv_path, &engine).unwrap();

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), ["name", "entries", "sum_weights", "mean", "rms"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), engine.leaf_count());
        let filled = rows
            .iter()
            .find(|r| &r[0] == "resp_balancing_eta013_ptPhot_40_50")
            .unwrap();
        assert_eq!(&filled[1], "1");
        assert_eq!(&filled[3], "0.9");
    }

    #[test]
    fn json_document_has_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine();
        let (json_path, _) = output_paths(&dir.path().join("out"), "stem");
        write_results_json(&json_path, &metadata(), &Counters::default(), &engine, &[]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        for key in ["metadata", "counters", "leaves", "profiles", "monitoring", "monitoring_2d", "extrapolation"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["leaves"].as_array().unwrap().len(), engine.leaf_count());
        assert!(value["monitoring"].get("deltaPhi_passedID").is_some());
        assert_eq!(value["metadata"]["postfix"], "PFlowAK5chs");
    }
}
