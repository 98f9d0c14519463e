//! Synthetic gamma+jet samples.
//!
//! Produces one input directory in the layout the event source reads, with a
//! toy detector: a falling photon spectrum, a back-to-back leading jet with a
//! gaussian response, an optional soft second jet and a MET vector that
//! balances the visible objects. Fired paths follow a trigger ladder so the
//! sample passes trigger resolution for the configured ranges.

use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::config::{MatcherKind, PathEntry, RunRangeEntry, TriggerFile};
use crate::domain::{
    AnalysisRecord, JetConfig, JetRecord, MetRecord, MiscRecord, PhotonRecord,
};
use crate::error::AppError;
use crate::io::layout::*;
use crate::io::stream::JsonLinesWriter;

/// Lower edge of the generated photon spectrum.
const PT_MIN: f64 = 40.0;
const PT_MAX: f64 = 1500.0;
/// Power-law index of the photon spectrum, `dN/dpt ~ pt^-SPECTRUM_INDEX`.
const SPECTRUM_INDEX: f64 = 4.0;
const PHOTON_MAX_ETA: f64 = 1.4442;
const JET_MAX_ETA: f64 = 4.7;
const SECOND_JET_PROB: f64 = 0.6;
const TRIGGER_EFFICIENCY: f64 = 0.97;
const RAW_SCALE: f64 = 0.8;
const JET_AREA: f64 = 0.5;
/// Luminosity recorded per generated data event, in 1/pb.
const LUMI_PER_EVENT: f64 = 1e-3;

/// Default trigger ladder: `(threshold, pt_min, pt_max)`.
const DEFAULT_LADDER: [(u32, f64, Option<f64>); 5] = [
    (30, 40.0, Some(60.0)),
    (50, 60.0, Some(85.0)),
    (75, 85.0, Some(100.0)),
    (90, 100.0, Some(150.0)),
    (135, 150.0, None),
];

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub out: PathBuf,
    pub events: usize,
    pub seed: u64,
    pub run: u32,
    pub is_mc: bool,
    pub jets: JetConfig,
    /// Trigger mapping the fired paths follow; the default ladder otherwise.
    pub triggers: Option<TriggerFile>,
    pub mean_pileup: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateSummary {
    pub root: PathBuf,
    pub events: usize,
    pub with_second_jet: usize,
    /// Where the trigger mapping used by the sample was written, if generated.
    pub triggers_file: Option<PathBuf>,
}

/// Trigger mapping matching the default ladder for `run`.
pub fn default_triggers(run: u32) -> TriggerFile {
    TriggerFile {
        matcher: MatcherKind::Regex,
        runs: vec![RunRangeEntry {
            first: run,
            last: run,
            paths: DEFAULT_LADDER
                .iter()
                .map(|&(threshold, pt_min, pt_max)| PathEntry {
                    name: format!("HLT_Photon{threshold}_CaloIdVL_IsoL_v.*"),
                    pt_min,
                    pt_max,
                    weight: 1.0,
                })
                .collect(),
        }],
    }
}

/// A concrete path name for a configured pattern (`..._v.*` -> `..._v3`).
pub fn concrete_path_name(pattern: &str, matcher: MatcherKind) -> String {
    match matcher {
        MatcherKind::Exact => pattern.to_string(),
        MatcherKind::Regex | MatcherKind::Wildcard => {
            let stem = pattern
                .strip_suffix(".*")
                .or_else(|| pattern.strip_suffix('*'))
                .unwrap_or(pattern);
            let stem: String = stem.chars().filter(|c| !"^$\\?".contains(*c)).collect();
            if stem.ends_with("_v") { format!("{stem}3") } else { stem }
        }
    }
}

struct Writers {
    analysis: JsonLinesWriter<AnalysisRecord>,
    photon: JsonLinesWriter<PhotonRecord>,
    photon_gen: Option<JsonLinesWriter<PhotonRecord>>,
    first_jet: JsonLinesWriter<JetRecord>,
    first_jet_raw: JsonLinesWriter<JetRecord>,
    first_jet_gen: Option<JsonLinesWriter<JetRecord>>,
    second_jet: JsonLinesWriter<JetRecord>,
    second_jet_raw: JsonLinesWriter<JetRecord>,
    second_jet_gen: Option<JsonLinesWriter<JetRecord>>,
    met: JsonLinesWriter<MetRecord>,
    met_raw: JsonLinesWriter<MetRecord>,
    met_gen: Option<JsonLinesWriter<MetRecord>>,
    misc: JsonLinesWriter<MiscRecord>,
}

impl Writers {
    fn create(layout: &InputLayout, is_mc: bool) -> Result<Self, AppError> {
        fn truth<T: serde::Serialize>(
            layout: &InputLayout,
            name: &str,
            is_mc: bool,
        ) -> Result<Option<JsonLinesWriter<T>>, AppError> {
            is_mc
                .then(|| JsonLinesWriter::create(&layout.stream(name)))
                .transpose()
        }
        Ok(Self {
            analysis: JsonLinesWriter::create(&layout.stream(ANALYSIS))?,
            photon: JsonLinesWriter::create(&layout.stream(PHOTON))?,
            photon_gen: truth(layout, PHOTON_GEN, is_mc)?,
            first_jet: JsonLinesWriter::create(&layout.stream(FIRST_JET))?,
            first_jet_raw: JsonLinesWriter::create(&layout.stream(FIRST_JET_RAW))?,
            first_jet_gen: truth(layout, FIRST_JET_GEN, is_mc)?,
            second_jet: JsonLinesWriter::create(&layout.stream(SECOND_JET))?,
            second_jet_raw: JsonLinesWriter::create(&layout.stream(SECOND_JET_RAW))?,
            second_jet_gen: truth(layout, SECOND_JET_GEN, is_mc)?,
            met: JsonLinesWriter::create(&layout.stream(MET))?,
            met_raw: JsonLinesWriter::create(&layout.stream(MET_RAW))?,
            met_gen: truth(layout, MET_GEN, is_mc)?,
            misc: JsonLinesWriter::create(&layout.stream(MISC))?,
        })
    }

    fn finish(self) -> Result<(), AppError> {
        self.analysis.finish()?;
        self.photon.finish()?;
        self.first_jet.finish()?;
        self.first_jet_raw.finish()?;
        self.second_jet.finish()?;
        self.second_jet_raw.finish()?;
        self.met.finish()?;
        self.met_raw.finish()?;
        self.misc.finish()?;
        if let Some(w) = self.photon_gen {
            w.finish()?;
        }
        for w in [self.first_jet_gen, self.second_jet_gen].into_iter().flatten() {
            w.finish()?;
        }
        if let Some(w) = self.met_gen {
            w.finish()?;
        }
        Ok(())
    }
}

/// One generated event, all variants.
struct Generated {
    analysis: AnalysisRecord,
    photon: PhotonRecord,
    gen_photon: PhotonRecord,
    first_jet: [JetRecord; 3],
    second_jet: [JetRecord; 3],
    met: [MetRecord; 3],
    misc: MiscRecord,
}

pub fn generate_sample(config: &GenerateConfig) -> Result<GenerateSummary, AppError> {
    if config.events == 0 {
        return Err(AppError::config("Event count must be > 0."));
    }
    if !(config.mean_pileup.is_finite() && config.mean_pileup > 0.0) {
        return Err(AppError::config("Mean pileup must be > 0."));
    }

    let layout = InputLayout::new(&config.out, config.jets.postfix());
    fs::create_dir_all(layout.jet_dir()).map_err(|e| {
        AppError::output(format!("Failed to create '{}': {e}", layout.jet_dir().display()))
    })?;

    let (triggers, triggers_file) = match &config.triggers {
        Some(t) => (t.clone(), None),
        None => {
            let t = default_triggers(config.run);
            let path = config.out.join("triggers.json");
            write_json(&path, &t)?;
            (t, Some(path))
        }
    };
    let ladder: Vec<(String, f64)> = triggers
        .runs
        .iter()
        .filter(|r| (r.first..=r.last).contains(&config.run))
        .take(1)
        .flat_map(|r| r.paths.iter())
        .map(|p| (concrete_path_name(&p.name, triggers.matcher), p.pt_min))
        .collect();
    if ladder.is_empty() {
        tracing::warn!(run = config.run, "no trigger paths configured for the generated run");
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;

    let mut writers = Writers::create(&layout, config.is_mc)?;
    let mut with_second_jet = 0;
    for _ in 0..config.events {
        let ev = generate_event(&mut rng, &noise, config, &ladder);
        if ev.second_jet[0].is_present {
            with_second_jet += 1;
        }
        write_event(&mut writers, &ev)?;
    }
    writers.finish()?;

    let meta = if config.is_mc {
        serde_json::json!({})
    } else {
        serde_json::json!({ "total_luminosity": config.events as f64 * LUMI_PER_EVENT })
    };
    write_json(&layout.meta(), &meta)?;

    tracing::info!(
        root = %config.out.display(),
        events = config.events,
        mc = config.is_mc,
        "generated synthetic sample"
    );
    Ok(GenerateSummary {
        root: config.out.clone(),
        events: config.events,
        with_second_jet,
        triggers_file,
    })
}

fn generate_event(
    rng: &mut StdRng,
    noise: &Normal<f64>,
    config: &GenerateConfig,
    ladder: &[(String, f64)],
) -> Generated {
    // 1) Truth photon from a falling spectrum (inverse-CDF of a power law).
    let u: f64 = rng.gen_range(0.0..1.0);
    let gen_pt = (PT_MIN * (1.0 - u).powf(-1.0 / (SPECTRUM_INDEX - 1.0))).min(PT_MAX);
    let gen_eta = rng.gen_range(-PHOTON_MAX_ETA..PHOTON_MAX_ETA);
    let gen_phi = rng.gen_range(-PI..PI);
    let gen_photon = PhotonRecord { is_present: true, pt: gen_pt, eta: gen_eta, phi: gen_phi };
    let photon = PhotonRecord {
        pt: gen_pt * (1.0 + 0.01 * noise.sample(rng)),
        ..gen_photon
    };

    // 2) Optional second jet, then a leading jet recoiling against the rest.
    let has_second = rng.gen_range(0.0..1.0) < SECOND_JET_PROB;
    let second_truth = if has_second {
        JetRecord {
            is_present: true,
            pt: gen_pt * rng.gen_range(0.02..0.4),
            eta: (1.5 * noise.sample(rng)).clamp(-JET_MAX_ETA, JET_MAX_ETA),
            phi: rng.gen_range(-PI..PI),
            jet_area: JET_AREA,
        }
    } else {
        JetRecord::default()
    };
    let (sx, sy) = components(second_truth.pt, second_truth.phi);
    let (px, py) = components(gen_pt, gen_phi);
    let (jx, jy) = (-px - sx, -py - sy);
    let first_truth = JetRecord {
        is_present: true,
        pt: jx.hypot(jy),
        eta: (1.5 * noise.sample(rng)).clamp(-JET_MAX_ETA, JET_MAX_ETA),
        phi: jy.atan2(jx),
        jet_area: JET_AREA,
    };

    let first_response = 0.95 + 0.1 * noise.sample(rng);
    let second_response = 0.9 + 0.15 * noise.sample(rng);
    let first = detector_jet(&first_truth, first_response);
    let second = detector_jet(&second_truth, second_response);

    // 3) MET from the visible imbalance.
    let met_truth = MetRecord { et: 2.0 * noise.sample(rng).abs(), phi: rng.gen_range(-PI..PI) };
    let met = visible_met(&photon, &[&first[0], &second[0]]);
    let met_raw = visible_met(&photon, &[&first[1], &second[1]]);

    // 4) Pileup and triggers.
    let n_true = (config.mean_pileup + 3.0 * noise.sample(rng)).max(0.0);
    let nvertex = (n_true * 0.7 + noise.sample(rng)).round().max(1.0) as u32;
    let (trigger_names, trigger_results) = ladder
        .iter()
        .map(|(name, pt_min)| {
            let fired = photon.pt >= *pt_min && rng.gen_range(0.0..1.0) < TRIGGER_EFFICIENCY;
            (name.clone(), fired)
        })
        .unzip();

    let (event_weight, generator_weight) = if config.is_mc { (1.0 / config.events as f64, 1.0) } else { (1.0, 1.0) };
    Generated {
        analysis: AnalysisRecord {
            run: config.run,
            nvertex,
            ntrue_interactions: n_true as f32,
            event_weight,
            generator_weight,
            trigger_names,
            trigger_results,
        },
        photon,
        gen_photon,
        first_jet: [first[0], first[1], first_truth],
        second_jet: [second[0], second[1], second_truth],
        met: [met, met_raw, met_truth],
        misc: MiscRecord { rho: (n_true * 0.5).max(0.0) },
    }
}

fn components(pt: f64, phi: f64) -> (f64, f64) {
    (pt * phi.cos(), pt * phi.sin())
}

/// `[corrected, raw]` detector jets for a truth jet.
fn detector_jet(truth: &JetRecord, response: f64) -> [JetRecord; 2] {
    if !truth.is_present {
        return [JetRecord::default(); 2];
    }
    let reco = JetRecord { pt: truth.pt * response.max(0.05), ..*truth };
    let raw = JetRecord { pt: reco.pt * RAW_SCALE, ..reco };
    [reco, raw]
}

fn visible_met(photon: &PhotonRecord, jets: &[&JetRecord]) -> MetRecord {
    let (mut x, mut y) = components(photon.pt, photon.phi);
    for jet in jets.iter().filter(|j| j.is_present) {
        let (jx, jy) = components(jet.pt, jet.phi);
        x += jx;
        y += jy;
    }
    MetRecord { et: x.hypot(y), phi: (-y).atan2(-x) }
}

fn write_event(w: &mut Writers, ev: &Generated) -> Result<(), AppError> {
    w.analysis.write(&ev.analysis)?;
    w.photon.write(&ev.photon)?;
    w.first_jet.write(&ev.first_jet[0])?;
    w.first_jet_raw.write(&ev.first_jet[1])?;
    w.second_jet.write(&ev.second_jet[0])?;
    w.second_jet_raw.write(&ev.second_jet[1])?;
    w.met.write(&ev.met[0])?;
    w.met_raw.write(&ev.met[1])?;
    w.misc.write(&ev.misc)?;
    if let Some(s) = &mut w.photon_gen {
        s.write(&ev.gen_photon)?;
    }
    if let Some(s) = &mut w.first_jet_gen {
        s.write(&ev.first_jet[2])?;
    }
    if let Some(s) = &mut w.second_jet_gen {
        s.write(&ev.second_jet[2])?;
    }
    if let Some(s) = &mut w.met_gen {
        s.write(&ev.met[2])?;
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::output(format!("Failed to encode '{}': {e}", path.display())))?;
    fs::write(path, text).map_err(|e| AppError::output(format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JetAlgo, JetType};
    use crate::io::stream::count_records;
    use crate::io::{EventSource, validate_inputs};
    use crate::process::EventRange;

    fn config(out: &Path, is_mc: bool) -> GenerateConfig {
        GenerateConfig {
            out: out.to_path_buf(),
            events: 200,
            seed: 7,
            run: 200_000,
            is_mc,
            jets: JetConfig { jet_type: JetType::Pf, algo: JetAlgo::Ak5, chs: true },
            triggers: None,
            mean_pileup: 20.0,
        }
    }

    #[test]
    fn concrete_names_match_their_patterns() {
        assert_eq!(
            concrete_path_name("HLT_Photon30_CaloIdVL_v.*", MatcherKind::Regex),
            "HLT_Photon30_CaloIdVL_v3"
        );
        assert_eq!(concrete_path_name("HLT_Photon30_v*", MatcherKind::Wildcard), "HLT_Photon30_v3");
        assert_eq!(concrete_path_name("HLT_Photon30", MatcherKind::Exact), "HLT_Photon30");
    }

    #[test]
    fn data_sample_validates_without_truth() {
        let dir = tempfile::tempdir().unwrap();
        let summary = generate_sample(&config(dir.path(), false)).unwrap();
        assert_eq!(summary.events, 200);
        assert!(summary.triggers_file.is_some());

        let (ok, errors) = validate_inputs(&[dir.path().to_path_buf()], "PFlowAK5chs");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(ok[0].entries, 200);
        assert!(!ok[0].has_truth(PHOTON_GEN));
        assert!((ok[0].luminosity.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn generated_events_are_back_to_back() {
        let dir = tempfile::tempdir().unwrap();
        generate_sample(&config(dir.path(), true)).unwrap();
        let layout = InputLayout::new(dir.path(), "PFlowAK5chs");
        assert_eq!(count_records(&layout.stream(MET_GEN)).unwrap(), 200);

        let (ok, _) = validate_inputs(&[dir.path().to_path_buf()], "PFlowAK5chs");
        let source = EventSource::new(ok);
        for event in source.events(EventRange::all(source.len())) {
            let event = event.unwrap();
            assert!(event.photon.pt >= PT_MIN * 0.9);
            assert!(event.gen_photon.is_present);
            if !event.second_jet.reco.is_present {
                let dphi = crate::process::delta_phi(event.first_jet.truth.phi, event.gen_photon.phi);
                assert!((dphi.abs() - PI).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn same_seed_same_sample() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        generate_sample(&config(a.path(), false)).unwrap();
        generate_sample(&config(b.path(), false)).unwrap();
        let read = |root: &Path| fs::read_to_string(InputLayout::new(root, "PFlowAK5chs").stream(PHOTON)).unwrap();
        assert_eq!(read(a.path()), read(b.path()));
    }
}
