//! The per-event selection and accumulation chain.

use tracing::{debug, info, warn};

use crate::accum::{AccumulationEngine, Coords, Family, Observable, Slice};
use crate::binning::{BinIndex, Binning};
use crate::cancel::CancellationToken;
use crate::domain::{Event, JetRecord, JetVariants};
use crate::error::{AppError, ConfigError};
use crate::process::counters::{Counters, SkipReason};
use crate::process::jec::{JetCorrector, JetKinematics};
use crate::process::physics::{delta_phi, mpf, ratio};
use crate::reweight::ReweightCache;
use crate::trigger::{TriggerOutcome, TriggerResolver};

/// Minimum `|dphi(jet, photon)|` for a back-to-back topology.
pub const DELTA_PHI_CUT: f64 = 2.8;
pub const FIRST_JET_MIN_PT: f64 = 12.0;
/// Second jets below this are always soft enough.
pub const SECOND_JET_MIN_PT: f64 = 5.0;
/// Lowest photon `pt` of the unprescaled region; also gates the profile family.
pub const UNPRESCALED_PHOTON_PT: f64 = 165.0;

const PROGRESS_EVERY: usize = 50_000;

const RECO_RESPONSE: [Observable; 5] = [
    Observable::Balancing,
    Observable::BalancingRaw,
    Observable::Mpf,
    Observable::MpfRaw,
    Observable::PtFirstJet,
];
const TRUTH_RESPONSE: [Observable; 3] = [
    Observable::BalancingGen,
    Observable::BalancingRawGen,
    Observable::MpfGen,
];
const RECO_EXTRAP: [Observable; 4] = [
    Observable::Balancing,
    Observable::BalancingRaw,
    Observable::Mpf,
    Observable::MpfRaw,
];
const TRUTH_EXTRAP: [Observable; 6] = [
    Observable::BalancingGen,
    Observable::BalancingRawGen,
    Observable::GenPhot,
    Observable::GenGamma,
    Observable::PhotGamma,
    Observable::MpfGen,
];

/// Per-run switches of the selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorSettings {
    pub is_mc: bool,
    pub alpha_cut: f64,
    pub mc_comparison: bool,
}

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Response families filled.
    Passed,
    /// Binned, but the second jet failed the alpha cut.
    Binned,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Interrupted,
}

/// Every observable for one event, in reco and truth flavours.
#[derive(Debug, Clone, Copy)]
struct Ratios {
    balancing: f64,
    balancing_raw: f64,
    balancing_gen: f64,
    balancing_raw_gen: f64,
    gen_phot: f64,
    gen_gamma: f64,
    phot_gamma: f64,
    mpf: f64,
    mpf_raw: f64,
    mpf_gen: f64,
    pt_first_jet: f64,
}

impl Ratios {
    fn compute(event: &Event, first_jet: &JetRecord) -> Self {
        let photon = &event.photon;
        let gen_photon = &event.gen_photon;
        let raw = &event.first_jet.raw;
        let truth = &event.first_jet.truth;
        Self {
            balancing: ratio(first_jet.pt, photon.pt),
            balancing_raw: ratio(raw.pt, photon.pt),
            balancing_gen: ratio(first_jet.pt, truth.pt),
            balancing_raw_gen: ratio(raw.pt, truth.pt),
            gen_phot: ratio(truth.pt, photon.pt),
            gen_gamma: ratio(truth.pt, gen_photon.pt),
            phot_gamma: ratio(photon.pt, gen_photon.pt),
            mpf: mpf(photon, &event.met.reco),
            mpf_raw: mpf(photon, &event.met.raw),
            mpf_gen: mpf(gen_photon, &event.met.truth),
            pt_first_jet: first_jet.pt,
        }
    }

    fn get(&self, obs: Observable) -> f64 {
        match obs {
            Observable::Balancing => self.balancing,
            Observable::BalancingRaw => self.balancing_raw,
            Observable::BalancingGen => self.balancing_gen,
            Observable::BalancingRawGen => self.balancing_raw_gen,
            Observable::GenPhot => self.gen_phot,
            Observable::GenGamma => self.gen_gamma,
            Observable::PhotGamma => self.phot_gamma,
            Observable::Mpf => self.mpf,
            Observable::MpfRaw => self.mpf_raw,
            Observable::MpfGen => self.mpf_gen,
            Observable::PtFirstJet => self.pt_first_jet,
        }
    }
}

/// Slices an event lands in, plus its primary bin.
#[derive(Debug, Clone, Copy)]
struct Placement {
    pt: BinIndex,
    eta: BinIndex,
    central: bool,
    barrel: bool,
}

impl Placement {
    fn slices(&self) -> impl Iterator<Item = Slice> {
        [
            self.eta.map(Slice::Eta),
            self.central.then_some(Slice::Central),
            self.barrel.then_some(Slice::Barrel),
        ]
        .into_iter()
        .flatten()
    }
}

/// Owns the mutable state of a run and drives events through the gates.
pub struct EventProcessor {
    settings: ProcessorSettings,
    binning: Binning,
    resolver: TriggerResolver,
    reweight: ReweightCache,
    corrector: Option<Box<dyn JetCorrector>>,
    engine: AccumulationEngine,
    counters: Counters,
}

impl EventProcessor {
    pub fn new(
        settings: ProcessorSettings,
        binning: Binning,
        resolver: TriggerResolver,
        reweight: ReweightCache,
        corrector: Option<Box<dyn JetCorrector>>,
    ) -> Self {
        let engine = AccumulationEngine::new(&binning, settings.is_mc);
        Self {
            settings,
            binning,
            resolver,
            reweight,
            corrector,
            engine,
            counters: Counters::default(),
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn engine(&self) -> &AccumulationEngine {
        &self.engine
    }

    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    pub fn into_parts(self) -> (AccumulationEngine, Counters) {
        (self.engine, self.counters)
    }

    /// Process events in order until exhausted or cancelled.
    ///
    /// Input and configuration errors abort the loop; skips never do.
    pub fn run<I>(&mut self, events: I, cancel: &CancellationToken) -> Result<RunStatus, AppError>
    where
        I: IntoIterator<Item = Result<Event, AppError>>,
    {
        for (i, event) in events.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(processed = i, "interrupted, stopping the event loop");
                return Ok(RunStatus::Interrupted);
            }
            let event = event?;
            self.process(&event)?;

            if (i + 1) % PROGRESS_EVERY == 0 {
                info!(
                    processed = i + 1,
                    passed = self.counters.passed,
                    "processing events"
                );
            }
        }
        Ok(RunStatus::Completed)
    }

    /// Run one event through every gate and count its outcome.
    pub fn process(&mut self, event: &Event) -> Result<EventOutcome, ConfigError> {
        self.counters.total += 1;
        let outcome = self.select_and_fill(event)?;
        if let EventOutcome::Skipped(reason) = outcome {
            self.counters.record_skip(reason);
            debug!(run = event.run(), reason = reason.as_str(), "event skipped");
        }
        Ok(outcome)
    }

    fn select_and_fill(&mut self, event: &Event) -> Result<EventOutcome, ConfigError> {
        let is_mc = self.settings.is_mc;
        let photon = event.photon;

        // 1) Objects.
        if !photon.is_present || !event.first_jet.reco.is_present {
            return Ok(EventOutcome::Skipped(SkipReason::MissingObjects));
        }

        // 2) Optional re-correction.
        let first_jet = self.corrected(&event.first_jet, event);
        let second_jet = self.corrected(&event.second_jet, event);

        // 3) Trigger, before any kinematic cut.
        let (trigger, trigger_weight) =
            match self
                .resolver
                .resolve(event.run(), photon.pt, event.fired_paths(), is_mc)
            {
                TriggerOutcome::Ok { name, weight } => (name, weight),
                outcome => {
                    debug!(
                        run = event.run(),
                        photon_pt = photon.pt,
                        fired = ?event.fired_paths().filter(|(_, f)| *f).map(|(n, _)| n).collect::<Vec<_>>(),
                        "no valid trigger"
                    );
                    let reason = match outcome {
                        TriggerOutcome::FoundButOutOfRange => SkipReason::TriggerPtOut,
                        _ => SkipReason::TriggerNotFound,
                    };
                    return Ok(EventOutcome::Skipped(reason));
                }
            };
        self.counters.passed_trigger += 1;

        // 4) Weight.
        let weight = if is_mc {
            let pu = self
                .reweight
                .weight(&trigger, f64::from(event.analysis.ntrue_interactions))?;
            let generator = match event.analysis.generator_weight {
                w if w == 0.0 => 1.0,
                w => w,
            };
            pu * event.analysis.event_weight * generator * trigger_weight
        } else {
            1.0
        };

        // 5) Kinematics.
        let dphi = delta_phi(first_jet.phi, photon.phi).abs();
        if dphi.is_nan() || dphi < DELTA_PHI_CUT {
            return Ok(EventOutcome::Skipped(SkipReason::BackToBack));
        }
        if first_jet.pt < FIRST_JET_MIN_PT {
            return Ok(EventOutcome::Skipped(SkipReason::FirstJetPt));
        }
        if self.settings.mc_comparison && photon.pt < UNPRESCALED_PHOTON_PT {
            return Ok(EventOutcome::Skipped(SkipReason::McComparison));
        }

        // 6) Primary bin.
        let pt_bin = self.binning.pt.index(photon.pt);
        if pt_bin.is_none() {
            return Ok(EventOutcome::Skipped(SkipReason::PtNotCovered));
        }

        // 7) Observables and placement.
        let ratios = Ratios::compute(event, &first_jet);
        let reco = Placement {
            pt: pt_bin,
            eta: self.binning.eta.index(first_jet.eta),
            central: Slice::is_central(first_jet.eta),
            barrel: Slice::is_barrel(first_jet.eta),
        };
        // Truth leaves are binned by the truth objects but the slice gates
        // follow the reco jet.
        let truth_eta = self.binning.eta.index(event.first_jet.truth.eta);
        let truth = Placement {
            pt: self.binning.pt.index(event.gen_photon.pt),
            eta: reco.eta.and(truth_eta),
            central: reco.central,
            barrel: false,
        };

        // 8) Monitoring.
        let monitors = &mut self.engine.monitors;
        let nvertex = f64::from(event.analysis.nvertex);
        let event_weight = if is_mc { event.analysis.event_weight } else { 1.0 };
        monitors.nvertex.fill(nvertex, event_weight);
        monitors.nvertex_reweighted.fill(nvertex, weight);
        monitors.delta_phi.fill(dphi, weight);
        monitors.pt_photon.fill(photon.pt, weight);
        if second_jet.is_present {
            monitors
                .delta_phi_2nd_jet
                .fill(delta_phi(second_jet.phi, photon.phi).abs(), weight);
        }

        // 9) Second-jet extrapolation.
        if second_jet.is_present {
            let alpha = ratio(second_jet.pt, photon.pt);
            let extrap = self.binning.extrap.index(photon.pt, second_jet.pt, pt_bin);
            self.fill_extrapolation(&reco, &RECO_EXTRAP, &ratios, extrap, weight);
            if is_mc && truth_eta.is_some() {
                self.fill_extrapolation(&truth, &TRUTH_EXTRAP, &ratios, extrap, weight);
            }

            if photon.pt >= UNPRESCALED_PHOTON_PT {
                for obs in Observable::PROFILED {
                    for slice in [reco.eta.map(Slice::Eta), reco.central.then_some(Slice::Central)] {
                        self.engine
                            .fill_profile(obs, slice, alpha, ratios.get(obs), weight);
                    }
                }
            }
        }

        // 10) Response, only with a soft enough second jet.
        let second_jet_ok = !second_jet.is_present
            || second_jet.pt < SECOND_JET_MIN_PT
            || second_jet.pt < self.settings.alpha_cut * photon.pt;
        if !second_jet_ok {
            return Ok(EventOutcome::Binned);
        }

        self.fill_response(&reco, &RECO_RESPONSE, &ratios, weight);
        if is_mc {
            self.fill_response(&truth, &TRUTH_RESPONSE, &ratios, weight);
        }

        let passed = &mut self.engine.monitors.passed;
        let met = event.met.reco.et;
        passed.delta_phi.fill(dphi, weight);
        passed.pt_photon.fill(photon.pt, weight);
        passed.pt_first_jet.fill(first_jet.pt, weight);
        passed.pt_second_jet.fill(second_jet.pt, weight);
        passed.met.fill(met, weight);
        passed.raw_met.fill(event.met.raw.et, weight);
        passed.met_vs_first_jet.fill(met, first_jet.pt, weight);
        passed
            .first_jet_vs_second_jet
            .fill(first_jet.pt, second_jet.pt, weight);

        self.counters.passed += 1;
        Ok(EventOutcome::Passed)
    }

    fn fill_response(&mut self, at: &Placement, observables: &[Observable], ratios: &Ratios, weight: f64) {
        for &obs in observables {
            for slice in at.slices() {
                // Families not allocated on a slice are dropped by the engine.
                self.engine
                    .fill(Family::Response(obs), Coords::new(slice, at.pt), ratios.get(obs), weight);
            }
        }
    }

    fn fill_extrapolation(
        &mut self,
        at: &Placement,
        observables: &[Observable],
        ratios: &Ratios,
        extrap: BinIndex,
        weight: f64,
    ) {
        for &obs in observables {
            for slice in at.slices() {
                let coords = Coords::new(slice, at.pt).with_extrap(extrap);
                self.engine
                    .fill(Family::Extrapolation(obs), coords, ratios.get(obs), weight);
            }
        }
    }

    fn corrected(&self, jet: &JetVariants, event: &Event) -> JetRecord {
        let Some(corrector) = &self.corrector else {
            return jet.reco;
        };
        if !jet.reco.is_present {
            return jet.reco;
        }
        let kinematics = JetKinematics {
            raw_pt: jet.raw.pt,
            raw_eta: jet.raw.eta,
            rho: event.misc.rho,
            area: jet.raw.jet_area,
            nvertex: event.analysis.nvertex,
        };
        JetRecord {
            pt: jet.raw.pt * corrector.correction(&kinematics),
            ..jet.reco
        }
    }
}
