//! Control distributions filled alongside the response leaves.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::Serialize;

use crate::accum::hist::{Hist1D, Hist2D};

/// Filled for every event that reaches the binned stage.
#[derive(Debug, Clone, Serialize)]
pub struct Monitors {
    pub nvertex: Hist1D,
    pub nvertex_reweighted: Hist1D,
    pub delta_phi: Hist1D,
    pub delta_phi_2nd_jet: Hist1D,
    pub pt_photon: Hist1D,
    pub passed: PassedMonitors,
}

/// Filled together with the response families.
#[derive(Debug, Clone, Serialize)]
pub struct PassedMonitors {
    pub delta_phi: Hist1D,
    pub pt_photon: Hist1D,
    pub pt_first_jet: Hist1D,
    pub pt_second_jet: Hist1D,
    pub met: Hist1D,
    pub raw_met: Hist1D,
    pub met_vs_first_jet: Hist2D,
    pub first_jet_vs_second_jet: Hist2D,
}

impl Monitors {
    pub fn new() -> Self {
        Self {
            nvertex: Hist1D::new(50, 0.0, 50.0),
            nvertex_reweighted: Hist1D::new(50, 0.0, 50.0),
            delta_phi: Hist1D::new(60, 2.8, PI),
            delta_phi_2nd_jet: Hist1D::new(60, FRAC_PI_2, PI),
            pt_photon: Hist1D::new(200, 5.0, 1000.0),
            passed: PassedMonitors {
                delta_phi: Hist1D::new(60, 2.8, PI),
                pt_photon: Hist1D::new(200, 5.0, 1000.0),
                pt_first_jet: Hist1D::new(200, 5.0, 1000.0),
                pt_second_jet: Hist1D::new(60, 0.0, 100.0),
                met: Hist1D::new(150, 0.0, 300.0),
                raw_met: Hist1D::new(150, 0.0, 300.0),
                met_vs_first_jet: Hist2D::new(150, 0.0, 300.0, 150, 0.0, 500.0),
                first_jet_vs_second_jet: Hist2D::new(60, 5.0, 100.0, 60, 5.0, 100.0),
            },
        }
    }

    /// 1-D distributions under their export names.
    pub fn named(&self) -> Vec<(&'static str, &Hist1D)> {
        vec![
            ("nvertex", &self.nvertex),
            ("nvertex_reweighted", &self.nvertex_reweighted),
            ("deltaPhi", &self.delta_phi),
            ("deltaPhi_2ndjet", &self.delta_phi_2nd_jet),
            ("ptPhoton", &self.pt_photon),
            ("deltaPhi_passedID", &self.passed.delta_phi),
            ("ptPhoton_passedID", &self.passed.pt_photon),
            ("ptFirstJet_passedID", &self.passed.pt_first_jet),
            ("ptSecondJet_passedID", &self.passed.pt_second_jet),
            ("MET_passedID", &self.passed.met),
            ("rawMET_passedID", &self.passed.raw_met),
        ]
    }

    pub fn named_2d(&self) -> Vec<(&'static str, &Hist2D)> {
        vec![
            ("METvsfirstJet", &self.passed.met_vs_first_jet),
            ("firstJetvsSecondJet", &self.passed.first_jet_vs_second_jet),
        ]
    }
}

impl Default for Monitors {
    fn default() -> Self {
        Self::new()
    }
}
