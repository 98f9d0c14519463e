//! The four analysis axes.
//!
//! - photon `pt` (primary quantity)
//! - leading-jet `|eta|`
//! - extrapolation ratio `pt(2nd jet) / pt(photon)`, one table per `pt` bin
//! - alpha, the same ratio on a single fixed table (profile family)

use crate::binning::table::{BinIndex, BinTable};
use crate::config::BinningFile;
use crate::domain::JetType;
use crate::error::ConfigError;

pub const DEFAULT_PT_EDGES: [f64; 16] = [
    40.0, 50.0, 60.0, 85.0, 100.0, 130.0, 175.0, 250.0, 300.0, 350.0, 400.0, 500.0, 700.0, 1000.0,
    1500.0, 2000.0,
];

pub const DEFAULT_ETA_EDGES: [f64; 8] = [0.0, 0.5, 1.1, 1.7, 2.3, 2.8, 3.2, 5.0];

const DEFAULT_EXTRAP_BINS: usize = 6;
const DEFAULT_ALPHA_WIDTH: f64 = 0.05;

/// Photon transverse-momentum binning.
#[derive(Debug, Clone)]
pub struct PtBinning {
    table: BinTable,
}

impl PtBinning {
    pub fn new(edges: Vec<f64>) -> Result<Self, ConfigError> {
        Ok(Self {
            table: BinTable::new("pt", edges)?,
        })
    }

    pub fn index(&self, pt: f64) -> BinIndex {
        self.table.index(pt)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn bounds(&self, i: usize) -> (f64, f64) {
        self.table.bounds(i)
    }

    /// `ptPhot_40_50`
    pub fn label(&self, i: usize) -> String {
        let (lo, hi) = self.table.bounds(i);
        format!("ptPhot_{}_{}", lo as i64, hi as i64)
    }
}

/// Leading-jet pseudorapidity binning, over `|eta|`.
#[derive(Debug, Clone)]
pub struct EtaBinning {
    table: BinTable,
}

impl EtaBinning {
    pub fn new(edges: Vec<f64>) -> Result<Self, ConfigError> {
        if edges.first().is_some_and(|&e| e < 0.0) {
            return Err(ConfigError::Binning {
                axis: "eta",
                reason: "edges are over |eta| and must start at or above 0".to_string(),
            });
        }
        Ok(Self {
            table: BinTable::new("eta", edges)?,
        })
    }

    pub fn index(&self, eta: f64) -> BinIndex {
        self.table.index(eta.abs())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// `eta0005`, `eta0511`, ...
    pub fn label(&self, i: usize) -> String {
        let (lo, hi) = self.table.bounds(i);
        format!(
            "eta{:02}{:02}",
            (lo * 10.0).round() as i64,
            (hi * 10.0).round() as i64
        )
    }
}

/// Second-jet extrapolation binning, conditional on the photon `pt` bin.
#[derive(Debug, Clone)]
pub struct ExtrapBinning {
    per_pt_bin: Vec<BinTable>,
}

impl ExtrapBinning {
    /// One table per photon `pt` bin; every table must have the same bin count.
    pub fn new(per_pt_bin: Vec<BinTable>) -> Result<Self, ConfigError> {
        let Some(first) = per_pt_bin.first() else {
            return Err(ConfigError::Binning {
                axis: "extrapolation",
                reason: "no per-pt-bin tables".to_string(),
            });
        };
        let n = first.len();
        if let Some(pos) = per_pt_bin.iter().position(|t| t.len() != n) {
            return Err(ConfigError::Binning {
                axis: "extrapolation",
                reason: format!(
                    "pt bin {pos} has {} bins, expected {n}",
                    per_pt_bin[pos].len()
                ),
            });
        }
        Ok(Self { per_pt_bin })
    }

    /// The same uniform table for every `pt` bin.
    pub fn uniform(pt_bins: usize, step: f64, n: usize) -> Result<Self, ConfigError> {
        let table = BinTable::uniform("extrapolation", 0.0, step, n)?;
        Self::new(vec![table; pt_bins])
    }

    /// Default binning for a jet type: finer steps for particle-flow jets.
    pub fn for_jet_type(jet_type: JetType, pt_bins: usize) -> Result<Self, ConfigError> {
        let step = match jet_type {
            JetType::Pf => 0.05,
            JetType::Calo => 0.1,
        };
        Self::uniform(pt_bins, step, DEFAULT_EXTRAP_BINS)
    }

    /// Number of extrapolation bins (identical for every `pt` bin).
    pub fn len(&self) -> usize {
        self.per_pt_bin[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pt_bins(&self) -> usize {
        self.per_pt_bin.len()
    }

    /// Bin of `second_pt / photon_pt` within the table of `pt_bin`.
    pub fn index(&self, photon_pt: f64, second_pt: f64, pt_bin: BinIndex) -> BinIndex {
        let table = self.per_pt_bin.get(pt_bin?)?;
        if photon_pt <= 0.0 {
            return None;
        }
        table.index(second_pt / photon_pt)
    }
}

/// Fixed alpha binning used by the profile family.
#[derive(Debug, Clone)]
pub struct AlphaBinning {
    table: BinTable,
}

impl AlphaBinning {
    /// Bins of `width` from 0 up to the alpha cut (at least one bin).
    pub fn new(alpha_cut: f64, width: f64) -> Result<Self, ConfigError> {
        if !(alpha_cut.is_finite() && alpha_cut > 0.0) {
            return Err(ConfigError::Binning {
                axis: "alpha",
                reason: format!("alpha cut must be > 0, got {alpha_cut}"),
            });
        }
        let n = ((alpha_cut / width).round() as usize).max(1);
        Ok(Self {
            table: BinTable::uniform("alpha", 0.0, width, n)?,
        })
    }

    pub fn index(&self, alpha: f64) -> BinIndex {
        self.table.index(alpha)
    }

    pub fn table(&self) -> &BinTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// All axes, built once at start-up.
#[derive(Debug, Clone)]
pub struct Binning {
    pub pt: PtBinning,
    pub eta: EtaBinning,
    pub extrap: ExtrapBinning,
    pub alpha: AlphaBinning,
}

impl Binning {
    /// Defaults for `jet_type`, overridden by whatever the binning file sets.
    pub fn from_config(
        file: Option<&BinningFile>,
        jet_type: JetType,
        alpha_cut: f64,
    ) -> Result<Self, ConfigError> {
        let pt_edges = file
            .and_then(|f| f.pt.clone())
            .unwrap_or_else(|| DEFAULT_PT_EDGES.to_vec());
        let eta_edges = file
            .and_then(|f| f.eta.clone())
            .unwrap_or_else(|| DEFAULT_ETA_EDGES.to_vec());
        let pt = PtBinning::new(pt_edges)?;
        let eta = EtaBinning::new(eta_edges)?;

        let extrap = match file.and_then(|f| f.extrapolation.as_ref()) {
            Some(tables) => {
                if tables.len() != pt.len() {
                    return Err(ConfigError::Binning {
                        axis: "extrapolation",
                        reason: format!(
                            "{} per-pt-bin tables for {} pt bins",
                            tables.len(),
                            pt.len()
                        ),
                    });
                }
                let tables = tables
                    .iter()
                    .map(|edges| BinTable::new("extrapolation", edges.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                ExtrapBinning::new(tables)?
            }
            None => ExtrapBinning::for_jet_type(jet_type, pt.len())?,
        };

        let alpha_width = file
            .and_then(|f| f.alpha_width)
            .unwrap_or(DEFAULT_ALPHA_WIDTH);
        let alpha = AlphaBinning::new(alpha_cut, alpha_width)?;

        Ok(Self {
            pt,
            eta,
            extrap,
            alpha,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pt_labels_use_integer_edges() {
        let pt = PtBinning::new(DEFAULT_PT_EDGES.to_vec()).unwrap();
        assert_eq!(pt.label(0), "ptPhot_40_50");
        assert_eq!(pt.index(200.0), Some(6));
        assert_eq!(pt.index(39.9), None);
        assert_eq!(pt.index(2000.0), None);
    }

    #[test]
    fn eta_uses_absolute_value() {
        let eta = EtaBinning::new(DEFAULT_ETA_EDGES.to_vec()).unwrap();
        assert_eq!(eta.index(0.3), Some(0));
        assert_eq!(eta.index(-0.3), Some(0));
        assert_eq!(eta.index(-1.2), Some(2));
        assert_eq!(eta.index(5.0), None);
        assert_eq!(eta.label(0), "eta0005");
        assert_eq!(eta.label(1), "eta0511");
    }

    #[test]
    fn extrapolation_depends_on_pt_bin() {
        let tables = vec![
            BinTable::new("extrapolation", vec![0.0, 0.1, 0.2]).unwrap(),
            BinTable::new("extrapolation", vec![0.0, 0.05, 0.3]).unwrap(),
        ];
        let extrap = ExtrapBinning::new(tables).unwrap();
        assert_eq!(extrap.index(100.0, 8.0, Some(0)), Some(0));
        assert_eq!(extrap.index(100.0, 8.0, Some(1)), Some(1));
        assert_eq!(extrap.index(100.0, 8.0, None), None);
        assert_eq!(extrap.index(100.0, 8.0, Some(5)), None);
        assert_eq!(extrap.index(100.0, 40.0, Some(0)), None);
    }

    #[test]
    fn extrapolation_tables_must_agree_in_size() {
        let tables = vec![
            BinTable::new("extrapolation", vec![0.0, 0.1, 0.2]).unwrap(),
            BinTable::new("extrapolation", vec![0.0, 0.3]).unwrap(),
        ];
        assert!(ExtrapBinning::new(tables).is_err());
    }

    #[test]
    fn alpha_binning_covers_the_cut() {
        let alpha = AlphaBinning::new(0.2, 0.05).unwrap();
        assert_eq!(alpha.len(), 4);
        assert_eq!(alpha.index(0.19), Some(3));
        assert_eq!(alpha.index(0.21), None);
    }

    #[test]
    fn binning_file_overrides_defaults() {
        let file = BinningFile {
            pt: Some(vec![100.0, 200.0, 300.0]),
            eta: None,
            extrapolation: None,
            alpha_width: Some(0.1),
        };
        let binning = Binning::from_config(Some(&file), JetType::Calo, 0.3).unwrap();
        assert_eq!(binning.pt.len(), 2);
        assert_eq!(binning.extrap.pt_bins(), 2);
        assert_eq!(binning.alpha.len(), 3);
        assert_eq!(binning.eta.len(), DEFAULT_ETA_EDGES.len() - 1);
    }

    #[test]
    fn extrapolation_override_must_match_pt_bins() {
        let file = BinningFile {
            pt: Some(vec![100.0, 200.0, 300.0]),
            eta: None,
            extrapolation: Some(vec![vec![0.0, 0.1]]),
            alpha_width: None,
        };
        assert!(Binning::from_config(Some(&file), JetType::Pf, 0.2).is_err());
    }
}
