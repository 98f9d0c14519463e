//! External jet-energy correction.

use crate::binning::BinTable;
use crate::config::JecFile;
use crate::error::ConfigError;

/// Inputs a correction may depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetKinematics {
    pub raw_pt: f64,
    pub raw_eta: f64,
    pub rho: f64,
    pub area: f64,
    pub nvertex: u32,
}

/// Multiplicative correction applied to a raw jet `pt`.
pub trait JetCorrector {
    fn correction(&self, jet: &JetKinematics) -> f64;
}

/// Pileup offset subtraction followed by an `|eta|`-binned scale.
#[derive(Debug, Clone)]
pub struct EtaTableCorrector {
    eta: BinTable,
    scale: Vec<f64>,
    offset_per_rho_area: f64,
}

impl EtaTableCorrector {
    pub fn from_file(file: &JecFile) -> Result<Self, ConfigError> {
        let eta = BinTable::new("jec eta", file.eta_edges.clone())?;
        if file.scale.len() != eta.len() {
            return Err(ConfigError::Invalid(format!(
                "jet correction table has {} scale factors for {} eta bins",
                file.scale.len(),
                eta.len()
            )));
        }
        if file.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(ConfigError::Invalid(
                "jet correction scale factors must be positive".to_string(),
            ));
        }
        Ok(Self {
            eta,
            scale: file.scale.clone(),
            offset_per_rho_area: file.offset_per_rho_area,
        })
    }
}

impl JetCorrector for EtaTableCorrector {
    fn correction(&self, jet: &JetKinematics) -> f64 {
        let Some(bin) = self.eta.index(jet.raw_eta.abs()) else {
            return 1.0;
        };
        if jet.raw_pt <= 0.0 {
            return 1.0;
        }
        let offset = self.offset_per_rho_area * jet.rho * jet.area / jet.raw_pt;
        (1.0 - offset).max(0.0) * self.scale[bin]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrector() -> EtaTableCorrector {
        EtaTableCorrector::from_file(&JecFile {
            eta_edges: vec![0.0, 1.3, 3.0],
            scale: vec![1.1, 1.2],
            offset_per_rho_area: 1.0,
        })
        .unwrap()
    }

    fn jet(raw_pt: f64, raw_eta: f64) -> JetKinematics {
        JetKinematics { raw_pt, raw_eta, rho: 10.0, area: 0.5, nvertex: 10 }
    }

    #[test]
    fn subtracts_offset_then_scales() {
        let c = corrector();
        // 1 - 10*0.5/100 = 0.95
        assert!((c.correction(&jet(100.0, -0.5)) - 0.95 * 1.1).abs() < 1e-12);
        assert!((c.correction(&jet(100.0, 2.0)) - 0.95 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn outside_table_is_identity() {
        assert_eq!(corrector().correction(&jet(100.0, 4.0)), 1.0);
    }

    #[test]
    fn large_offset_clamps_to_zero() {
        assert_eq!(corrector().correction(&jet(2.0, 0.1)), 0.0);
    }

    #[test]
    fn mismatched_table_is_rejected() {
        let file = JecFile { eta_edges: vec![0.0, 1.0], scale: vec![1.0, 1.0], offset_per_rho_area: 0.0 };
        assert!(EtaTableCorrector::from_file(&file).is_err());
    }
}
