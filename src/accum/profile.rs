//! Response profiles in continuous alpha.
//!
//! One `GaussianProfile` replaces a whole row of extrapolation leaves: it holds
//! one response histogram per alpha bin and is filled with the continuous
//! ratio, so the end-of-run fit can use the mean alpha of each bin rather than
//! its centre.

use serde::Serialize;

use crate::accum::hist::Hist1D;
use crate::binning::BinTable;

/// Per-alpha-bin summary used by the extrapolation fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    /// Weighted mean alpha of the entries in this bin.
    pub alpha: f64,
    pub response: f64,
    pub response_error: f64,
    pub sum_w: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GaussianProfile {
    pub name: String,
    pub alpha_edges: Vec<f64>,
    /// Response distribution per alpha bin.
    pub bins: Vec<Hist1D>,
    /// Weighted alpha moments per bin (`Σw`, `Σw·alpha`).
    alpha_sum_w: Vec<f64>,
    alpha_sum_wx: Vec<f64>,
    #[serde(skip)]
    alpha: BinTable,
}

impl GaussianProfile {
    pub fn new(name: impl Into<String>, alpha: &BinTable, n_bins: usize, y_min: f64, y_max: f64) -> Self {
        let n = alpha.len();
        Self {
            name: name.into(),
            alpha_edges: alpha.edges().to_vec(),
            bins: (0..n).map(|_| Hist1D::new(n_bins, y_min, y_max)).collect(),
            alpha_sum_w: vec![0.0; n],
            alpha_sum_wx: vec![0.0; n],
            alpha: alpha.clone(),
        }
    }

    /// Fill `value` at continuous `alpha`; false when alpha is outside the binning.
    pub fn fill(&mut self, alpha: f64, value: f64, weight: f64) -> bool {
        let Some(bin) = self.alpha.index(alpha) else {
            return false;
        };
        self.bins[bin].fill(value, weight);
        self.alpha_sum_w[bin] += weight;
        self.alpha_sum_wx[bin] += weight * alpha;
        true
    }

    /// Label of alpha bin `i`, e.g. `alpha_0`.
    pub fn bin_label(&self, i: usize) -> String {
        format!("{}_alpha_{i}", self.name)
    }

    pub fn entries(&self) -> u64 {
        self.bins.iter().map(|h| h.entries).sum()
    }

    /// Non-empty bins with a defined mean and error.
    pub fn points(&self) -> Vec<ProfilePoint> {
        self.bins
            .iter()
            .enumerate()
            .filter_map(|(i, h)| {
                let response = h.mean()?;
                let response_error = h.mean_error()?;
                if self.alpha_sum_w[i] == 0.0 {
                    return None;
                }
                Some(ProfilePoint {
                    alpha: self.alpha_sum_wx[i] / self.alpha_sum_w[i],
                    response,
                    response_error,
                    sum_w: h.sum_w,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_by_continuous_alpha() {
        let alpha = BinTable::uniform("alpha", 0.0, 0.05, 4).unwrap();
        let mut p = GaussianProfile::new("extrap_resp_balancing_eta013", &alpha, 50, 0.0, 2.0);
        assert!(p.fill(0.06, 0.9, 1.0));
        assert!(p.fill(0.08, 1.1, 1.0));
        assert!(!p.fill(0.5, 1.0, 1.0));
        assert_eq!(p.entries(), 2);

        let points = p.points();
        assert_eq!(points.len(), 1);
        assert!((points[0].alpha - 0.07).abs() < 1e-12);
        assert!((points[0].response - 1.0).abs() < 1e-12);
        assert_eq!(p.bin_label(1), "extrap_resp_balancing_eta013_alpha_1");
    }
}
