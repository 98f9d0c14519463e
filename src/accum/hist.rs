//! Weighted fixed-binning histograms.
//!
//! Layout mirrors what downstream fitting needs: per-bin sum of weights and
//! sum of squared weights, explicit under/overflow, and in-range weighted
//! moments for mean/RMS without re-binning.

use serde::{Deserialize, Serialize};

/// Uniformly binned, weighted 1-D histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist1D {
    pub n_bins: usize,
    pub x_min: f64,
    pub x_max: f64,
    /// Sum of weights per bin (length `n_bins`).
    pub bin_content: Vec<f64>,
    /// Sum of squared weights per bin.
    pub sumw2: Vec<f64>,
    pub underflow: f64,
    pub overflow: f64,
    /// Every fill, including under/overflow.
    pub entries: u64,
    /// In-range weighted moments.
    pub sum_w: f64,
    pub sum_w2: f64,
    pub sum_wx: f64,
    pub sum_wx2: f64,
}

impl Hist1D {
    pub fn new(n_bins: usize, x_min: f64, x_max: f64) -> Self {
        debug_assert!(n_bins > 0 && x_max > x_min);
        Self {
            n_bins,
            x_min,
            x_max,
            bin_content: vec![0.0; n_bins],
            sumw2: vec![0.0; n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            sum_w: 0.0,
            sum_w2: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
        }
    }

    /// Add `x` with weight `w`. NaN goes to the overflow.
    pub fn fill(&mut self, x: f64, w: f64) {
        self.entries += 1;
        if x < self.x_min {
            self.underflow += w;
            return;
        }
        if !(x < self.x_max) {
            self.overflow += w;
            return;
        }

        let width = (self.x_max - self.x_min) / self.n_bins as f64;
        let bin = (((x - self.x_min) / width) as usize).min(self.n_bins - 1);
        self.bin_content[bin] += w;
        self.sumw2[bin] += w * w;
        self.sum_w += w;
        self.sum_w2 += w * w;
        self.sum_wx += w * x;
        self.sum_wx2 += w * x * x;
    }

    /// Weighted in-range mean, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        (self.sum_w != 0.0).then(|| self.sum_wx / self.sum_w)
    }

    /// Weighted in-range standard deviation.
    pub fn rms(&self) -> Option<f64> {
        let mean = self.mean()?;
        let var = self.sum_wx2 / self.sum_w - mean * mean;
        Some(var.max(0.0).sqrt())
    }

    /// Kish effective number of entries, `(Σw)² / Σw²`.
    pub fn effective_entries(&self) -> f64 {
        if self.sum_w2 > 0.0 {
            self.sum_w * self.sum_w / self.sum_w2
        } else {
            0.0
        }
    }

    /// Uncertainty on the mean, `rms / sqrt(n_eff)`.
    pub fn mean_error(&self) -> Option<f64> {
        let n_eff = self.effective_entries();
        if n_eff <= 0.0 {
            return None;
        }
        Some(self.rms()? / n_eff.sqrt())
    }
}

/// Uniformly binned, weighted 2-D histogram (row-major, `y` fastest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist2D {
    pub nx: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub ny: usize,
    pub y_min: f64,
    pub y_max: f64,
    pub bin_content: Vec<f64>,
    /// Every fill, in range or not.
    pub entries: u64,
    /// Sum of weights outside the grid.
    pub out_of_range: f64,
}

impl Hist2D {
    pub fn new(nx: usize, x_min: f64, x_max: f64, ny: usize, y_min: f64, y_max: f64) -> Self {
        Self {
            nx,
            x_min,
            x_max,
            ny,
            y_min,
            y_max,
            bin_content: vec![0.0; nx * ny],
            entries: 0,
            out_of_range: 0.0,
        }
    }

    pub fn fill(&mut self, x: f64, y: f64, w: f64) {
        self.entries += 1;
        let (Some(ix), Some(iy)) = (
            axis_bin(x, self.x_min, self.x_max, self.nx),
            axis_bin(y, self.y_min, self.y_max, self.ny),
        ) else {
            self.out_of_range += w;
            return;
        };
        self.bin_content[ix * self.ny + iy] += w;
    }

    pub fn content(&self, ix: usize, iy: usize) -> f64 {
        self.bin_content[ix * self.ny + iy]
    }
}

fn axis_bin(v: f64, min: f64, max: f64, n: usize) -> Option<usize> {
    if !(v >= min && v < max) {
        return None;
    }
    let width = (max - min) / n as f64;
    Some((((v - min) / width) as usize).min(n - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_places_weights_in_bins_and_flows() {
        let mut h = Hist1D::new(4, 0.0, 2.0);
        h.fill(0.9, 2.0);
        h.fill(-0.1, 1.0);
        h.fill(2.0, 1.0);
        h.fill(f64::NAN, 1.0);
        assert_eq!(h.bin_content, vec![0.0, 2.0, 0.0, 0.0]);
        assert_eq!(h.sumw2[1], 4.0);
        assert_eq!(h.underflow, 1.0);
        assert_eq!(h.overflow, 2.0);
        assert_eq!(h.entries, 4);
        assert_eq!(h.mean(), Some(0.9));
    }

    #[test]
    fn moments_are_weighted() {
        let mut h = Hist1D::new(10, 0.0, 10.0);
        h.fill(1.0, 1.0);
        h.fill(3.0, 3.0);
        assert!((h.mean().unwrap() - 2.5).abs() < 1e-12);
        // E[x²] = (1 + 27) / 4 = 7, var = 7 - 6.25
        assert!((h.rms().unwrap() - 0.75f64.sqrt()).abs() < 1e-12);
        assert!((h.effective_entries() - 1.6).abs() < 1e-12);
        assert!(Hist1D::new(1, 0.0, 1.0).mean().is_none());
    }

    #[test]
    fn hist2d_row_major_layout() {
        let mut h = Hist2D::new(2, 0.0, 2.0, 3, 0.0, 3.0);
        h.fill(1.5, 2.5, 1.0);
        h.fill(5.0, 0.5, 1.0);
        assert_eq!(h.content(1, 2), 1.0);
        assert_eq!(h.entries, 2);
        assert_eq!(h.out_of_range, 1.0);
    }
}
