//! Half-open bin tables.

use crate::error::ConfigError;

/// Position of a value along one axis; `None` means "not covered".
pub type BinIndex = Option<usize>;

/// Ordered, contiguous half-open intervals `[e0, e1), [e1, e2), ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinTable {
    edges: Vec<f64>,
}

impl BinTable {
    /// Build a table from its edges (`n + 1` edges for `n` bins).
    ///
    /// Edges must be finite and strictly increasing.
    pub fn new(axis: &'static str, edges: Vec<f64>) -> Result<Self, ConfigError> {
        if edges.len() < 2 {
            return Err(ConfigError::Binning {
                axis,
                reason: format!("need at least two edges, got {}", edges.len()),
            });
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(ConfigError::Binning {
                axis,
                reason: format!("non-finite edge {bad}"),
            });
        }
        if let Some(w) = edges.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ConfigError::Binning {
                axis,
                reason: format!("edges must be strictly increasing ({} then {})", w[0], w[1]),
            });
        }
        Ok(Self { edges })
    }

    /// `n` bins of equal `width` starting at `start`.
    pub fn uniform(axis: &'static str, start: f64, width: f64, n: usize) -> Result<Self, ConfigError> {
        if !(width.is_finite() && width > 0.0) || n == 0 {
            return Err(ConfigError::Binning {
                axis,
                reason: format!("uniform binning needs width > 0 and n > 0 (width={width}, n={n})"),
            });
        }
        Self::new(axis, (0..=n).map(|i| start + width * i as f64).collect())
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// `(lo, hi)` of bin `i`.
    pub fn bounds(&self, i: usize) -> (f64, f64) {
        (self.edges[i], self.edges[i + 1])
    }

    pub fn lower(&self) -> f64 {
        self.edges[0]
    }

    pub fn upper(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Index of the interval containing `value`.
    ///
    /// Below the first edge, at or above the last edge, and NaN are not covered.
    pub fn index(&self, value: f64) -> BinIndex {
        if !(value >= self.lower() && value < self.upper()) {
            return None;
        }
        // First edge strictly greater than `value`, minus one.
        let upper = self.edges.partition_point(|&e| e <= value);
        Some(upper - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> BinTable {
        BinTable::new("test", vec![0.0, 1.0, 2.5, 4.0]).unwrap()
    }

    #[test]
    fn interior_values_map_to_their_interval() {
        let t = table();
        assert_eq!(t.index(0.5), Some(0));
        assert_eq!(t.index(1.7), Some(1));
        assert_eq!(t.index(3.99), Some(2));
    }

    #[test]
    fn edges_are_half_open() {
        let t = table();
        assert_eq!(t.index(0.0), Some(0));
        assert_eq!(t.index(1.0), Some(1));
        assert_eq!(t.index(2.5), Some(2));
        assert_eq!(t.index(4.0), None);
    }

    #[test]
    fn outside_values_are_not_covered() {
        let t = table();
        assert_eq!(t.index(-0.001), None);
        assert_eq!(t.index(10.0), None);
        assert_eq!(t.index(f64::NAN), None);
    }

    #[test]
    fn rejects_degenerate_tables() {
        assert!(BinTable::new("test", vec![]).is_err());
        assert!(BinTable::new("test", vec![1.0]).is_err());
        assert!(BinTable::new("test", vec![0.0, 1.0, 1.0]).is_err());
        assert!(BinTable::new("test", vec![0.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn uniform_tables_have_requested_width() {
        let t = BinTable::uniform("test", 0.0, 0.05, 6).unwrap();
        assert_eq!(t.len(), 6);
        assert!((t.upper() - 0.3).abs() < 1e-12);
        assert_eq!(t.index(0.26), Some(5));
    }
}
