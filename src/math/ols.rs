//! Weighted least squares.
//!
//! ```text
//! minimize Σ ((y_i - x_i^T β) / σ_i)^2
//! ```
//!
//! Rows are scaled by `1 / σ_i` and the resulting ordinary problem is solved
//! with an SVD, which also copes with tall design matrices.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol)
            && beta.iter().all(|v| v.is_finite())
        {
            return Some(beta);
        }
    }

    None
}

/// Result of a straight-line fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    pub intercept_error: f64,
    pub slope_error: f64,
    pub chi2: f64,
    pub ndf: usize,
}

/// Fit a line through `(x, y ± sigma)`; needs two points with positive sigma.
pub fn weighted_linear_fit(x: &[f64], y: &[f64], sigma: &[f64]) -> Option<LinearFit> {
    let rows: Vec<(f64, f64, f64)> = x
        .iter()
        .zip(y)
        .zip(sigma)
        .map(|((&x, &y), &s)| (x, y, s))
        .filter(|(x, y, s)| x.is_finite() && y.is_finite() && s.is_finite() && *s > 0.0)
        .collect();
    if rows.len() < 2 {
        return None;
    }

    let n = rows.len();
    let design = DMatrix::from_fn(n, 2, |i, j| {
        let (x, _, s) = rows[i];
        if j == 0 { 1.0 / s } else { x / s }
    });
    let rhs = DVector::from_fn(n, |i, _| rows[i].1 / rows[i].2);

    let beta = solve_least_squares(&design, &rhs)?;
    let cov = (design.transpose() * &design).try_inverse()?;

    let chi2 = rows
        .iter()
        .map(|&(x, y, s)| {
            let r = (y - beta[0] - beta[1] * x) / s;
            r * r
        })
        .sum();

    Some(LinearFit {
        intercept: beta[0],
        slope: beta[1],
        intercept_error: cov[(0, 0)].max(0.0).sqrt(),
        slope_error: cov[(1, 1)].max(0.0).sqrt(),
        chi2,
        ndf: n - 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn weighted_line_recovers_exact_points() {
        let fit = weighted_linear_fit(&[0.05, 0.1, 0.15], &[0.98, 0.96, 0.94], &[0.01, 0.02, 0.01]).unwrap();
        assert!((fit.intercept - 1.0).abs() < 1e-10);
        assert!((fit.slope + 0.4).abs() < 1e-10);
        assert!(fit.chi2 < 1e-12);
        assert_eq!(fit.ndf, 1);
        assert!(fit.intercept_error > 0.0);
    }

    #[test]
    fn unweighted_two_point_errors() {
        // Two points, unit sigma: var(intercept) = Σx² / det, det = nΣx² - (Σx)²
        let fit = weighted_linear_fit(&[0.0, 1.0], &[1.0, 2.0], &[1.0, 1.0]).unwrap();
        assert!((fit.intercept_error - 1.0).abs() < 1e-10);
        assert!((fit.slope_error - 2f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn needs_two_usable_points() {
        assert!(weighted_linear_fit(&[0.1, 0.2], &[1.0, 1.0], &[0.0, 0.1]).is_none());
        assert!(weighted_linear_fit(&[0.1], &[1.0], &[0.1]).is_none());
    }
}
