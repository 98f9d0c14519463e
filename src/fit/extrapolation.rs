//! Response at vanishing second-jet activity.
//!
//! Each profile holds the mean response per alpha bin. A weighted straight line
//! through those means, evaluated at alpha = 0, estimates the response free of
//! additional radiation.

use serde::Serialize;

use crate::accum::GaussianProfile;
use crate::math::weighted_linear_fit;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtrapolationFit {
    pub name: String,
    pub points: usize,
    /// Response extrapolated to alpha = 0.
    pub response: f64,
    pub response_error: f64,
    pub slope: f64,
    pub slope_error: f64,
    pub chi2: f64,
    pub ndf: usize,
}

/// Fit one profile; `None` when fewer than two alpha bins are usable.
pub fn extrapolate(profile: &GaussianProfile) -> Option<ExtrapolationFit> {
    let points = profile.points();
    let alpha: Vec<f64> = points.iter().map(|p| p.alpha).collect();
    let response: Vec<f64> = points.iter().map(|p| p.response).collect();
    let sigma: Vec<f64> = points.iter().map(|p| p.response_error).collect();

    let fit = weighted_linear_fit(&alpha, &response, &sigma)?;
    Some(ExtrapolationFit {
        name: profile.name.clone(),
        points: fit.ndf + 2,
        response: fit.intercept,
        response_error: fit.intercept_error,
        slope: fit.slope,
        slope_error: fit.slope_error,
        chi2: fit.chi2,
        ndf: fit.ndf,
    })
}

/// Fit every profile that has enough populated bins.
pub fn extrapolate_all(profiles: &[GaussianProfile]) -> Vec<ExtrapolationFit> {
    let fits: Vec<ExtrapolationFit> = profiles.iter().filter_map(extrapolate).collect();
    tracing::debug!(
        profiles = profiles.len(),
        fitted = fits.len(),
        "alpha extrapolation done"
    );
    fits
}
