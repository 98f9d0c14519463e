//! Kinematic helpers.

use std::f64::consts::PI;

use crate::domain::{MetRecord, PhotonRecord};

/// `phi1 - phi2` folded into `[-pi, pi)`; NaN for non-finite input.
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    (phi1 - phi2 + PI).rem_euclid(2.0 * PI) - PI
}

/// Missing-transverse-energy projection fraction.
///
/// `1 + MET * pt * cos(dphi(photon, MET)) / pt^2`.
pub fn mpf(photon: &PhotonRecord, met: &MetRecord) -> f64 {
    if photon.pt <= 0.0 {
        return f64::NAN;
    }
    let dphi = delta_phi(photon.phi, met.phi);
    1.0 + met.et * photon.pt * dphi.cos() / (photon.pt * photon.pt)
}

/// `num / den`, NaN when `den` is not positive.
pub fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { f64::NAN }
}
