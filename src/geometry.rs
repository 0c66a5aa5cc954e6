//! # Mars solar geometry
//!
//! Seasonal and illumination angles used as alternative horizontal axes for the
//! binning stage: the areocentric solar longitude `Ls` and the solar zenith
//! angle at the occultation tangent point.
//!
//! ## Overview
//! -----------------
//! * [`solar_longitude`] – Allison & McEwen (2000) series for `Ls`, evaluated on
//!   the TT scale (the time argument is days since J2000.0 TT).
//! * [`subsolar_declination`] – Planetographic declination of the Sun for a given `Ls`.
//! * [`solar_zenith_angle`] – Zenith angle from latitude, local solar time and `Ls`.
//!
//! All inputs and outputs are in **degrees**, local solar time in **hours**.
//!
//! ## References
//! ------------
//! * Allison, M. & McEwen, M. (2000), *A post-Pathfinder evaluation of areocentric
//!   solar coordinates with improved timing recipes for Mars seasonal/diurnal
//!   climate studies*, Planet. Space Sci. 48, 215–235.
use hifitime::Epoch;

use crate::constants::{Degree, Hour, DEG_PER_HOUR, MARS_OBLIQUITY, RADEG};
use crate::time::days_since_j2000_tt;

/// Amplitudes (deg), periods (Julian years) and phases (deg) of the planetary perturbations.
const PBS_A: [f64; 7] = [0.0071, 0.0057, 0.0039, 0.0037, 0.0021, 0.0020, 0.0018];
const PBS_TAU: [f64; 7] = [2.2353, 2.7543, 1.1177, 15.7866, 2.1354, 2.4694, 32.8493];
const PBS_PHI: [f64; 7] = [49.409, 168.173, 191.837, 21.736, 15.704, 95.528, 49.095];

/// Areocentric solar longitude `Ls` of Mars at a given epoch.
///
/// Arguments
/// -----------------
/// * `epoch`: Time of the observation (any time scale, converted to TT internally).
///
/// Return
/// ----------
/// * `Ls` in degrees, in `[0, 360)`.
pub fn solar_longitude(epoch: &Epoch) -> Degree {
    let dt = days_since_j2000_tt(epoch);

    let mean_anomaly = (19.3871 + 0.524_020_73 * dt) * RADEG;
    let alpha_fms = 270.3871 + 0.524_038_496 * dt;

    let pbs: f64 = PBS_A
        .iter()
        .zip(PBS_TAU.iter())
        .zip(PBS_PHI.iter())
        .map(|((a, tau), phi)| a * ((0.985_626 * dt / tau + phi) * RADEG).cos())
        .sum();

    // equation of center
    let nu_minus_m = (10.691 + 3.0e-7 * dt) * mean_anomaly.sin()
        + 0.623 * (2.0 * mean_anomaly).sin()
        + 0.050 * (3.0 * mean_anomaly).sin()
        + 0.005 * (4.0 * mean_anomaly).sin()
        + 0.0005 * (5.0 * mean_anomaly).sin()
        + pbs;

    (alpha_fms + nu_minus_m).rem_euclid(360.0)
}

/// Planetographic declination of the Sun, in degrees.
pub fn subsolar_declination(ls: Degree) -> Degree {
    let sin_ls = (ls * RADEG).sin();
    ((MARS_OBLIQUITY * RADEG).sin() * sin_ls).asin() / RADEG + 0.25 * sin_ls
}

/// Solar zenith angle at a point of the Martian surface.
///
/// Arguments
/// -----------------
/// * `lat`: Planetographic latitude of the point (deg).
/// * `lst`: Local solar time (hours, noon = 12).
/// * `ls`: Solar longitude (deg).
///
/// Return
/// ----------
/// * Zenith angle in degrees, in `[0, 180]`. `NaN` if any input is `NaN`.
///
/// See also
/// ------------
/// * [`subsolar_declination`] – Declination term of the spherical cosine law.
pub fn solar_zenith_angle(lat: Degree, lst: Hour, ls: Degree) -> Degree {
    let dec = subsolar_declination(ls) * RADEG;
    let phi = lat * RADEG;
    let hour_angle = (lst - 12.0) * DEG_PER_HOUR * RADEG;

    let cos_z = dec.sin() * phi.sin() + dec.cos() * phi.cos() * hour_angle.cos();
    cos_z.clamp(-1.0, 1.0).acos() / RADEG
}
