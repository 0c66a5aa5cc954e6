//! # Static stability
//!
//! Squared Brunt–Väisälä (buoyancy) frequency of a temperature profile:
//!
//! ```text
//! N² = (g / T) · (dT/dz + g / cp)
//! ```
//!
//! with Mars surface gravity and the heat capacity of CO₂ as defaults.
//!
//! ## Vertical derivative
//! -----------------
//! `dT/dz` is evaluated on the (possibly non-uniform) height grid with a
//! second-order centred difference at interior points
//!
//! ```text
//! hs = z[i] - z[i-1],  hd = z[i+1] - z[i]
//! dT/dz[i] = (hs² T[i+1] + (hd² - hs²) T[i] - hd² T[i-1]) / (hs · hd · (hs + hd))
//! ```
//!
//! and first-order one-sided differences at both ends.
use crate::constants::{Kelvin, Meter, CO2_CP, MARS_GRAVITY};
use crate::euvm_errors::EuvmError;

/// Physical constants of the stability transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityParams {
    /// Gravitational acceleration (m s⁻²)
    pub gravity: f64,
    /// Specific heat at constant pressure (J kg⁻¹ K⁻¹)
    pub cp: f64,
}

impl Default for StabilityParams {
    fn default() -> Self {
        StabilityParams {
            gravity: MARS_GRAVITY,
            cp: CO2_CP,
        }
    }
}

impl StabilityParams {
    /// Dry adiabatic lapse rate `g / cp` (K m⁻¹).
    pub fn adiabatic_lapse_rate(&self) -> f64 {
        self.gravity / self.cp
    }
}

/// Derivative of `values` with respect to `coords` on a non-uniform grid.
///
/// Both slices must have the same length (checked by the caller). Fewer than
/// two points yields `NaN` everywhere.
pub fn gradient(values: &[f64], coords: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![f64::NAN; n];
    }

    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / (coords[1] - coords[0]));

    for i in 1..n - 1 {
        let hs = coords[i] - coords[i - 1];
        let hd = coords[i + 1] - coords[i];
        let num = hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i] - hd * hd * values[i - 1];
        out.push(num / (hs * hd * (hs + hd)));
    }

    out.push((values[n - 1] - values[n - 2]) / (coords[n - 1] - coords[n - 2]));
    out
}

/// Squared buoyancy frequency along a profile.
///
/// Arguments
/// -----------------
/// * `heights`: Heights of the samples in **meters**, in profile order.
/// * `temps`: Temperatures (K) at those heights.
/// * `params`: Gravity and heat capacity.
///
/// Return
/// ----------
/// * `N²` in s⁻², aligned with the inputs. All `NaN` for fewer than two points.
/// * [`EuvmError::LengthMismatch`] if the slices differ in length.
///
/// See also
/// ------------
/// * [`gradient`] – Finite-difference scheme used for `dT/dz`.
pub fn buoyancy_frequency_squared(
    heights: &[Meter],
    temps: &[Kelvin],
    params: &StabilityParams,
) -> Result<Vec<f64>, EuvmError> {
    if heights.len() != temps.len() {
        return Err(EuvmError::LengthMismatch {
            left: heights.len(),
            right: temps.len(),
        });
    }

    let lapse = params.adiabatic_lapse_rate();
    Ok(gradient(temps, heights)
        .into_iter()
        .zip(temps)
        .map(|(dtdz, t)| params.gravity / t * (dtdz + lapse))
        .collect())
}
