use std::cmp::Ordering::Greater;

use crate::constants::{DEFAULT_ALT_STEP_KM, DEFAULT_PRESSURE_BINS, DEFAULT_XBINS};
use crate::euvm_errors::EuvmError;
use crate::stability::StabilityParams;

use super::{edge_count, HorizontalAxis, OrbitRange, VerticalBinning};

/// Configuration of one aggregation run.
///
/// Fields
/// -----------------
/// * `x_axis`: Horizontal coordinate, binned over its fixed domain.
/// * `x_bins`: Number of horizontal bins (≥ 1).
/// * `vertical`: Vertical coordinate and edge policy, an altitude **step** or a pressure bin **count**.
/// * `orbit_range`: Open orbit window, `(700, 1000)` by default.
/// * `stability`: Constants of the N² transform applied to the bins.
///
/// Invariants (enforced by [`BinningParamsBuilder::build`])
/// -----------------
/// * `x_bins ≥ 1`, `step_km > 0` and finite, pressure `bins ≥ 1`.
/// * `gravity > 0`, `cp > 0`.
///
/// See also
/// -----------------
/// * [`crate::binning::aggregate::BinnedAggregate::compute`] – Consumer of these parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BinningParams {
    pub x_axis: HorizontalAxis,
    pub x_bins: usize,
    pub vertical: VerticalBinning,
    pub orbit_range: OrbitRange,
    pub stability: StabilityParams,
}

impl BinningParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`BinningParamsBuilder`] starting from the defaults
    /// (longitude, 10 bins, 5 km altitude steps, orbits 700–1000).
    ///
    /// # Example
    ///
    /// ```rust
    /// use euvmt::binning::{BinningParams, HorizontalAxis, VerticalBinning};
    ///
    /// let params = BinningParams::builder()
    ///     .x_axis(HorizontalAxis::LocalSolarTime)
    ///     .x_bins(12)
    ///     .pressure_bins(40)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.vertical, VerticalBinning::Pressure { bins: 40 });
    /// ```
    pub fn builder() -> BinningParamsBuilder {
        BinningParamsBuilder::new()
    }
}

impl Default for BinningParams {
    fn default() -> Self {
        BinningParams {
            x_axis: HorizontalAxis::Longitude,
            x_bins: DEFAULT_XBINS,
            vertical: VerticalBinning::Altitude {
                step_km: DEFAULT_ALT_STEP_KM,
            },
            orbit_range: OrbitRange::default(),
            stability: StabilityParams::default(),
        }
    }
}

/// Builder for [`BinningParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct BinningParamsBuilder {
    params: BinningParams,
}

impl BinningParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: BinningParams::default(),
        }
    }

    pub fn x_axis(mut self, v: HorizontalAxis) -> Self {
        self.params.x_axis = v;
        self
    }
    pub fn x_bins(mut self, v: usize) -> Self {
        self.params.x_bins = v;
        self
    }
    pub fn vertical(mut self, v: VerticalBinning) -> Self {
        self.params.vertical = v;
        self
    }
    /// Bin altitude in steps of `step_km`.
    pub fn altitude_step(mut self, step_km: f64) -> Self {
        self.params.vertical = VerticalBinning::Altitude { step_km };
        self
    }
    /// Bin pressure in `bins` geometric intervals.
    pub fn pressure_bins(mut self, bins: usize) -> Self {
        self.params.vertical = VerticalBinning::Pressure { bins };
        self
    }
    /// Use the default number of pressure bins.
    pub fn pressure(self) -> Self {
        self.pressure_bins(DEFAULT_PRESSURE_BINS)
    }
    pub fn orbit_range(mut self, v: OrbitRange) -> Self {
        self.params.orbit_range = v;
        self
    }
    pub fn stability(mut self, v: StabilityParams) -> Self {
        self.params.stability = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Validate and return the parameters.
    pub fn build(self) -> Result<BinningParams, EuvmError> {
        let p = &self.params;

        if p.x_bins == 0 {
            return Err(EuvmError::InvalidBinningParameter(
                "x_bins must be >= 1".into(),
            ));
        }
        edge_count(p.x_bins)?;

        match p.vertical {
            VerticalBinning::Altitude { step_km } => {
                if !(Self::gt0(step_km) && step_km.is_finite()) {
                    return Err(EuvmError::InvalidBinningParameter(
                        "altitude step must be a finite value > 0".into(),
                    ));
                }
            }
            VerticalBinning::Pressure { bins } => {
                if bins == 0 {
                    return Err(EuvmError::InvalidBinningParameter(
                        "pressure bins must be >= 1".into(),
                    ));
                }
                edge_count(bins)?;
            }
        }

        if !Self::gt0(p.stability.gravity) || !Self::gt0(p.stability.cp) {
            return Err(EuvmError::InvalidBinningParameter(
                "gravity and cp must be > 0".into(),
            ));
        }

        Ok(self.params)
    }
}
