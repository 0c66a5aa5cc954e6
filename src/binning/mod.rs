//! # Binning
//!
//! Geographic/vertical binning of the combined EUVM table.
//!
//! ## Overview
//! -----------------
//! Observations are located by a **horizontal** coordinate (one of
//! [`HorizontalAxis`]) and a **vertical** coordinate (altitude or pressure,
//! see [`VerticalBinning`]). Each axis is split by a set of [`BinEdges`]:
//!
//! * horizontal edges are equally spaced over a fixed domain
//!   (`linspace(lo, hi, xbins + 1)`),
//! * altitude edges step by a fixed size from the lowest to the highest observed
//!   altitude (`arange(min, max, step)`, the top value itself is excluded),
//! * pressure edges are geometrically spaced between the lowest and highest
//!   observed pressure (`geomspace(min, max, bins + 1)`).
//!
//! Intervals are **right-closed**, `(e[i], e[i + 1]]`: a value equal to the
//! first edge, below it or above the last edge has no bin.
//!
//! ## Modules
//! -----------------
//! * [`params`] – [`BinningParams`](params::BinningParams) and its validating builder.
//! * [`aggregate`] – Single-pass per-bin statistics and their derived products.
//! * *(private)* `display` – Tabular rendering of a [`BinnedAggregate`](aggregate::BinnedAggregate).
use std::{fmt, str::FromStr};

use crate::constants::{DEFAULT_ORBIT_MAX, DEFAULT_ORBIT_MIN};
use crate::euvm_errors::EuvmError;
use crate::observations::Observation;

pub mod aggregate;
mod display;
pub mod params;

pub use aggregate::{BinField, BinKey, BinStats, BinnedAggregate, ProfilePoint, VerticalProfile};
pub use params::{BinningParams, BinningParamsBuilder};

/// Horizontal coordinate used for binning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizontalAxis {
    Longitude,
    LocalSolarTime,
    Latitude,
    SolarLongitude,
    SolarZenithAngle,
}

impl HorizontalAxis {
    pub const ALL: [HorizontalAxis; 5] = [
        HorizontalAxis::Longitude,
        HorizontalAxis::LocalSolarTime,
        HorizontalAxis::Latitude,
        HorizontalAxis::SolarLongitude,
        HorizontalAxis::SolarZenithAngle,
    ];

    /// Fixed binning domain `(lo, hi)`.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            HorizontalAxis::Longitude => (0.0, 360.0),
            HorizontalAxis::LocalSolarTime => (0.0, 24.0),
            HorizontalAxis::Latitude => (-90.0, 90.0),
            HorizontalAxis::SolarLongitude => (0.0, 360.0),
            HorizontalAxis::SolarZenithAngle => (0.0, 180.0),
        }
    }

    /// Axis limits of the figures, slightly wider than the domain.
    pub fn plot_limits(&self) -> (f64, f64) {
        match self {
            HorizontalAxis::Longitude | HorizontalAxis::SolarLongitude => (-1.0, 361.0),
            HorizontalAxis::LocalSolarTime => (-0.1, 24.1),
            HorizontalAxis::Latitude => (-91.0, 91.0),
            HorizontalAxis::SolarZenithAngle => (-1.0, 181.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HorizontalAxis::Longitude => "Longitude (°)",
            HorizontalAxis::LocalSolarTime => "Local Solar Time (hr/24)",
            HorizontalAxis::Latitude => "Latitude (°)",
            HorizontalAxis::SolarLongitude => "Ls (°)",
            HorizontalAxis::SolarZenithAngle => "SZA (°)",
        }
    }

    /// Short name, as used on the command line and in output file names.
    pub fn short_name(&self) -> &'static str {
        match self {
            HorizontalAxis::Longitude => "lon",
            HorizontalAxis::LocalSolarTime => "lst",
            HorizontalAxis::Latitude => "lat",
            HorizontalAxis::SolarLongitude => "ls",
            HorizontalAxis::SolarZenithAngle => "sza",
        }
    }

    /// Coordinate of an observation on this axis.
    pub fn value(&self, obs: &Observation) -> f64 {
        match self {
            HorizontalAxis::Longitude => obs.lon,
            HorizontalAxis::LocalSolarTime => obs.lst,
            HorizontalAxis::Latitude => obs.lat,
            HorizontalAxis::SolarLongitude => obs.solar_longitude(),
            HorizontalAxis::SolarZenithAngle => obs.solar_zenith_angle(),
        }
    }
}

impl FromStr for HorizontalAxis {
    type Err = EuvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HorizontalAxis::ALL
            .into_iter()
            .find(|axis| axis.short_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                EuvmError::InvalidBinningParameter(format!(
                    "unknown horizontal axis '{s}' (expected lon, lst, lat, ls or sza)"
                ))
            })
    }
}

impl fmt::Display for HorizontalAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Vertical coordinate and how its edges are generated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalBinning {
    /// Altitude bins of a fixed height (km).
    Altitude { step_km: f64 },
    /// A fixed number of geometrically spaced pressure bins.
    Pressure { bins: usize },
}

impl VerticalBinning {
    /// Coordinate of an observation on this axis.
    pub fn value(&self, obs: &Observation) -> f64 {
        match self {
            VerticalBinning::Altitude { .. } => obs.alt_temp,
            VerticalBinning::Pressure { .. } => obs.pressure,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VerticalBinning::Altitude { .. } => "Altitude [km]",
            VerticalBinning::Pressure { .. } => "Pressure [Pa]",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            VerticalBinning::Altitude { .. } => "alt",
            VerticalBinning::Pressure { .. } => "pres",
        }
    }

    /// Axis limits of the figures, `(bottom, top)`.
    pub fn plot_limits(&self) -> (f64, f64) {
        match self {
            VerticalBinning::Altitude { .. } => (80.0, 250.0),
            VerticalBinning::Pressure { .. } => (1.0e-2, 1.0e-8),
        }
    }

    pub fn is_log_scale(&self) -> bool {
        matches!(self, VerticalBinning::Pressure { .. })
    }

    /// Edges spanning the observed range `[min, max]`.
    pub fn edges(&self, min: f64, max: f64) -> Result<BinEdges, EuvmError> {
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return Err(EuvmError::DegenerateBinning(format!(
                "{} range [{min}, {max}] has no extent",
                self.short_name()
            )));
        }
        match *self {
            VerticalBinning::Altitude { step_km } => BinEdges::arange(min, max, step_km),
            VerticalBinning::Pressure { bins } => BinEdges::geomspace(min, max, edge_count(bins)?),
        }
    }
}

/// Upper bound on the number of edges along one axis.
pub const MAX_BIN_EDGES: usize = 1_000_000;

/// Edge count for `bins` intervals.
pub(crate) fn edge_count(bins: usize) -> Result<usize, EuvmError> {
    bins.checked_add(1)
        .filter(|&n| n <= MAX_BIN_EDGES)
        .ok_or_else(|| {
            EuvmError::InvalidBinningParameter(format!(
                "{bins} bins exceed the limit of {} per axis",
                MAX_BIN_EDGES - 1
            ))
        })
}

/// Open orbit window `lo < orbit < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbitRange {
    lo: u32,
    hi: u32,
}

impl Default for OrbitRange {
    fn default() -> Self {
        OrbitRange {
            lo: DEFAULT_ORBIT_MIN,
            hi: DEFAULT_ORBIT_MAX,
        }
    }
}

impl OrbitRange {
    pub fn new(lo: u32, hi: u32) -> Result<Self, EuvmError> {
        if lo >= hi {
            return Err(EuvmError::InvalidBinningParameter(format!(
                "orbit range requires lo < hi, got ({lo}, {hi})"
            )));
        }
        Ok(OrbitRange { lo, hi })
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    /// Whether an orbit lies strictly inside the window. Unknown orbits never do.
    pub fn contains(&self, orbit: Option<u32>) -> bool {
        orbit.is_some_and(|o| self.lo < o && o < self.hi)
    }
}

/// Monotonically increasing bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    /// Wrap explicit edges, which must be finite, strictly increasing and at least two.
    pub fn new(edges: Vec<f64>) -> Result<Self, EuvmError> {
        if edges.len() < 2 {
            return Err(EuvmError::DegenerateBinning(format!(
                "at least two edges are needed, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EuvmError::DegenerateBinning(
                "edges must be finite and strictly increasing".into(),
            ));
        }
        Ok(BinEdges { edges })
    }

    /// `num` evenly spaced edges from `lo` to `hi` inclusive.
    pub fn linspace(lo: f64, hi: f64, num: usize) -> Result<Self, EuvmError> {
        if num < 2 {
            return Err(EuvmError::DegenerateBinning(format!(
                "linspace needs at least two edges, got {num}"
            )));
        }
        if num > MAX_BIN_EDGES {
            return Err(EuvmError::InvalidBinningParameter(format!(
                "{num} edges exceed the limit of {MAX_BIN_EDGES}"
            )));
        }
        let step = (hi - lo) / (num - 1) as f64;
        let mut edges: Vec<f64> = (0..num).map(|i| lo + i as f64 * step).collect();
        edges[num - 1] = hi;
        Self::new(edges)
    }

    /// Edges `lo, lo + step, ...` strictly below `hi`.
    pub fn arange(lo: f64, hi: f64, step: f64) -> Result<Self, EuvmError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(EuvmError::InvalidBinningParameter(format!(
                "step must be a positive number, got {step}"
            )));
        }
        let num = ((hi - lo) / step).ceil().max(0.0);
        if num > MAX_BIN_EDGES as f64 {
            return Err(EuvmError::InvalidBinningParameter(format!(
                "step {step} over [{lo}, {hi}] gives more than {MAX_BIN_EDGES} edges"
            )));
        }
        let num = num as usize;
        Self::new((0..num).map(|i| lo + i as f64 * step).collect())
    }

    /// `num` edges evenly spaced on a log scale from `lo` to `hi` inclusive.
    pub fn geomspace(lo: f64, hi: f64, num: usize) -> Result<Self, EuvmError> {
        if lo <= 0.0 || hi <= 0.0 {
            return Err(EuvmError::DegenerateBinning(format!(
                "geometric spacing needs positive bounds, got [{lo}, {hi}]"
            )));
        }
        let (log_lo, log_hi) = (lo.ln(), hi.ln());
        let mut log_edges = Self::linspace(log_lo, log_hi, num)?.edges;
        log_edges.iter_mut().for_each(|e| *e = e.exp());
        log_edges[0] = lo;
        log_edges[num - 1] = hi;
        Self::new(log_edges)
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins (edges minus one).
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Midpoint of every bin.
    pub fn midpoints(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    pub fn midpoint(&self, bin: usize) -> Option<f64> {
        Some((self.edges.get(bin)? + self.edges.get(bin + 1)?) / 2.0)
    }

    /// Index of the right-closed bin `(e[i], e[i + 1]]` holding `value`.
    pub fn assign(&self, value: f64) -> Option<usize> {
        let p = self.edges.partition_point(|&e| e < value);
        (p > 0 && p < self.edges.len()).then(|| p - 1)
    }
}

#[cfg(test)]
mod test_bin_edges {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace_domain() {
        let (lo, hi) = HorizontalAxis::Longitude.domain();
        let edges = BinEdges::linspace(lo, hi, 11).unwrap();
        assert_eq!(edges.len(), 10);
        assert_eq!(edges.edges()[0], 0.0);
        assert_eq!(edges.edges()[10], 360.0);
        assert_relative_eq!(edges.midpoints()[0], 18.0);
    }

    #[test]
    fn test_arange_excludes_stop() {
        let edges = BinEdges::arange(100.0, 120.0, 5.0).unwrap();
        assert_eq!(edges.edges(), &[100.0, 105.0, 110.0, 115.0]);

        let edges = BinEdges::arange(100.0, 121.0, 5.0).unwrap();
        assert_eq!(edges.edges().len(), 5);

        assert!(matches!(
            BinEdges::arange(100.0, 104.0, 5.0),
            Err(EuvmError::DegenerateBinning(_))
        ));
        assert!(matches!(
            BinEdges::arange(100.0, 140.0, 0.0),
            Err(EuvmError::InvalidBinningParameter(_))
        ));
    }

    #[test]
    fn test_edge_count_is_bounded() {
        assert!(matches!(
            BinEdges::arange(100.0, 200.0, 1e-300),
            Err(EuvmError::InvalidBinningParameter(_))
        ));
        assert!(matches!(
            BinEdges::linspace(0.0, 1.0, MAX_BIN_EDGES + 1),
            Err(EuvmError::InvalidBinningParameter(_))
        ));
        assert!(edge_count(usize::MAX).is_err());
        assert_eq!(edge_count(MAX_BIN_EDGES - 1).unwrap(), MAX_BIN_EDGES);

        let pres = VerticalBinning::Pressure { bins: usize::MAX };
        assert!(matches!(
            pres.edges(1e-6, 1e-3),
            Err(EuvmError::InvalidBinningParameter(_))
        ));
    }

    #[test]
    fn test_geomspace() {
        let edges = BinEdges::geomspace(1e-8, 1e-2, 7).unwrap();
        assert_eq!(edges.edges()[0], 1e-8);
        assert_eq!(edges.edges()[6], 1e-2);
        assert_relative_eq!(edges.edges()[3], 1e-5, max_relative = 1e-12);
        assert!(BinEdges::geomspace(0.0, 1.0, 5).is_err());
    }

    #[test]
    fn test_right_closed_assignment() {
        let edges = BinEdges::new(vec![0.0, 1.0, 2.0]).unwrap();
        assert_eq!(edges.assign(0.0), None);
        assert_eq!(edges.assign(0.5), Some(0));
        assert_eq!(edges.assign(1.0), Some(0));
        assert_eq!(edges.assign(1.0000001), Some(1));
        assert_eq!(edges.assign(2.0), Some(1));
        assert_eq!(edges.assign(2.5), None);
        assert_eq!(edges.assign(-1.0), None);
        assert_eq!(edges.assign(f64::NAN), None);
    }

    #[test]
    fn test_midpoints_rebin_to_same_bin() {
        let edges = BinEdges::geomspace(3e-7, 4e-3, 51).unwrap();
        for (i, mid) in edges.midpoints().into_iter().enumerate() {
            assert_eq!(edges.assign(mid), Some(i));
        }
    }

    #[test]
    fn test_vertical_edges_degenerate() {
        let alt = VerticalBinning::Altitude { step_km: 5.0 };
        assert!(matches!(
            alt.edges(120.0, 120.0),
            Err(EuvmError::DegenerateBinning(_))
        ));
        let pres = VerticalBinning::Pressure { bins: 10 };
        assert!(matches!(
            pres.edges(-1.0, 1.0),
            Err(EuvmError::DegenerateBinning(_))
        ));
        assert_eq!(pres.edges(1e-6, 1e-3).unwrap().len(), 10);
    }

    #[test]
    fn test_orbit_range() {
        let range = OrbitRange::default();
        assert!(!range.contains(Some(700)));
        assert!(range.contains(Some(701)));
        assert!(range.contains(Some(999)));
        assert!(!range.contains(Some(1000)));
        assert!(!range.contains(None));
        assert!(OrbitRange::new(10, 10).is_err());
    }

    #[test]
    fn test_axis_names() {
        for axis in HorizontalAxis::ALL {
            assert_eq!(axis.short_name().parse::<HorizontalAxis>().unwrap(), axis);
        }
        assert_eq!("LS".parse::<HorizontalAxis>().unwrap(), HorizontalAxis::SolarLongitude);
        assert!("alt".parse::<HorizontalAxis>().is_err());
    }
}
