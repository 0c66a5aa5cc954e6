//! # Presentation of the binned fields
//!
//! The pipeline does not draw anything itself: it assembles a
//! [`StabilityFigure`] (four gridded fields plus vertical profiles and the
//! axis styles) and hands it to a [`Presenter`].
//!
//! ## Layout
//! -----------------
//! The figure follows a 2 × 4 panel layout:
//!
//! ```text
//! +-------------+-------------+-------------+-------------+
//! | T contour   | σT contour  | N²·10⁴      | count       |
//! +-------------+-------------+-------------+-------------+
//! | T profiles  | σT profiles | N²·10⁴      | column      |
//! |             |             | profiles    | count       |
//! +-------------+-------------+-------------+-------------+
//! ```
//!
//! Profiles are drawn for every third populated horizontal bin by default.
//!
//! ## Implementations
//! -----------------
//! * [`CsvGridPresenter`] – One CSV grid per field plus a profile table.
//! * `PlotlyPresenter` (feature `plot`) – Interactive HTML figure.
use crate::binning::{
    BinField, BinnedAggregate, HorizontalAxis, ProfilePoint, VerticalBinning, VerticalProfile,
};
use crate::euvm_errors::EuvmError;
use crate::regrid::GriddedField;

mod csv_grid;
#[cfg(feature = "plot")]
mod plotly_figure;

pub use csv_grid::CsvGridPresenter;
#[cfg(feature = "plot")]
pub use plotly_figure::PlotlyPresenter;

/// Display factor applied to N² (s⁻²) in every panel.
pub const N2_DISPLAY_SCALE: f64 = 1.0e4;

/// Profiles drawn for every n-th horizontal bin.
pub const DEFAULT_PROFILE_STRIDE: usize = 3;

/// Sink for a finished figure.
pub trait Presenter {
    fn present(&self, figure: &StabilityFigure) -> Result<(), EuvmError>;
}

/// One contour panel: a field, its label and its color range.
#[derive(Debug, Clone, Copy)]
pub struct Panel<'a> {
    /// Short identifier, used in file names
    pub name: &'static str,
    pub label: &'static str,
    pub field: &'a GriddedField,
    pub range: (f64, f64),
}

/// Everything a presenter needs to draw the stability figure.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityFigure {
    pub x_axis: HorizontalAxis,
    pub vertical: VerticalBinning,
    pub temperature: GriddedField,
    pub std: GriddedField,
    /// N² × 10⁴ (s⁻²)
    pub n2_scaled: GriddedField,
    pub count: GriddedField,
    /// Profiles of the selected horizontal bins, N² left unscaled
    pub profiles: Vec<VerticalProfile>,
    /// Profile over all horizontal bins
    pub column: VerticalProfile,
}

impl StabilityFigure {
    pub const TEMPERATURE_RANGE: (f64, f64) = (90.0, 300.0);
    pub const STD_RANGE: (f64, f64) = (0.0, 80.0);
    pub const N2_SCALED_RANGE: (f64, f64) = (0.0, 2.5);

    /// Assemble the figure from an aggregate.
    ///
    /// Arguments
    /// -----------------
    /// * `aggregate`: Binned statistics.
    /// * `profile_stride`: Draw the profile of every n-th populated horizontal bin.
    ///
    /// Return
    /// ----------
    /// * The figure, or the error of the N² transform / an invalid stride.
    pub fn from_aggregate(
        aggregate: &BinnedAggregate,
        profile_stride: usize,
    ) -> Result<Self, EuvmError> {
        let params = aggregate.params();
        Ok(StabilityFigure {
            x_axis: params.x_axis,
            vertical: params.vertical,
            temperature: aggregate.grid(BinField::MeanTemperature)?,
            std: aggregate.grid(BinField::StdTemperature)?,
            n2_scaled: aggregate
                .grid(BinField::BuoyancyFrequency)?
                .scaled(N2_DISPLAY_SCALE),
            count: aggregate.grid(BinField::Count)?,
            profiles: aggregate.profiles(profile_stride)?,
            column: aggregate.column_profile()?,
        })
    }

    /// The four contour panels, left to right.
    pub fn panels(&self) -> [Panel<'_>; 4] {
        let max_count = self.count.max_finite().unwrap_or(1.0);
        [
            Panel {
                name: "temperature",
                label: "Temperature [K]",
                field: &self.temperature,
                range: Self::TEMPERATURE_RANGE,
            },
            Panel {
                name: "std",
                label: "Standard Deviation [K]",
                field: &self.std,
                range: Self::STD_RANGE,
            },
            Panel {
                name: "n2",
                label: "N² x 1.0e4 [s⁻²]",
                field: &self.n2_scaled,
                range: Self::N2_SCALED_RANGE,
            },
            Panel {
                name: "count",
                label: "Number of Profiles",
                field: &self.count,
                range: (0.0, max_count),
            },
        ]
    }
}
