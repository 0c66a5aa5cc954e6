//! Command-line interface definitions for euvmt.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

use euvmt::binning::{BinningParams, HorizontalAxis, OrbitRange, VerticalBinning};
use euvmt::constants::{DEFAULT_ALT_STEP_KM, DEFAULT_PRESSURE_BINS, DEFAULT_XBINS};
use euvmt::euvm_errors::EuvmError;

/// Bin MAVEN/EMM EUVM temperature profiles and derive the static stability.
#[derive(Parser, Debug)]
#[command(name = "euvmt", version, about)]
pub struct Cli {
    /// Combined CSV or single `.sav` file (default: the configured archive).
    pub input: Option<Utf8PathBuf>,

    /// TOML configuration file.
    #[arg(long, default_value = "config_local.toml")]
    pub config: Utf8PathBuf,

    /// Horizontal binning axis: lon, lst, lat, ls or sza.
    #[arg(long, short = 'x', default_value = "lon")]
    pub xaxis: HorizontalAxis,

    /// Vertical binning axis.
    #[arg(long, short = 'y', value_enum, default_value_t = VerticalAxis::Alt)]
    pub yaxis: VerticalAxis,

    /// Number of horizontal bins.
    #[arg(long, default_value_t = DEFAULT_XBINS)]
    pub xbins: usize,

    /// Altitude bin height in km (with `-y alt`).
    #[arg(long, default_value_t = DEFAULT_ALT_STEP_KM)]
    pub alt_step: f64,

    /// Number of geometric pressure bins (with `-y pres`).
    #[arg(long, default_value_t = DEFAULT_PRESSURE_BINS)]
    pub pres_bins: usize,

    /// Exclusive lower orbit bound (overrides the configuration).
    #[arg(long)]
    pub orbit_min: Option<u32>,

    /// Exclusive upper orbit bound (overrides the configuration).
    #[arg(long)]
    pub orbit_max: Option<u32>,

    /// Directory receiving the figure outputs.
    #[arg(long, short = 's')]
    pub save: Option<Utf8PathBuf>,

    /// Do not open the figure after rendering it.
    #[arg(long)]
    pub hide: bool,

    /// Load every save file and write the combined CSV, then exit.
    #[arg(long)]
    pub bigdf: bool,
}

/// Vertical coordinate selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VerticalAxis {
    /// Altitude (km), linear bins.
    Alt,
    /// Pressure (Pa), geometric bins.
    Pres,
}

impl Cli {
    /// Binning parameters selected by the flags.
    pub fn binning_params(&self, orbit_range: OrbitRange) -> Result<BinningParams, EuvmError> {
        let vertical = match self.yaxis {
            VerticalAxis::Alt => VerticalBinning::Altitude {
                step_km: self.alt_step,
            },
            VerticalAxis::Pres => VerticalBinning::Pressure {
                bins: self.pres_bins,
            },
        };
        BinningParams::builder()
            .x_axis(self.xaxis)
            .x_bins(self.xbins)
            .vertical(vertical)
            .orbit_range(orbit_range)
            .build()
    }
}

#[cfg(test)]
mod test_cli {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["euvmt"]);
        assert_eq!(cli.xaxis, HorizontalAxis::Longitude);
        assert_eq!(cli.yaxis, VerticalAxis::Alt);
        assert!(cli.input.is_none());
        assert!(!cli.bigdf);

        let params = cli.binning_params(OrbitRange::default()).unwrap();
        assert_eq!(params, BinningParams::default());
    }

    #[test]
    fn test_pressure_by_local_time() {
        let cli = Cli::parse_from([
            "euvmt", "-x", "lst", "-y", "pres", "--pres-bins", "30", "--hide", "all.csv",
        ]);
        assert_eq!(cli.input.as_deref().map(|p| p.as_str()), Some("all.csv"));

        let params = cli.binning_params(OrbitRange::default()).unwrap();
        assert_eq!(params.x_axis, HorizontalAxis::LocalSolarTime);
        assert_eq!(params.vertical, VerticalBinning::Pressure { bins: 30 });
    }

    #[test]
    fn test_rejects_unknown_axis() {
        assert!(Cli::try_parse_from(["euvmt", "-x", "alt"]).is_err());
    }

    #[test]
    fn test_invalid_step() {
        let cli = Cli::parse_from(["euvmt", "--alt-step", "0"]);
        assert!(cli.binning_params(OrbitRange::default()).is_err());
    }
}
