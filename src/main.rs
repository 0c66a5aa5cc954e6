//! EUVM binning tool.
//!
//! Flow: read configuration → load observations (archive, combined CSV or one
//! save file) → either export the combined CSV (`--bigdf`) or bin, derive N²
//! and present the figure.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use euvmt::config::EuvmConfig;
use euvmt::euvm_errors::EuvmError;
use euvmt::pipeline::{DataSource, Pipeline};
use euvmt::render::{CsvGridPresenter, Presenter};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Read the configuration file. Without one, an explicit input still runs
/// with the default settings.
fn load_config(cli: &cli::Cli) -> Result<EuvmConfig, EuvmError> {
    if cli.config.is_file() || cli.input.is_none() {
        return EuvmConfig::from_file(&cli.config);
    }
    log::warn!("{} not found, using default settings", cli.config);
    Ok(EuvmConfig::new("."))
}

fn run(cli: &cli::Cli) -> Result<(), EuvmError> {
    let mut config = load_config(cli)?;
    if let Some(lo) = cli.orbit_min {
        config.orbit_min = lo;
    }
    if let Some(hi) = cli.orbit_max {
        config.orbit_max = hi;
    }
    let orbit_range = config.orbit_range()?;

    let source = cli
        .input
        .as_deref()
        .map(DataSource::from_input)
        .unwrap_or_default();
    let pipeline = Pipeline::new(config).with_source(source);

    if cli.bigdf {
        let path = pipeline.export_combined()?;
        for failure in pipeline.failures() {
            log::warn!("not exported: {} ({})", failure.path, failure.error);
        }
        log::info!("combined table written to {path}");
        return Ok(());
    }

    let params = cli.binning_params(orbit_range)?;

    #[cfg(not(feature = "plot"))]
    if cli.save.is_none() && !cli.hide {
        println!("{:#}", pipeline.aggregate(&params)?);
        return Ok(());
    }

    let figure = pipeline.figure(&params)?;
    let prefix = format!(
        "{}_{}",
        params.x_axis.short_name(),
        params.vertical.short_name()
    );

    if let Some(dir) = &cli.save {
        CsvGridPresenter::new(dir.clone(), prefix.clone()).present(&figure)?;
    }

    #[cfg(feature = "plot")]
    {
        let html = match &cli.save {
            Some(dir) => dir.join(format!("{prefix}.html")),
            None => camino::Utf8PathBuf::from_path_buf(std::env::temp_dir())
                .map_err(|p| EuvmError::Utf8PathError(format!("{}", p.display())))?
                .join(format!("euvmt_{prefix}.html")),
        };
        euvmt::render::PlotlyPresenter::new(html, !cli.hide).present(&figure)?;
    }

    Ok(())
}
