//! # Pipeline: configuration, data source and stage wiring
//!
//! This module defines the [`Pipeline`] façade that wires together:
//!
//! 1. **Configuration** ([`EuvmConfig`]) – archive location, version and orbit window.
//! 2. **Data source** ([`DataSource`]) – the versioned archive directory, a
//!    combined CSV written by a previous run, or a single save file.
//! 3. **Combined table** – loaded on first use, then cached.
//! 4. **Aggregation and figure** – [`BinnedAggregate`] and [`StabilityFigure`]
//!    built from the cached table.
//!
//! ## Typical usage
//!
//! ```rust, no_run
//! use camino::Utf8Path;
//! use euvmt::binning::BinningParams;
//! use euvmt::config::EuvmConfig;
//! use euvmt::pipeline::Pipeline;
//! use euvmt::render::CsvGridPresenter;
//!
//! let config = EuvmConfig::from_file(Utf8Path::new("config_local.toml")).unwrap();
//! let pipeline = Pipeline::new(config);
//!
//! let params = BinningParams::builder()
//!     .orbit_range(pipeline.config().orbit_range().unwrap())
//!     .build()
//!     .unwrap();
//! pipeline
//!     .present(&params, &CsvGridPresenter::new("out", "lon_alt"))
//!     .unwrap();
//! ```
//!
//! ## Errors
//!
//! - Loading a whole directory never fails on a single bad file: failures are
//!   logged and kept in [`Pipeline::failures`].
//! - A directory that yields no row at all is an [`EuvmError::EmptySelection`].
use std::cell::OnceCell;

use camino::{Utf8Path, Utf8PathBuf};

use crate::binning::{BinnedAggregate, BinningParams};
use crate::config::EuvmConfig;
use crate::euvm_errors::EuvmError;
use crate::observations::profile_reader::ProfileSchema;
use crate::render::{Presenter, StabilityFigure, DEFAULT_PROFILE_STRIDE};
use crate::table::batch_loader::{load_directory, LoadFailure};
use crate::table::CombinedTable;

/// Where the observations of a run come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataSource {
    /// Every file of the configured version directory.
    #[default]
    VersionDir,
    /// A combined CSV written by a previous run.
    CombinedCsv(Utf8PathBuf),
    /// A single IDL SAVE file.
    SaveFile(Utf8PathBuf),
}

impl DataSource {
    /// Pick the source for an input path from its extension: `.sav` is a save
    /// file, anything else is read as a combined CSV.
    pub fn from_input(path: &Utf8Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("sav") => DataSource::SaveFile(path.into()),
            _ => DataSource::CombinedCsv(path.into()),
        }
    }
}

#[derive(Debug)]
pub struct Pipeline {
    config: EuvmConfig,
    schema: ProfileSchema,
    source: DataSource,
    table: OnceCell<CombinedTable>,
    failures: OnceCell<Vec<LoadFailure>>,
}

impl Pipeline {
    /// Construct a pipeline reading the configured version directory.
    ///
    /// Nothing is read yet: the combined table is loaded the first time
    /// [`table`](Pipeline::table) is called.
    pub fn new(config: EuvmConfig) -> Self {
        Pipeline {
            config,
            schema: ProfileSchema::default(),
            source: DataSource::default(),
            table: OnceCell::new(),
            failures: OnceCell::new(),
        }
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_schema(mut self, schema: ProfileSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &EuvmConfig {
        &self.config
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Get the combined table, loading it from the data source on first call.
    ///
    /// Return
    /// ----------
    /// * A reference to the cached table, or the error of the load.
    ///
    /// See also
    /// ------------
    /// * [`load_directory`] – Batch loading with per-file failure isolation.
    /// * [`CombinedTable::read_csv`] – Combined CSV import.
    pub fn table(&self) -> Result<&CombinedTable, EuvmError> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }

        let (table, failures) = match &self.source {
            DataSource::VersionDir => {
                let dir = self.config.version_dir()?;
                let batch = load_directory(&dir, &self.schema)?;
                if batch.table.is_empty() {
                    return Err(EuvmError::EmptySelection(format!(
                        "no observation loaded from {dir} ({} files failed)",
                        batch.failures.len()
                    )));
                }
                (batch.table, batch.failures)
            }
            DataSource::CombinedCsv(path) => (CombinedTable::read_csv(path)?, Vec::new()),
            DataSource::SaveFile(path) => (
                CombinedTable::from_tables([self.schema.read_file(path)?]),
                Vec::new(),
            ),
        };

        let _ = self.failures.set(failures);
        Ok(self.table.get_or_init(|| table))
    }

    /// Files that failed during the last directory load.
    pub fn failures(&self) -> &[LoadFailure] {
        self.failures.get().map(Vec::as_slice).unwrap_or_default()
    }

    /// Write the combined table to the configured `combined_csv` path.
    pub fn export_combined(&self) -> Result<&Utf8Path, EuvmError> {
        let path = self.config.combined_csv.as_path();
        self.table()?.write_csv(path)?;
        Ok(path)
    }

    /// Bin the combined table.
    pub fn aggregate(&self, params: &BinningParams) -> Result<BinnedAggregate, EuvmError> {
        BinnedAggregate::compute(self.table()?, params)
    }

    /// Bin the combined table and assemble the stability figure.
    pub fn figure(&self, params: &BinningParams) -> Result<StabilityFigure, EuvmError> {
        let aggregate = self.aggregate(params)?;
        log::info!("{aggregate}");
        StabilityFigure::from_aggregate(&aggregate, DEFAULT_PROFILE_STRIDE)
    }

    /// Run the whole chain and hand the figure to a presenter.
    pub fn present<P>(&self, params: &BinningParams, presenter: &P) -> Result<(), EuvmError>
    where
        P: Presenter + ?Sized,
    {
        let figure = self.figure(params)?;
        presenter.present(&figure)
    }
}
