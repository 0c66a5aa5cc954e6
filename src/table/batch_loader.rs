//! # Batch loading of EUVM save files
//!
//! Load every save file of a version directory (or an explicit list of files)
//! into one [`CombinedTable`].
//!
//! ## Error Semantics
//! -----------------
//! Failures are **per-file**: a corrupt or mismatched file is recorded in
//! [`BatchLoad::failures`] and reported with `log::warn!`, the remaining files
//! are still loaded. Only the directory discovery itself can fail the batch.
//!
//! ## Progress UI (feature: `progress`)
//! -----------------
//! With the `progress` feature an `indicatif` bar shows the current file and a
//! moving average of the per-file time.
//!
//! ## See also
//! ------------
//! * [`ProfileSchema::read_file`] – Per-file loader.
//! * [`crate::config::euvm_version_dir`] – Directory of a given version/revision.
use camino::{Utf8Path, Utf8PathBuf};
use glob::MatchOptions;

use crate::euvm_errors::EuvmError;
use crate::observations::profile_reader::ProfileSchema;

use super::CombinedTable;

#[cfg(feature = "progress")]
use super::progress_bar::LoadProgress;

/// A file that could not be loaded, with the reason.
#[derive(Debug, PartialEq)]
pub struct LoadFailure {
    pub path: Utf8PathBuf,
    pub error: EuvmError,
}

/// Outcome of a batch load.
#[derive(Debug, Default, PartialEq)]
pub struct BatchLoad {
    /// Observations of every file loaded successfully, sorted by orbit
    pub table: CombinedTable,
    /// Files that failed, in processing order
    pub failures: Vec<LoadFailure>,
    /// Number of files loaded successfully
    pub files_loaded: usize,
}

impl BatchLoad {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// List the regular files of a directory (`<dir>/*`, hidden files excluded), sorted by name.
pub fn discover_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, EuvmError> {
    if !dir.is_dir() {
        return Err(EuvmError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("data directory {dir} does not exist"),
        )));
    }

    let pattern = dir.join("*");
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let entries = glob::glob_with(pattern.as_str(), options)
        .map_err(|e| EuvmError::Pattern(format!("{pattern}: {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| EuvmError::IoError(e.into()))?;
        let path = Utf8PathBuf::from_path_buf(path)
            .map_err(|p| EuvmError::Utf8PathError(format!("{}", p.display())))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every file of a directory.
///
/// Arguments
/// -----------------
/// * `dir`: Directory to scan, typically the versioned EUVM directory.
/// * `schema`: Variable mapping applied to every file.
///
/// Return
/// ----------
/// * The [`BatchLoad`], or an error if the directory cannot be listed.
pub fn load_directory(dir: &Utf8Path, schema: &ProfileSchema) -> Result<BatchLoad, EuvmError> {
    let files = discover_files(dir)?;
    if files.is_empty() {
        log::warn!("no file found in {dir}");
    } else {
        log::info!("found {} files in {dir}", files.len());
    }
    Ok(load_files(&files, schema))
}

/// Load a list of files, isolating per-file failures.
pub fn load_files<P>(paths: &[P], schema: &ProfileSchema) -> BatchLoad
where
    P: AsRef<Utf8Path>,
{
    let mut tables = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();

    #[cfg(feature = "progress")]
    let mut progress = LoadProgress::new(paths.len());

    for path in paths {
        let path = path.as_ref();
        match schema.read_file(path) {
            Ok(rows) => tables.push(rows),
            Err(error) => {
                log::warn!("skipping {path}: {error}");
                failures.push(LoadFailure {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }

        #[cfg(feature = "progress")]
        progress.file_done(path.file_name().unwrap_or(path.as_str()));
    }

    #[cfg(feature = "progress")]
    progress.finish();

    let files_loaded = tables.len();
    let table = CombinedTable::from_tables(tables);
    log::info!(
        "loaded {} rows from {files_loaded} files ({} failed)",
        table.len(),
        failures.len()
    );

    BatchLoad {
        table,
        failures,
        files_loaded,
    }
}
