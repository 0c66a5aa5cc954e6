//! # Configuration and data directory resolution
//!
//! The pipeline is driven by a small TOML document, typically
//! `config_local.toml`, pointing at the local copy of the EUVM archive:
//!
//! ```toml
//! data_path = "~/data/maven/euvm"
//! version = 1
//! revision = 0
//! combined_csv = "data/all_euvm.csv"
//! orbit_min = 700
//! orbit_max = 1000
//! ```
//!
//! Only `data_path` is required. The configuration is loaded once into an
//! [`EuvmConfig`] and passed explicitly to the stages that need it.
//!
//! ## See also
//! ------------
//! * [`euvm_version_dir`] – Resolution of the versioned retrieval directory.
//! * [`crate::binning::OrbitRange`] – Orbit window built from `orbit_min`/`orbit_max`.
use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::Deserialize;

use crate::binning::OrbitRange;
use crate::constants::{
    DEFAULT_COMBINED_CSV, DEFAULT_ORBIT_MAX, DEFAULT_ORBIT_MIN, EUVM_DIR_PREFIX,
};
use crate::euvm_errors::EuvmError;

/// Settings of a pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EuvmConfig {
    /// Root of the EUVM archive, may start with `~`.
    pub data_path: String,
    /// Retrieval version (`vVV`).
    #[serde(default = "default_version")]
    pub version: u32,
    /// Retrieval revision (`rRR`).
    #[serde(default)]
    pub revision: u32,
    /// Where `--bigdf` writes the combined table.
    #[serde(default = "default_combined_csv")]
    pub combined_csv: Utf8PathBuf,
    #[serde(default = "default_orbit_min")]
    pub orbit_min: u32,
    #[serde(default = "default_orbit_max")]
    pub orbit_max: u32,
}

fn default_version() -> u32 {
    1
}

fn default_combined_csv() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_COMBINED_CSV)
}

fn default_orbit_min() -> u32 {
    DEFAULT_ORBIT_MIN
}

fn default_orbit_max() -> u32 {
    DEFAULT_ORBIT_MAX
}

impl EuvmConfig {
    /// Build a configuration with default settings for a given archive root.
    pub fn new(data_path: impl Into<String>) -> Self {
        EuvmConfig {
            data_path: data_path.into(),
            version: default_version(),
            revision: 0,
            combined_csv: default_combined_csv(),
            orbit_min: DEFAULT_ORBIT_MIN,
            orbit_max: DEFAULT_ORBIT_MAX,
        }
    }

    /// Read a TOML configuration file.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Location of the configuration file.
    ///
    /// Return
    /// ----------
    /// * The parsed configuration, [`EuvmError::ConfigRead`] if the file cannot be
    ///   read or [`EuvmError::ConfigParse`] if the document is invalid.
    pub fn from_file(path: &Utf8Path) -> Result<Self, EuvmError> {
        let text = std::fs::read_to_string(path).map_err(|source| EuvmError::ConfigRead {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded configuration from {path}: {config:?}");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, EuvmError> {
        Ok(toml::from_str(text)?)
    }

    /// Directory holding the `.sav` files of the configured version and revision.
    pub fn version_dir(&self) -> Result<Utf8PathBuf, EuvmError> {
        euvm_version_dir(&self.data_path, self.version, self.revision)
    }

    /// Orbit window configured for the aggregation stage.
    pub fn orbit_range(&self) -> Result<OrbitRange, EuvmError> {
        OrbitRange::new(self.orbit_min, self.orbit_max)
    }
}

/// Expand a leading `~` (alone or followed by a separator) to the user's home directory.
///
/// `~user` forms are returned unchanged.
pub fn expand_home(path: &str) -> Result<Utf8PathBuf, EuvmError> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(Utf8PathBuf::from(path)),
    };

    let base_dirs = BaseDirs::new().ok_or_else(|| EuvmError::HomeDirNotFound(path.into()))?;
    let home = Utf8Path::from_path(base_dirs.home_dir()).ok_or_else(|| {
        EuvmError::Utf8PathError(format!(
            "home directory {} is not valid UTF-8",
            base_dirs.home_dir().display()
        ))
    })?;

    if rest.is_empty() {
        Ok(home.to_path_buf())
    } else {
        Ok(home.join(rest))
    }
}

/// Resolve the versioned data directory of the EUVM archive.
///
/// Arguments
/// -----------------
/// * `root`: Archive root, a leading `~` is expanded.
/// * `version`, `revision`: Retrieval version and revision, zero padded to two digits.
///
/// Return
/// ----------
/// * `<root>/euvm_temperatures_vVVrRR/`, the trailing separator is kept.
///
/// See also
/// ------------
/// * [`expand_home`] – Home directory expansion.
pub fn euvm_version_dir(root: &str, version: u32, revision: u32) -> Result<Utf8PathBuf, EuvmError> {
    let root = expand_home(root)?;
    Ok(root.join(format!("{EUVM_DIR_PREFIX}_v{version:02}r{revision:02}/")))
}
