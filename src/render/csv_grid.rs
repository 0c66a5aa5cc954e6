//! CSV output of a [`StabilityFigure`].
//!
//! For a prefix `P` the presenter writes:
//! * `P_temperature.csv`, `P_std.csv`, `P_n2.csv`, `P_count.csv`: one grid per
//!   panel, first row the horizontal midpoints, first column the vertical
//!   midpoints, empty cells for bins without data;
//! * `P_profiles.csv`: the selected vertical profiles followed by the column
//!   profile (empty `x_mid`), N² unscaled.
use camino::{Utf8Path, Utf8PathBuf};

use crate::euvm_errors::EuvmError;
use crate::regrid::GriddedField;

use super::{Presenter, StabilityFigure, VerticalProfile};

fn cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

/// Writes the figure content as CSV files in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvGridPresenter {
    dir: Utf8PathBuf,
    prefix: String,
}

impl CsvGridPresenter {
    pub fn new(dir: impl Into<Utf8PathBuf>, prefix: impl Into<String>) -> Self {
        CsvGridPresenter {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path of the file holding `name`.
    pub fn path_for(&self, name: &str) -> Utf8PathBuf {
        self.dir.join(format!("{}_{name}.csv", self.prefix))
    }

    fn write_grid(&self, path: &Utf8Path, field: &GriddedField) -> Result<(), EuvmError> {
        let mut wtr = csv::Writer::from_path(path)?;

        let mut header = vec![String::from("y\\x")];
        header.extend(field.x.iter().map(|x| x.to_string()));
        wtr.write_record(&header)?;

        for (y, row) in field.y.iter().zip(field.rows()) {
            let mut record = vec![y.to_string()];
            record.extend(row.into_iter().map(cell));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_profiles(&self, path: &Utf8Path, figure: &StabilityFigure) -> Result<(), EuvmError> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record([
            "x_mid",
            "y_mid",
            "mean_temp",
            "std_temp",
            "mean_altitude",
            "count",
            "n2",
        ])?;

        let all: Vec<&VerticalProfile> = figure
            .profiles
            .iter()
            .chain(std::iter::once(&figure.column))
            .collect();
        for profile in all {
            let x = profile.x_mid.map(cell).unwrap_or_default();
            for p in &profile.points {
                wtr.write_record([
                    x.clone(),
                    cell(p.y_mid),
                    cell(p.mean_temp),
                    cell(p.std_temp),
                    cell(p.mean_altitude),
                    p.count.to_string(),
                    cell(p.n2),
                ])?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Presenter for CsvGridPresenter {
    fn present(&self, figure: &StabilityFigure) -> Result<(), EuvmError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| EuvmError::Presenter(format!("cannot create {}: {e}", self.dir)))?;
        for panel in figure.panels() {
            let path = self.path_for(panel.name);
            self.write_grid(&path, panel.field)?;
            log::debug!("wrote {} grid to {path}", panel.label);
        }
        let path = self.path_for("profiles");
        self.write_profiles(&path, figure)?;
        log::info!("wrote figure grids to {}", self.dir);
        Ok(())
    }
}
