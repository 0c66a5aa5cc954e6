//! # Profile reader
//!
//! Typed mapping from the variables of an EUVM IDL SAVE file onto
//! [`Observation`]s. The layout is validated once per file by a
//! [`ProfileSchema`]; any deviation fails fast with
//! [`EuvmError::SchemaMismatch`] naming the offending variable.
//!
//! ## Expected variables
//! -----------------
//! | variable        | shape                     | mapped to                      |
//! |-----------------|---------------------------|--------------------------------|
//! | `temp`          | `[n, 2]`                  | `alt_temp`, `temp`             |
//! | `pressure`      | `[n]` or `[n, 1]`         | `pressure`                     |
//! | `density`       | `[m, 2]`                  | `alt_den`, `density`           |
//! | `location_info` | structure array or `[k, ≥5]` | row 0, fields 1..=4: `lat`, `lon`, `lst`, `unixtime` |
//!
//! Density rows are aligned with temperature rows **by position**: rows past
//! `m` get no density, density rows past `n` are not emitted.
use camino::Utf8Path;

use crate::euvm_errors::EuvmError;
use crate::sav::{SavArray, SavFile, SavValue};

use super::{parse_orbit_tag, Location, Observation, OrbitTag};

/// Names of the variables read from each save file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSchema {
    pub temp: String,
    pub pressure: String,
    pub density: String,
    pub location_info: String,
}

impl Default for ProfileSchema {
    fn default() -> Self {
        ProfileSchema {
            temp: "temp".into(),
            pressure: "pressure".into(),
            density: "density".into(),
            location_info: "location_info".into(),
        }
    }
}

fn mismatch(variable: &str, reason: String) -> EuvmError {
    EuvmError::SchemaMismatch {
        variable: variable.to_string(),
        reason,
    }
}

fn describe(value: &SavValue) -> String {
    match value {
        SavValue::Array(a) => format!("{:?} array of shape {:?}", a.type_code, a.shape),
        other => other.kind().to_string(),
    }
}

/// Numeric scalar, also accepting a one-element (or longer) array by its first element.
fn scalar_of(value: &SavValue) -> Option<f64> {
    match value {
        SavValue::Array(a) => a.as_numeric().and_then(|v| v.first().copied()),
        other => other.as_f64(),
    }
}

impl ProfileSchema {
    /// Decode a save file and map it onto observations tagged from its file name.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Location of the `.sav` file; its basename carries the orbit tag.
    ///
    /// Return
    /// ----------
    /// * One observation per `temp` row, or the first decoding/schema error.
    ///
    /// See also
    /// ------------
    /// * [`parse_orbit_tag`] – File name convention.
    /// * [`Self::observations`] – Mapping of already decoded variables.
    pub fn read_file(&self, path: &Utf8Path) -> Result<Vec<Observation>, EuvmError> {
        let sav = SavFile::read(path)?;
        let tag = parse_orbit_tag(path.as_str());
        let rows = self.observations(&sav, tag)?;
        log::debug!(
            "{path}: {} rows, orbit {:?} {}",
            rows.len(),
            tag.orbit,
            tag.direction
        );
        Ok(rows)
    }

    /// Map decoded variables onto observations.
    pub fn observations(&self, sav: &SavFile, tag: OrbitTag) -> Result<Vec<Observation>, EuvmError> {
        let temperature = self.numeric_pairs(sav, &self.temp)?;
        let n = temperature.shape[0];
        let pressure = self.pressure(sav, n)?;
        let density = self.numeric_pairs(sav, &self.density)?;
        let location = self.location(sav)?;

        let temp_values = temperature.as_numeric().unwrap_or_default();
        let den_values = density.as_numeric().unwrap_or_default();

        let rows = (0..n)
            .map(|i| {
                let den = den_values
                    .get(2 * i..2 * i + 2)
                    .map(|pair| (pair[0], pair[1]));
                Observation::new(
                    temp_values[2 * i],
                    temp_values[2 * i + 1],
                    pressure[i],
                    den,
                    &location,
                    tag,
                )
            })
            .collect();
        Ok(rows)
    }

    /// A numeric `[rows, 2]` array.
    fn numeric_pairs<'a>(&self, sav: &'a SavFile, name: &str) -> Result<&'a SavArray, EuvmError> {
        let value = sav.get(name)?;
        let is_pairs = |a: &SavArray| {
            a.shape.len() == 2
                && a.shape[1] == 2
                && a.as_numeric().map(<[f64]>::len) == Some(a.shape[0] * 2)
        };
        match value {
            SavValue::Array(a) if is_pairs(a) => Ok(a),
            other => Err(mismatch(
                name,
                format!("expected a numeric [n, 2] array, found {}", describe(other)),
            )),
        }
    }

    fn pressure<'a>(&self, sav: &'a SavFile, n: usize) -> Result<&'a [f64], EuvmError> {
        let name = &self.pressure;
        let value = sav.get(name)?;
        let SavValue::Array(array) = value else {
            return Err(mismatch(
                name,
                format!("expected a numeric array of {n} elements, found {}", describe(value)),
            ));
        };
        let column = matches!(array.shape.as_slice(), [_] | [_, 1]);
        match array.as_numeric() {
            Some(values) if column && values.len() == n => Ok(values),
            _ => Err(mismatch(
                name,
                format!(
                    "expected a numeric [{n}] array (one value per temperature row), found {}",
                    describe(value)
                ),
            )),
        }
    }

    fn location(&self, sav: &SavFile) -> Result<Location, EuvmError> {
        let name = &self.location_info;
        let value = sav.get(name)?;

        let fields: Option<Vec<f64>> = match value {
            SavValue::Structure(s) => (1..=4)
                .map(|tag| s.field(0, tag).and_then(scalar_of))
                .collect(),
            SavValue::Array(a) if a.shape.len() == 2 => (1..=4).map(|col| a.get2(0, col)).collect(),
            _ => None,
        };

        match fields.as_deref() {
            Some(&[lat, lon, lst, unixtime]) => Ok(Location {
                lat,
                lon,
                lst,
                unixtime,
            }),
            _ => Err(mismatch(
                name,
                format!(
                    "expected a structure with at least 5 numeric fields or a numeric [k, >=5] array, found {}",
                    describe(value)
                ),
            )),
        }
    }
}

#[cfg(test)]
mod test_profile_schema {
    use super::*;

    #[test]
    fn test_scalar_of() {
        assert_eq!(scalar_of(&SavValue::Double(2.5)), Some(2.5));
        assert_eq!(scalar_of(&SavValue::Long(-3)), Some(-3.0));
        assert_eq!(scalar_of(&SavValue::String("x".into())), None);
    }

    #[test]
    fn test_default_names() {
        let schema = ProfileSchema::default();
        assert_eq!(schema.temp, "temp");
        assert_eq!(schema.location_info, "location_info");
    }
}
