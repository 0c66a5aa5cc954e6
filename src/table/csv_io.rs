//! # Combined CSV
//!
//! Export and import of the [`CombinedTable`] as the `all_euvm.csv` file.
//!
//! Columns, in order:
//!
//! ```text
//! alt_temp,temp,pressure,lat,lon,lst,unixtime,alt_den,density,orbit,inout,datetime
//! ```
//!
//! * missing values (`NaN`, absent density, unknown orbit) are empty fields,
//! * `inout` is `i`, `o` or empty,
//! * `datetime` is the UTC time of `unixtime` as `YYYY-MM-DD HH:MM:SS`.
//!
//! On import `datetime` is recomputed from `unixtime`, or `unixtime` from
//! `datetime` when only the latter is filled; orbit numbers written as floats
//! (`888.0`) are accepted.
use std::io::{Read, Write};

use camino::Utf8Path;
use serde::{Deserialize, Deserializer, Serialize};

use crate::euvm_errors::EuvmError;
use crate::observations::{Direction, Location, Observation, OrbitTag};
use crate::time::{format_utc_datetime, parse_utc_datetime};

use super::CombinedTable;

#[derive(Debug, Serialize, Deserialize)]
struct CsvRecord {
    alt_temp: Option<f64>,
    temp: Option<f64>,
    pressure: Option<f64>,
    lat: Option<f64>,
    lon: Option<f64>,
    lst: Option<f64>,
    unixtime: Option<f64>,
    alt_den: Option<f64>,
    density: Option<f64>,
    #[serde(deserialize_with = "lenient_orbit")]
    orbit: Option<u32>,
    #[serde(default)]
    inout: String,
    #[serde(default)]
    datetime: String,
}

fn lenient_orbit<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|o| o.is_finite() && *o >= 0.0 && o.fract() == 0.0 && *o <= u32::MAX as f64)
        .map(|o| o as u32))
}

fn present(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

impl From<&Observation> for CsvRecord {
    fn from(o: &Observation) -> Self {
        CsvRecord {
            alt_temp: present(o.alt_temp),
            temp: present(o.temp),
            pressure: present(o.pressure),
            lat: present(o.lat),
            lon: present(o.lon),
            lst: present(o.lst),
            unixtime: present(o.unixtime),
            alt_den: o.alt_den.and_then(present),
            density: o.density.and_then(present),
            orbit: o.orbit,
            inout: o.direction.code().to_string(),
            datetime: o
                .datetime
                .as_ref()
                .map(format_utc_datetime)
                .unwrap_or_default(),
        }
    }
}

impl From<CsvRecord> for Observation {
    fn from(r: CsvRecord) -> Self {
        let missing = f64::NAN;
        let unixtime = r.unixtime.or_else(|| {
            parse_utc_datetime(&r.datetime)
                .ok()
                .map(|epoch| epoch.to_unix_seconds())
        });
        let location = Location {
            lat: r.lat.unwrap_or(missing),
            lon: r.lon.unwrap_or(missing),
            lst: r.lst.unwrap_or(missing),
            unixtime: unixtime.unwrap_or(missing),
        };
        let tag = OrbitTag {
            orbit: r.orbit,
            direction: Direction::from_code(&r.inout),
        };
        let mut obs = Observation::new(
            r.alt_temp.unwrap_or(missing),
            r.temp.unwrap_or(missing),
            r.pressure.unwrap_or(missing),
            None,
            &location,
            tag,
        );
        obs.alt_den = r.alt_den;
        obs.density = r.density;
        obs
    }
}

impl CombinedTable {
    /// Write the table as CSV, creating the parent directory if needed.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Destination, e.g. `data/all_euvm.csv`.
    ///
    /// Return
    /// ----------
    /// * `Ok(())`, or the I/O / CSV error.
    pub fn write_csv(&self, path: &Utf8Path) -> Result<(), EuvmError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.to_writer(file)?;
        log::info!("wrote {} rows to {path}", self.len());
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), EuvmError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for obs in self.iter() {
            wtr.serialize(CsvRecord::from(obs))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read a combined CSV back into a table (re-sorted by orbit).
    pub fn read_csv(path: &Utf8Path) -> Result<Self, EuvmError> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        log::info!("read {} rows from {path}", table.len());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, EuvmError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let rows = rdr
            .deserialize::<CsvRecord>()
            .map(|r| r.map(Observation::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CombinedTable::from_tables([rows]))
    }
}

#[cfg(test)]
mod test_csv_io {
    use super::*;

    const HEADER: &str =
        "alt_temp,temp,pressure,lat,lon,lst,unixtime,alt_den,density,orbit,inout,datetime";

    #[test]
    fn test_header_and_missing_values() {
        let location = Location {
            lat: 12.5,
            lon: 200.0,
            lst: 17.25,
            unixtime: 1_450_000_000.0,
        };
        let tag = OrbitTag {
            orbit: Some(888),
            direction: Direction::Outbound,
        };
        let table = CombinedTable::from_tables([vec![
            Observation::new(150.0, 160.5, 2.0e-4, Some((150.0, 1.5e9)), &location, tag),
            Observation::new(155.0, f64::NAN, 1.0e-4, None, &location, tag),
        ]]);

        let mut buf = Vec::new();
        table.to_writer(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert!(lines[1].ends_with(",888,o,2015-12-13 09:46:40"));
        assert!(lines[2].starts_with("155.0,,"));
        assert!(lines[2].contains(",1450000000.0,,,888,"));
    }

    #[test]
    fn test_read_pandas_style_file() {
        let text = format!(
            "{HEADER}\n\
             120.5,150.0,0.001,10.0,20.0,6.0,1450000000.0,120.5,3e9,905.0,i,2015-12-13 09:46:40\n\
             121.5,151.0,0.0009,10.0,20.0,6.0,,,,,,2015-12-13 09:46:40\n"
        );
        let table = CombinedTable::from_reader(text.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.rows()[0];
        assert_eq!(first.orbit, Some(905));
        assert_eq!(first.direction, Direction::Inbound);
        assert_eq!(first.density, Some(3e9));
        assert!(first.datetime.is_some());

        let second = &table.rows()[1];
        assert_eq!(second.orbit, None);
        assert!((second.unixtime - 1_450_000_000.0).abs() < 1e-3);
        assert_eq!(second.direction, Direction::Unknown);
        assert_eq!(second.alt_den, None);
    }
}
