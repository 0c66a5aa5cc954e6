//! # Observations
//!
//! One [`Observation`] is a single sample of an EUVM occultation profile: a
//! temperature retrieved at a tangent altitude, the matching pressure, the
//! (optional) density sample at the same row index, and the geolocation and
//! time of the occultation broadcast to every row of the profile.
//!
//! ## Overview
//! -----------------
//! * [`Observation`] – Immutable sample, with derived seasonal/illumination accessors.
//! * [`Location`] – Per-profile geolocation (`location_info` in the save files).
//! * [`OrbitTag`] / [`Direction`] – Orbit number and pass direction encoded in the file name.
//! * [`parse_orbit_tag`] – Lenient file name parser (never fails).
//! * [`profile_reader`] – Typed mapping of an IDL SAVE file onto observations.
//!
//! Missing instrument values are carried as `NaN`, the same convention as the
//! on-disk arrays. Rows carrying them are removed later by
//! [`CombinedTable::drop_invalid`](crate::table::CombinedTable::drop_invalid).
use std::fmt;

use camino::Utf8Path;
use hifitime::Epoch;

use crate::constants::{Degree, Hour, Kelvin, Kilometer, Pascal, UnixSeconds};
use crate::geometry::{solar_longitude, solar_zenith_angle};
use crate::time::epoch_from_unix;

pub mod profile_reader;

/// Pass direction of an occultation: inbound (`i`) or outbound (`o`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    Inbound,
    Outbound,
    #[default]
    Unknown,
}

impl Direction {
    /// One-letter code used in the combined CSV (`i`, `o`, empty when unknown).
    pub fn code(&self) -> &'static str {
        match self {
            Direction::Inbound => "i",
            Direction::Outbound => "o",
            Direction::Unknown => "",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "i" => Direction::Inbound,
            "o" => Direction::Outbound,
            _ => Direction::Unknown,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
            Direction::Unknown => write!(f, "unknown"),
        }
    }
}

/// Orbit number and direction parsed from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrbitTag {
    pub orbit: Option<u32>,
    pub direction: Direction,
}

/// Extract the orbit number and pass direction from an EUVM file name.
///
/// The basename is split on `_` and the second token examined: if it contains
/// `in` the orbit is the text before the first `i` (inbound), else if it
/// contains `out` the orbit is the text before the first `o` (outbound).
///
/// Arguments
/// -----------------
/// * `filename`: File name or full path, e.g. `temp_888out_v01r00.sav`.
///
/// Return
/// ----------
/// * The parsed [`OrbitTag`]. A missing token or a non-numeric orbit yields
///   `OrbitTag { orbit: None, direction: Direction::Unknown }`.
pub fn parse_orbit_tag(filename: &str) -> OrbitTag {
    let basename = Utf8Path::new(filename).file_name().unwrap_or(filename);
    let Some(token) = basename.split('_').nth(1) else {
        return OrbitTag::default();
    };

    let (direction, separator) = if token.contains("in") {
        (Direction::Inbound, 'i')
    } else if token.contains("out") {
        (Direction::Outbound, 'o')
    } else {
        return OrbitTag::default();
    };

    let digits = token.split(separator).next().unwrap_or_default();
    match digits.parse::<u32>() {
        Ok(orbit) => OrbitTag {
            orbit: Some(orbit),
            direction,
        },
        Err(_) => {
            log::debug!("no orbit number in '{basename}' (token '{token}')");
            OrbitTag::default()
        }
    }
}

/// Geolocation and time of one occultation profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: Degree,
    pub lon: Degree,
    pub lst: Hour,
    pub unixtime: UnixSeconds,
}

/// A single temperature sample of an EUVM profile.
///
/// # Fields
///
/// * `alt_temp` - Tangent altitude of the temperature sample (km)
/// * `temp` - Temperature (K)
/// * `pressure` - Pressure (Pa)
/// * `alt_den`, `density` - Density sample at the same row index, absent when the density profile is shorter
/// * `lat`, `lon`, `lst`, `unixtime` - Profile geolocation, identical for every row of a profile
/// * `datetime` - UTC epoch derived from `unixtime`, absent when the timestamp is not finite
/// * `orbit`, `direction` - Parsed from the file name
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub alt_temp: Kilometer,
    pub temp: Kelvin,
    pub pressure: Pascal,
    pub alt_den: Option<Kilometer>,
    pub density: Option<f64>,
    pub lat: Degree,
    pub lon: Degree,
    pub lst: Hour,
    pub unixtime: UnixSeconds,
    pub datetime: Option<Epoch>,
    pub orbit: Option<u32>,
    pub direction: Direction,
}

impl Observation {
    /// Create a new observation
    ///
    /// Arguments
    /// ---------
    /// * `alt_temp`, `temp`: altitude (km) and temperature (K) of the sample
    /// * `pressure`: pressure (Pa) at the same row
    /// * `density`: `(alt_den, density)` at the same row, if any
    /// * `location`: geolocation of the profile
    /// * `tag`: orbit number and direction of the file
    ///
    /// Return
    /// ------
    /// * a new Observation, with `datetime` derived from `location.unixtime`
    pub fn new(
        alt_temp: Kilometer,
        temp: Kelvin,
        pressure: Pascal,
        density: Option<(Kilometer, f64)>,
        location: &Location,
        tag: OrbitTag,
    ) -> Self {
        Observation {
            alt_temp,
            temp,
            pressure,
            alt_den: density.map(|d| d.0),
            density: density.map(|d| d.1),
            lat: location.lat,
            lon: location.lon,
            lst: location.lst,
            unixtime: location.unixtime,
            datetime: epoch_from_unix(location.unixtime),
            orbit: tag.orbit,
            direction: tag.direction,
        }
    }

    pub fn location(&self) -> Location {
        Location {
            lat: self.lat,
            lon: self.lon,
            lst: self.lst,
            unixtime: self.unixtime,
        }
    }

    pub fn orbit_tag(&self) -> OrbitTag {
        OrbitTag {
            orbit: self.orbit,
            direction: self.direction,
        }
    }

    /// Mars solar longitude at the time of the profile, `NaN` without a valid timestamp.
    pub fn solar_longitude(&self) -> Degree {
        self.datetime
            .as_ref()
            .map(solar_longitude)
            .unwrap_or(f64::NAN)
    }

    /// Solar zenith angle at the profile location, `NaN` without a valid timestamp.
    pub fn solar_zenith_angle(&self) -> Degree {
        solar_zenith_angle(self.lat, self.lst, self.solar_longitude())
    }
}

#[cfg(test)]
mod test_observation {
    use super::*;

    #[test]
    fn test_parse_orbit_tag() {
        assert_eq!(
            parse_orbit_tag("temp_888out_v01r00.sav"),
            OrbitTag {
                orbit: Some(888),
                direction: Direction::Outbound
            }
        );
        assert_eq!(
            parse_orbit_tag("/data/euvm_temperatures_v01r00/temp_42in_v01r00.sav"),
            OrbitTag {
                orbit: Some(42),
                direction: Direction::Inbound
            }
        );
    }

    #[test]
    fn test_parse_orbit_tag_degrades_to_unknown() {
        for name in ["temp.sav", "temp_888_v01r00.sav", "temp_abcin_v01.sav", ""] {
            assert_eq!(parse_orbit_tag(name), OrbitTag::default(), "{name}");
        }
    }

    #[test]
    fn test_direction_codes() {
        for d in [Direction::Inbound, Direction::Outbound, Direction::Unknown] {
            assert_eq!(Direction::from_code(d.code()), d);
        }
        assert_eq!(Direction::from_code("x"), Direction::Unknown);
    }

    #[test]
    fn test_new_observation() {
        let location = Location {
            lat: 10.0,
            lon: 20.0,
            lst: 6.0,
            unixtime: 1_450_000_000.0,
        };
        let tag = parse_orbit_tag("temp_900in_v01r00.sav");
        let obs = Observation::new(120.0, 150.0, 1e-4, Some((121.0, 3.0e10)), &location, tag);

        assert_eq!(obs.alt_den, Some(121.0));
        assert_eq!(obs.density, Some(3.0e10));
        assert_eq!(obs.orbit, Some(900));
        assert_eq!(obs.location(), location);
        assert!(obs.datetime.is_some());
        assert!((0.0..360.0).contains(&obs.solar_longitude()));
        assert!((0.0..=180.0).contains(&obs.solar_zenith_angle()));

        let missing_time = Location {
            unixtime: f64::NAN,
            ..location
        };
        let obs = Observation::new(120.0, 150.0, 1e-4, None, &missing_time, tag);
        assert!(obs.datetime.is_none());
        assert!(obs.solar_longitude().is_nan());
        assert!(obs.solar_zenith_angle().is_nan());
        assert_eq!(obs.alt_den, None);
    }
}
