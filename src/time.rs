use hifitime::{Epoch, TimeScale};
use std::str::FromStr;

use crate::constants::UnixSeconds;

/// Transformation from a unix timestamp (seconds since 1970-01-01 UTC) to an [`Epoch`]
///
/// Argument
/// --------
/// * `unixtime`: seconds since the unix epoch, as stored in the EUVM `location_info`
///
/// Return
/// ------
/// * `Some(epoch)` for a finite timestamp, `None` otherwise (missing value)
pub fn epoch_from_unix(unixtime: UnixSeconds) -> Option<Epoch> {
    unixtime
        .is_finite()
        .then(|| Epoch::from_unix_seconds(unixtime))
}

/// Format an epoch as `YYYY-MM-DD HH:MM:SS` in UTC
///
/// Sub-second digits are truncated, which is the layout used by the combined CSV.
pub fn format_utc_datetime(epoch: &Epoch) -> String {
    let (y, m, d, hh, mm, ss, _) = epoch.to_gregorian_utc();
    format!("{y:04}-{m:02}-{d:02} {hh:02}:{mm:02}:{ss:02}")
}

/// Transformation from a `YYYY-MM-DD HH:MM:SS` UTC string to an [`Epoch`]
///
/// Argument
/// --------
/// * `date_str`: the date, a `T` separator is also accepted
///
/// Return
/// ------
/// * the epoch, or a message describing the first malformed component
pub fn parse_utc_datetime(date_str: &str) -> Result<Epoch, String> {
    let normalized = date_str.trim().replace('T', " ");
    let (date, clock) = normalized
        .split_once(' ')
        .ok_or_else(|| format!("Invalid format, expected: YYYY-MM-DD HH:MM:SS, got '{date_str}'"))?;

    let ymd: Vec<&str> = date.split('-').collect();
    let hms: Vec<&str> = clock.split(':').collect();
    if ymd.len() != 3 || hms.len() != 3 {
        return Err(format!(
            "Invalid format, expected: YYYY-MM-DD HH:MM:SS, got '{date_str}'"
        ));
    }

    let year = i32::from_str(ymd[0]).map_err(|_| "invalid year")?;
    let month = u8::from_str(ymd[1]).map_err(|_| "invalid month")?;
    let day = u8::from_str(ymd[2]).map_err(|_| "invalid day")?;
    let hour = u8::from_str(hms[0]).map_err(|_| "invalid hour")?;
    let minute = u8::from_str(hms[1]).map_err(|_| "invalid minute")?;
    let second = u8::from_str(hms[2]).map_err(|_| "invalid second")?;

    Epoch::maybe_from_gregorian(year, month, day, hour, minute, second, 0, TimeScale::UTC)
        .map_err(|e| format!("invalid date '{date_str}': {e}"))
}

/// Days elapsed since J2000.0 on the TT scale, the time argument of the Mars seasonal series.
pub fn days_since_j2000_tt(epoch: &Epoch) -> f64 {
    epoch.to_jde_tt_days() - crate::constants::J2000_JD
}
