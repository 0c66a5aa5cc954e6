//! # Constants and type definitions for euvmt
//!
//! This module centralizes the **physical constants**, **unit conversions**, and
//! **common type aliases** used throughout the crate, together with the default
//! policy values of the binning pipeline.
//!
//! ## Overview
//!
//! - Mars atmospheric constants used by the stability transform
//! - Mars orbital constants used by the solar geometry helpers
//! - Unit conversions (degrees ↔ radians, km ↔ m, hours ↔ degrees)
//! - Default orbit window and file naming conventions
//! - Core type aliases used across the crate

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Mars surface gravitational acceleration in m/s²
pub const MARS_GRAVITY: f64 = 3.71;

/// Specific heat at constant pressure of CO₂ in J/(kg·K)
pub const CO2_CP: f64 = 735.0;

/// Mars obliquity in degrees, used for the subsolar declination
pub const MARS_OBLIQUITY: f64 = 25.19;

/// Julian date of the J2000.0 epoch (TT)
pub const J2000_JD: f64 = 2_451_545.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Kilometers → meters
pub const KM_TO_M: f64 = 1000.0;

/// Local solar time hours → hour angle degrees
pub const DEG_PER_HOUR: f64 = 15.0;

// -------------------------------------------------------------------------------------------------
// Pipeline policy defaults
// -------------------------------------------------------------------------------------------------

/// Lower bound (exclusive) of the default orbit window
pub const DEFAULT_ORBIT_MIN: u32 = 700;

/// Upper bound (exclusive) of the default orbit window
pub const DEFAULT_ORBIT_MAX: u32 = 1000;

/// Default number of horizontal bins
pub const DEFAULT_XBINS: usize = 10;

/// Default altitude bin step (km)
pub const DEFAULT_ALT_STEP_KM: f64 = 5.0;

/// Default number of geometric pressure bins
pub const DEFAULT_PRESSURE_BINS: usize = 50;

/// Prefix of the versioned data directory
pub const EUVM_DIR_PREFIX: &str = "euvm_temperatures";

/// Default location of the combined CSV export
pub const DEFAULT_COMBINED_CSV: &str = "data/all_euvm.csv";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Distance in meters
pub type Meter = f64;
/// Temperature in Kelvin
pub type Kelvin = f64;
/// Pressure in Pascal
pub type Pascal = f64;
/// Local solar time in hours
pub type Hour = f64;
/// Seconds since 1970-01-01T00:00:00 UTC
pub type UnixSeconds = f64;

/// `HashMap` with the `ahash` hasher, used for per-bin accumulators
pub type FastHashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
