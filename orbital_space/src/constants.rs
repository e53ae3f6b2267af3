//! Physical constants for the Earth-Moon system
//!
//! All values are SI: metres, kilograms, seconds.

/// Gravitational constant in m³·kg⁻¹·s⁻²
pub const GRAV_CONSTANT: f64 = 6.6738480e-11;

/// Mean Earth radius in metres
pub const EARTH_RADIUS: f64 = 6.371e6;
/// Mean Moon radius in metres
pub const MOON_RADIUS: f64 = 1.737e6;

/// Earth mass in kilograms
pub const EARTH_MASS: f64 = 5.9742e24;
/// Moon mass in kilograms
pub const MOON_MASS: f64 = 7.3477e22;

/// Sidereal lunar period in seconds
pub const MOON_PERIOD: f64 = 2.3606e6;

/// Astronomical unit in metres
pub const AU: f64 = 1.495_978_707e11;

/// Julian date of the J2000 epoch (2000-01-01 12:00 TT)
pub const J2000_JD: f64 = 2_451_545.0;

/// Julian date of the Unix epoch (1970-01-01 00:00 UTC)
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;
