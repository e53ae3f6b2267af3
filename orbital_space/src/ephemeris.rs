//! Analytic positions from Keplerian elements, plus the calendar glue
//!
//! Elements follow the JPL "approximate positions of the planets" tables:
//! values at J2000 with linear rates per Julian century, and optional
//! `b, c, s, f` correction terms on the mean anomaly. Angles are in degrees
//! until the final rotation.

use crate::constants::{AU, DAYS_PER_CENTURY, J2000_JD, SECONDS_PER_DAY, UNIX_EPOCH_JD};
use crate::math::wrap;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use glam::{DQuat, DVec3};
use std::error::Error;
use std::fmt;

/// Kepler iterations stop once the correction drops below this (degrees)
pub const KEPLER_TOLERANCE_DEG: f64 = 1.0e-5;
pub const KEPLER_MAX_ITERATIONS: u32 = 64;

/// Session clock origin: 2025-03-15 00:00 UTC plus 1753 hours
pub const GAME_START_DATE: (i32, u32, u32) = (2025, 3, 15);
pub const GAME_START_OFFSET_HOURS: i64 = 1753;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeplerError {
    /// Hit the iteration cap while the correction was still `last_delta_deg`
    DidNotConverge { iterations: u32, last_delta_deg: f64 },
    /// Elliptic Kepler equation does not apply for e ≥ 1
    Unbound { eccentricity: f64 },
}

impl fmt::Display for KeplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DidNotConverge { iterations, last_delta_deg } => write!(
                f,
                "Kepler solver did not converge after {iterations} iterations (last step {last_delta_deg:e}°)"
            ),
            Self::Unbound { eccentricity } => {
                write!(f, "eccentricity {eccentricity} is not elliptic")
            }
        }
    }
}

impl Error for KeplerError {}

/// One set of the six classical elements (or their rates)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementSet {
    /// a, AU
    pub semi_major_axis: f64,
    /// e
    pub eccentricity: f64,
    /// I, degrees
    pub inclination: f64,
    /// L, degrees
    pub mean_longitude: f64,
    /// ϖ, degrees
    pub longitude_of_perihelion: f64,
    /// Ω, degrees
    pub longitude_of_ascending_node: f64,
}

impl ElementSet {
    fn advanced(&self, rates: &ElementSet, centuries: f64) -> ElementSet {
        ElementSet {
            semi_major_axis: self.semi_major_axis + rates.semi_major_axis * centuries,
            eccentricity: self.eccentricity + rates.eccentricity * centuries,
            inclination: self.inclination + rates.inclination * centuries,
            mean_longitude: self.mean_longitude + rates.mean_longitude * centuries,
            longitude_of_perihelion: self.longitude_of_perihelion + rates.longitude_of_perihelion * centuries,
            longitude_of_ascending_node: self.longitude_of_ascending_node
                + rates.longitude_of_ascending_node * centuries,
        }
    }
}

/// Elements at J2000 with per-century rates and mean anomaly corrections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerianElements {
    pub at_epoch: ElementSet,
    pub per_century: ElementSet,
    pub b: f64,
    pub c: f64,
    pub s: f64,
    pub f: f64,
}

impl KeplerianElements {
    /// Earth-Moon barycentre about the Sun, valid 1800 AD - 2050 AD
    pub const EARTH_MOON_BARYCENTER: KeplerianElements = KeplerianElements {
        at_epoch: ElementSet {
            semi_major_axis: 1.000_002_61,
            eccentricity: 0.016_711_23,
            inclination: -0.000_015_31,
            mean_longitude: 100.464_571_66,
            longitude_of_perihelion: 102.937_681_93,
            longitude_of_ascending_node: 0.0,
        },
        per_century: ElementSet {
            semi_major_axis: 0.000_005_62,
            eccentricity: -0.000_043_92,
            inclination: -0.012_946_68,
            mean_longitude: 35_999.372_449_81,
            longitude_of_perihelion: 0.323_273_64,
            longitude_of_ascending_node: 0.0,
        },
        b: 0.0,
        c: 0.0,
        s: 0.0,
        f: 0.0,
    };

    /// Heliocentric ecliptic position in AU at `julian_date`
    pub fn position_at(&self, julian_date: f64) -> Result<DVec3, KeplerError> {
        let t = (julian_date - J2000_JD) / DAYS_PER_CENTURY;
        let el = self.at_epoch.advanced(&self.per_century, t);

        let arg_of_perihelion = el.longitude_of_perihelion - el.longitude_of_ascending_node;
        let mean_anomaly = el.mean_longitude - el.longitude_of_perihelion
            + self.b * t * t
            + self.c * (self.f * t).to_radians().cos()
            + self.s * (self.f * t).to_radians().sin();
        let mean_anomaly = wrap(mean_anomaly, -180.0, 180.0);

        let e = el.eccentricity;
        let ecc_anomaly = solve_eccentric_anomaly(mean_anomaly, e)?.to_radians();

        let a = el.semi_major_axis;
        let in_plane = DVec3::new(
            a * (ecc_anomaly.cos() - e),
            a * (1.0 - e * e).sqrt() * ecc_anomaly.sin(),
            0.0,
        );

        let rotation = DQuat::from_rotation_z(el.longitude_of_ascending_node.to_radians())
            * DQuat::from_rotation_x(el.inclination.to_radians())
            * DQuat::from_rotation_z(arg_of_perihelion.to_radians());
        Ok(rotation * in_plane)
    }

    /// Same as [`KeplerianElements::position_at`] in metres
    pub fn position_at_m(&self, julian_date: f64) -> Result<DVec3, KeplerError> {
        Ok(self.position_at(julian_date)? * AU)
    }
}

/// Solve M = E − e·sin E for E, all angles in degrees
pub fn solve_eccentric_anomaly(mean_anomaly_deg: f64, eccentricity: f64) -> Result<f64, KeplerError> {
    solve_eccentric_anomaly_capped(mean_anomaly_deg, eccentricity, KEPLER_MAX_ITERATIONS)
}

/// [`solve_eccentric_anomaly`] with an explicit iteration cap
pub fn solve_eccentric_anomaly_capped(
    mean_anomaly_deg: f64,
    eccentricity: f64,
    max_iterations: u32,
) -> Result<f64, KeplerError> {
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(KeplerError::Unbound { eccentricity });
    }

    let e_deg = eccentricity.to_degrees();
    let m = mean_anomaly_deg;
    let mut ecc = m + e_deg * m.to_radians().sin();
    let mut delta = f64::INFINITY;

    for _ in 0..max_iterations {
        let delta_m = m - (ecc - e_deg * ecc.to_radians().sin());
        delta = delta_m / (1.0 - eccentricity * ecc.to_radians().cos());
        ecc += delta;
        if delta.abs() <= KEPLER_TOLERANCE_DEG {
            return Ok(ecc);
        }
    }

    Err(KeplerError::DidNotConverge {
        iterations: max_iterations,
        last_delta_deg: delta,
    })
}

/// Inverse of the Kepler equation, degrees in and out
pub fn mean_anomaly_from_eccentric(ecc_anomaly_deg: f64, eccentricity: f64) -> f64 {
    ecc_anomaly_deg - eccentricity.to_degrees() * ecc_anomaly_deg.to_radians().sin()
}

/// Ecliptic frame (z towards the ecliptic north pole) to world frame (y up)
pub fn ecliptic_to_world(v: DVec3) -> DVec3 {
    DVec3::new(v.x, v.z, -v.y)
}

/// World-frame unit vector from the Earth-Moon system towards the Sun
pub fn sun_direction(julian_date: f64) -> Result<DVec3, KeplerError> {
    let barycentre = KeplerianElements::EARTH_MOON_BARYCENTER.position_at(julian_date)?;
    Ok(ecliptic_to_world(-barycentre).normalize_or_zero())
}

pub fn julian_date_from_unix_seconds(unix_seconds: f64) -> f64 {
    unix_seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// Wall-clock instant at which simulation time zero sits
pub fn game_start() -> DateTime<Utc> {
    let (year, month, day) = GAME_START_DATE;
    let midnight = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(DateTime::UNIX_EPOCH, |start| start.and_utc());
    midnight + Duration::hours(GAME_START_OFFSET_HOURS)
}

/// UTC instant of a point in simulation time (seconds since start)
pub fn date_at(sim_time: f64) -> DateTime<Utc> {
    game_start() + Duration::milliseconds((sim_time * 1000.0) as i64)
}

/// Julian date of a point in simulation time
pub fn julian_date_at(sim_time: f64) -> f64 {
    let since_epoch = date_at(sim_time) - DateTime::UNIX_EPOCH;
    julian_date_from_unix_seconds(since_epoch.num_milliseconds() as f64 / 1000.0)
}

/// "YYYY-MM-DD hh:mm:ss" for a point in simulation time
pub fn calendar_string(sim_time: f64) -> String {
    date_at(sim_time).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn kepler_round_trip() {
        for &e in &[0.0, 0.0167, 0.2056, 0.6, 0.9] {
            for &ecc in &[-170.0, -90.0, -12.5, 0.0, 33.0, 90.0, 179.0] {
                let m = mean_anomaly_from_eccentric(ecc, e);
                let solved = solve_eccentric_anomaly(m, e).unwrap();
                assert_abs_diff_eq!(solved, ecc, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn circular_orbit_anomalies_match() {
        assert_abs_diff_eq!(solve_eccentric_anomaly(42.0, 0.0).unwrap(), 42.0, epsilon = 1e-9);
    }

    #[test]
    fn open_orbits_are_rejected() {
        assert_eq!(
            solve_eccentric_anomaly(10.0, 1.0),
            Err(KeplerError::Unbound { eccentricity: 1.0 })
        );
        assert!(solve_eccentric_anomaly(10.0, -0.1).is_err());
    }

    #[test]
    fn iteration_cap_is_reported() {
        match solve_eccentric_anomaly_capped(1.0, 0.99, 1) {
            Err(KeplerError::DidNotConverge { iterations, last_delta_deg }) => {
                assert_eq!(iterations, 1);
                assert!(last_delta_deg.abs() > KEPLER_TOLERANCE_DEG);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
    }

    #[test]
    fn barycentre_is_about_one_au_out() {
        let elements = KeplerianElements::EARTH_MOON_BARYCENTER;
        for jd in [J2000_JD, J2000_JD + 100.0, julian_date_at(0.0)] {
            let r = elements.position_at(jd).unwrap().length();
            assert!((0.98..1.02).contains(&r), "distance {r} AU at JD {jd}");
        }
        let m = elements.position_at_m(J2000_JD).unwrap().length();
        assert_relative_eq!(m, elements.position_at(J2000_JD).unwrap().length() * AU, max_relative = 1e-12);
    }

    #[test]
    fn barycentre_stays_near_the_ecliptic() {
        let p = KeplerianElements::EARTH_MOON_BARYCENTER.position_at(J2000_JD + 1234.5).unwrap();
        assert!(p.z.abs() < 1.0e-3);
    }

    #[test]
    fn early_january_is_near_perihelion() {
        // Perihelion falls in the first days of January
        let elements = KeplerianElements::EARTH_MOON_BARYCENTER;
        let january = elements.position_at(J2000_JD + 2.0).unwrap().length();
        let july = elements.position_at(J2000_JD + 184.0).unwrap().length();
        assert!(january < 0.985 && july > 1.015, "january {january}, july {july}");
    }

    #[test]
    fn sun_direction_is_unit_and_horizontal() {
        let dir = sun_direction(julian_date_at(0.0)).unwrap();
        assert_relative_eq!(dir.length(), 1.0, epsilon = 1e-12);
        assert!(dir.y.abs() < 1.0e-3);
    }

    #[test]
    fn julian_date_of_j2000() {
        // 2000-01-01 12:00:00 UTC
        assert_eq!(julian_date_from_unix_seconds(946_728_000.0), J2000_JD);
        assert_eq!(julian_date_from_unix_seconds(0.0), UNIX_EPOCH_JD);
    }

    #[test]
    fn calendar_starts_at_game_epoch() {
        assert_eq!(calendar_string(0.0), "2025-05-27 01:00:00");
        assert_eq!(calendar_string(23.0 * 3600.0 + 61.5), "2025-05-28 00:01:01");
        assert_eq!(calendar_string(7.0 * SECONDS_PER_DAY), "2025-06-03 01:00:00");
    }

    #[test]
    fn game_start_julian_date() {
        // 2025-05-27 01:00 UTC
        assert_abs_diff_eq!(julian_date_at(0.0), 2_460_822.541_666_7, epsilon = 1e-6);
        assert_abs_diff_eq!(julian_date_at(SECONDS_PER_DAY) - julian_date_at(0.0), 1.0, epsilon = 1e-8);
    }
}
