//! Gravity field evaluation
//!
//! Pairwise inverse-square acceleration from a handful of point masses.
//! Coincident pairs are not allowed to produce NaN: the offending term is
//! dropped and the caller is told about it through [`GravityError`].

use glam::DVec3;
use std::error::Error;
use std::fmt;

/// Separations below this (metres) are treated as coincident
pub const MIN_SEPARATION: f64 = 1.0e-3;

/// A gravity source as seen by the field evaluator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMass {
    pub pos: DVec3,
    pub mass: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GravityError {
    /// The target sits on top of `source`. `partial` is the acceleration
    /// summed over every other (non-coincident) source.
    Coincident { source: usize, partial: DVec3 },
}

impl GravityError {
    /// Best available acceleration with the degenerate terms left out
    pub fn partial(&self) -> DVec3 {
        match self {
            Self::Coincident { partial, .. } => *partial,
        }
    }
}

impl fmt::Display for GravityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coincident { source, .. } => write!(
                f,
                "target coincides with gravity source {} (separation below {} m)",
                source, MIN_SEPARATION
            ),
        }
    }
}

impl Error for GravityError {}

/// Net gravitational acceleration at `target` from all `sources` except `exclude`.
///
/// a = Σ G·mᵢ·(posᵢ − target) / |posᵢ − target|³
pub fn acceleration_at(
    target: DVec3,
    sources: &[PointMass],
    exclude: Option<usize>,
    grav_constant: f64,
) -> Result<DVec3, GravityError> {
    let mut acc = DVec3::ZERO;
    let mut coincident = None;

    for (i, source) in sources.iter().enumerate() {
        if Some(i) == exclude {
            continue;
        }

        let r = source.pos - target;
        let dist_sq = r.length_squared();
        if dist_sq < MIN_SEPARATION * MIN_SEPARATION {
            coincident.get_or_insert(i);
            continue;
        }

        let dist = dist_sq.sqrt();
        acc += r * (grav_constant * source.mass / (dist_sq * dist));
    }

    match coincident {
        Some(source) => Err(GravityError::Coincident { source, partial: acc }),
        None => Ok(acc),
    }
}

/// Laplace sphere-of-influence radius of a body of mass `m` orbiting a
/// primary of mass `big_m` at distance `a`: r = a·(m/M)^(2/5)
pub fn soi_radius(a: f64, m: f64, big_m: f64) -> f64 {
    a * (m / big_m).powf(0.4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EARTH_MASS, GRAV_CONSTANT, MOON_MASS};
    use approx::assert_relative_eq;

    fn earth_at_origin() -> PointMass {
        PointMass {
            pos: DVec3::ZERO,
            mass: EARTH_MASS,
        }
    }

    #[test]
    fn inverse_square_magnitude_and_direction() {
        let target = DVec3::new(7.0e6, 0.0, 0.0);
        let acc = acceleration_at(target, &[earth_at_origin()], None, GRAV_CONSTANT).unwrap();

        let expected = GRAV_CONSTANT * EARTH_MASS / (7.0e6 * 7.0e6);
        assert_relative_eq!(acc.length(), expected, max_relative = 1e-12);
        assert!(acc.x < 0.0, "gravity must point back at the source");
        assert_relative_eq!(acc.y, 0.0);
        assert_relative_eq!(acc.z, 0.0);
    }

    #[test]
    fn superposition_cancels_between_equal_masses() {
        let sources = [
            PointMass { pos: DVec3::new(-1.0e7, 0.0, 0.0), mass: EARTH_MASS },
            PointMass { pos: DVec3::new(1.0e7, 0.0, 0.0), mass: EARTH_MASS },
        ];
        let acc = acceleration_at(DVec3::ZERO, &sources, None, GRAV_CONSTANT).unwrap();
        assert_relative_eq!(acc.length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn excluded_source_contributes_nothing() {
        let sources = [earth_at_origin(), PointMass { pos: DVec3::new(0.0, 0.0, 3.8e8), mass: MOON_MASS }];
        // Earth evaluating its own field: only the Moon should pull.
        let acc = acceleration_at(DVec3::ZERO, &sources, Some(0), GRAV_CONSTANT).unwrap();
        assert!(acc.z > 0.0);
        assert_relative_eq!(acc.z, GRAV_CONSTANT * MOON_MASS / (3.8e8 * 3.8e8), max_relative = 1e-12);
    }

    #[test]
    fn coincident_source_is_reported_not_nan() {
        let moon = PointMass { pos: DVec3::new(0.0, 0.0, 3.8e8), mass: MOON_MASS };
        let err = acceleration_at(DVec3::ZERO, &[earth_at_origin(), moon], None, GRAV_CONSTANT)
            .unwrap_err();

        match err {
            GravityError::Coincident { source, partial } => {
                assert_eq!(source, 0);
                assert!(partial.is_finite());
                assert!(partial.z > 0.0, "remaining terms are still summed");
            }
        }
        assert!(err.to_string().contains("coincides"));
    }

    #[test]
    fn moon_soi_radius() {
        // Roughly 66 000 km for the Earth-Moon pair
        let r = soi_radius(3.844e8, MOON_MASS, EARTH_MASS);
        assert!(r > 6.0e7 && r < 7.0e7, "unexpected SOI radius {r}");
    }
}
