//! Quantities derived from the current body states
//!
//! Everything here is a pure function of a snapshot: nothing is integrated
//! and nothing is cached between calls. The world recomputes these every
//! tick after the physics step.

use crate::math::rotate_about_axis;
use crate::physics::GravBody;
use glam::DVec3;
use std::error::Error;
use std::f64::consts::PI;
use std::fmt;

pub use crate::physics::gravity::soi_radius;

/// Below this length a direction is considered undefined
const DEGENERATE_LENGTH: f64 = 1.0e-9;

/// How close to 1 the eccentricity must be to draw a parabola
const PARABOLIC_TOLERANCE: f64 = 1.0e-6;

/// Conics that reach infinity are only drawn over this fraction of their range
const OPEN_CONIC_RANGE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedError {
    /// The bodies coincide, or the velocity is parallel to the separation,
    /// so no orbital plane can be formed
    Degenerate,
    /// No mass to weight by
    ZeroMass,
}

impl fmt::Display for DerivedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degenerate => write!(f, "orbital plane is undefined for this configuration"),
            Self::ZeroMass => write!(f, "total mass is zero"),
        }
    }
}

impl Error for DerivedError {}

/// Mass-weighted mean position, `None` when the masses sum to zero
pub fn center_of_mass(bodies: &[(f64, DVec3)]) -> Option<DVec3> {
    let total: f64 = bodies.iter().map(|(m, _)| m).sum();
    if total <= 0.0 {
        return None;
    }
    let weighted = bodies.iter().fold(DVec3::ZERO, |acc, (m, p)| acc + *p * *m);
    Some(weighted / total)
}

/// The five Lagrange points of a primary/secondary pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagrangePoints {
    pub l1: DVec3,
    pub l2: DVec3,
    pub l3: DVec3,
    /// Leads the secondary by 60°
    pub l4: DVec3,
    /// Trails the secondary by 60°
    pub l5: DVec3,
}

impl LagrangePoints {
    pub fn as_array(&self) -> [DVec3; 5] {
        [self.l1, self.l2, self.l3, self.l4, self.l5]
    }
}

/// Lagrange points in the restricted circular approximation.
///
/// Collinear points use the first-order Hill radius; L4 and L5 sit at the
/// apices of the two equilateral triangles on the primary-secondary line.
pub fn lagrange_points(primary: &GravBody, secondary: &GravBody) -> Result<LagrangePoints, DerivedError> {
    let sep_vec = secondary.pos - primary.pos;
    let sep = sep_vec.length();
    if sep < DEGENERATE_LENGTH {
        return Err(DerivedError::Degenerate);
    }
    let dir = sep_vec / sep;

    let q = secondary.mass / primary.mass;
    let r1 = sep * (q / 3.0).cbrt();
    let r3 = sep * (1.0 + 7.0 * q / 12.0);

    let rel_vel = secondary.vel - primary.vel;
    let normal = rel_vel.normalize_or_zero().cross(dir);
    if normal.length() < DEGENERATE_LENGTH {
        return Err(DerivedError::Degenerate);
    }
    let sixty = PI / 3.0;

    Ok(LagrangePoints {
        l1: secondary.pos - dir * r1,
        l2: secondary.pos + dir * r1,
        l3: primary.pos - dir * r3,
        l4: primary.pos + rotate_about_axis(sep_vec, normal, -sixty),
        l5: primary.pos + rotate_about_axis(sep_vec, normal, sixty),
    })
}

/// e = ((v² − μ/r)·r − (r·v)·v) / μ
pub fn eccentricity_vector(rel_pos: DVec3, rel_vel: DVec3, mu: f64) -> DVec3 {
    let r = rel_pos.length();
    ((rel_vel.length_squared() - mu / r) * rel_pos - rel_pos.dot(rel_vel) * rel_vel) / mu
}

/// ε = v²/2 − μ/r, negative for bound orbits
pub fn specific_orbital_energy(rel_pos: DVec3, rel_vel: DVec3, mu: f64) -> f64 {
    0.5 * rel_vel.length_squared() - mu / rel_pos.length()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConicKind {
    Ellipse,
    Parabola,
    Hyperbola,
}

/// Osculating Keplerian orbit of a body about a focus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitConic {
    /// World position of the attracting body
    pub focus: DVec3,
    pub e: f64,
    /// Semi-latus rectum, m
    pub p: f64,
    /// Unit vector from the focus towards periapsis
    pub x_dir: DVec3,
    /// Completes the in-plane basis in the direction of motion
    pub y_dir: DVec3,
}

impl OrbitConic {
    /// Build the conic from a position and velocity relative to the focus
    pub fn from_relative_state(focus: DVec3, rel_pos: DVec3, rel_vel: DVec3, mu: f64) -> Result<Self, DerivedError> {
        let h = rel_pos.cross(rel_vel);
        if rel_pos.length() < DEGENERATE_LENGTH || h.length() < DEGENERATE_LENGTH {
            return Err(DerivedError::Degenerate);
        }
        if mu <= 0.0 {
            return Err(DerivedError::ZeroMass);
        }

        let e_vec = eccentricity_vector(rel_pos, rel_vel, mu);
        let e = e_vec.length();
        // A circle has no periapsis; measure from the current position instead
        let x_dir = if e > DEGENERATE_LENGTH {
            e_vec / e
        } else {
            rel_pos.normalize()
        };
        let y_dir = h.normalize().cross(x_dir);

        Ok(Self {
            focus,
            e,
            p: h.length_squared() / mu,
            x_dir,
            y_dir,
        })
    }

    /// Osculating orbit of `pos`/`vel` about `parent`
    pub fn about(parent: &GravBody, pos: DVec3, vel: DVec3, grav_constant: f64) -> Result<Self, DerivedError> {
        Self::from_relative_state(parent.pos, pos - parent.pos, vel - parent.vel, parent.mu(grav_constant))
    }

    pub fn kind(&self) -> ConicKind {
        if (self.e - 1.0).abs() < PARABOLIC_TOLERANCE {
            ConicKind::Parabola
        } else if self.e < 1.0 {
            ConicKind::Ellipse
        } else {
            ConicKind::Hyperbola
        }
    }

    pub fn periapsis(&self) -> f64 {
        self.p / (1.0 + self.e)
    }

    /// `None` for open orbits
    pub fn apoapsis(&self) -> Option<f64> {
        (self.kind() == ConicKind::Ellipse).then(|| self.p / (1.0 - self.e))
    }

    /// Largest true anomaly that is drawn on either side of periapsis
    pub fn true_anomaly_limit(&self) -> f64 {
        match self.kind() {
            ConicKind::Ellipse => PI,
            ConicKind::Parabola => PI * OPEN_CONIC_RANGE,
            ConicKind::Hyperbola => (-1.0 / self.e).acos() * OPEN_CONIC_RANGE,
        }
    }

    /// World position at true anomaly `nu`
    pub fn point_at(&self, nu: f64) -> DVec3 {
        let r = self.p / (1.0 + self.e * nu.cos());
        self.focus + (self.x_dir * nu.cos() + self.y_dir * nu.sin()) * r
    }

    /// `count` world points evenly spaced in true anomaly across the drawable range
    pub fn sample_points(&self, count: usize) -> Vec<DVec3> {
        if count < 2 {
            return Vec::new();
        }
        let limit = self.true_anomaly_limit();
        let step = 2.0 * limit / (count - 1) as f64;
        (0..count).map(|i| self.point_at(-limit + step * i as f64)).collect()
    }
}
