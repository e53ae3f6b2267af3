//! Body records and the ids that refer to them

use glam::DVec3;
use std::fmt;

/// Handle to a [`GravBody`] owned by a `PhysicsSystem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GravBodyId(usize);

/// Handle to a [`ParticleBody`] owned by a `PhysicsSystem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleBodyId(usize);

impl GravBodyId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl ParticleBodyId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Either kind of body, for queries that accept both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyId {
    Grav(GravBodyId),
    Particle(ParticleBodyId),
}

impl From<GravBodyId> for BodyId {
    fn from(id: GravBodyId) -> Self {
        BodyId::Grav(id)
    }
}

impl From<ParticleBodyId> for BodyId {
    fn from(id: ParticleBodyId) -> Self {
        BodyId::Particle(id)
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyId::Grav(id) => write!(f, "grav body #{}", id.0),
            BodyId::Particle(id) => write!(f, "particle body #{}", id.0),
        }
    }
}

/// A massive body: exerts gravity and is integrated under everyone else's
#[derive(Debug, Clone)]
pub struct GravBody {
    pub id: GravBodyId,
    pub mass: f64,   // kg
    pub radius: f64, // m
    pub pos: DVec3,
    pub vel: DVec3,
    /// Body whose gravity dominates locally; equal to `id` for the root body
    pub soi_parent: GravBodyId,
}

impl GravBody {
    /// Standard gravitational parameter μ = G·m
    pub fn mu(&self, grav_constant: f64) -> f64 {
        grav_constant * self.mass
    }

    pub fn is_root(&self) -> bool {
        self.soi_parent == self.id
    }
}

/// A massless body (e.g. a ship) moved by gravity plus an applied acceleration
#[derive(Debug, Clone)]
pub struct ParticleBody {
    pub id: ParticleBodyId,
    pub pos: DVec3,
    pub vel: DVec3,
    /// Externally applied acceleration for the next step, e.g. thrust
    pub user_acc: DVec3,
}
