//! Physics system: owns every body and advances them once per tick
//!
//! Bodies live in dense vectors and are referred to from the outside only by
//! the typed ids handed out by `make_*`. Ids are indices, allocated in
//! order and never reused (the roster is fixed for a session).

pub mod body;
pub mod gravity;
pub mod integrator;

pub use body::{BodyId, GravBody, GravBodyId, ParticleBody, ParticleBodyId};
pub use gravity::{GravityError, PointMass};
pub use integrator::{IntegrationMethod, PhaseState};

use glam::DVec3;
use std::error::Error;
use std::fmt;

/// Invalid body parameters passed to a `make_*` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsError {
    NonPositiveMass(f64),
    NegativeRadius(f64),
    NonFiniteState,
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveMass(m) => write!(f, "gravitating body mass must be positive, got {m}"),
            Self::NegativeRadius(r) => write!(f, "body radius must not be negative, got {r}"),
            Self::NonFiniteState => write!(f, "body position and velocity must be finite"),
        }
    }
}

impl Error for PhysicsError {}

/// What happened during one `update`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Bodies whose acceleration hit a coincident source at some stage.
    /// Their coincident terms were skipped for this step.
    pub degenerate: Vec<BodyId>,
}

impl StepReport {
    pub fn is_clean(&self) -> bool {
        self.degenerate.is_empty()
    }
}

pub struct PhysicsSystem {
    grav_constant: f64,
    grav_bodies: Vec<GravBody>,
    particle_bodies: Vec<ParticleBody>,
}

impl PhysicsSystem {
    pub fn new(grav_constant: f64) -> Self {
        Self {
            grav_constant,
            grav_bodies: Vec::new(),
            particle_bodies: Vec::new(),
        }
    }

    pub fn grav_constant(&self) -> f64 {
        self.grav_constant
    }

    /// Register a massive body. It starts as its own SOI parent.
    pub fn make_grav_body(
        &mut self,
        mass: f64,
        radius: f64,
        pos: DVec3,
        vel: DVec3,
    ) -> Result<GravBodyId, PhysicsError> {
        if !(mass > 0.0) {
            return Err(PhysicsError::NonPositiveMass(mass));
        }
        if !(radius >= 0.0) {
            return Err(PhysicsError::NegativeRadius(radius));
        }
        if !pos.is_finite() || !vel.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }

        let id = GravBodyId::new(self.grav_bodies.len());
        self.grav_bodies.push(GravBody {
            id,
            mass,
            radius,
            pos,
            vel,
            soi_parent: id,
        });
        Ok(id)
    }

    /// Register a massless body with no applied acceleration
    pub fn make_particle_body(&mut self, pos: DVec3, vel: DVec3) -> Result<ParticleBodyId, PhysicsError> {
        if !pos.is_finite() || !vel.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }

        let id = ParticleBodyId::new(self.particle_bodies.len());
        self.particle_bodies.push(ParticleBody {
            id,
            pos,
            vel,
            user_acc: DVec3::ZERO,
        });
        Ok(id)
    }

    pub fn grav_body(&self, id: GravBodyId) -> &GravBody {
        &self.grav_bodies[id.index()]
    }

    pub fn grav_body_mut(&mut self, id: GravBodyId) -> &mut GravBody {
        &mut self.grav_bodies[id.index()]
    }

    pub fn particle_body(&self, id: ParticleBodyId) -> &ParticleBody {
        &self.particle_bodies[id.index()]
    }

    pub fn particle_body_mut(&mut self, id: ParticleBodyId) -> &mut ParticleBody {
        &mut self.particle_bodies[id.index()]
    }

    pub fn num_grav_bodies(&self) -> usize {
        self.grav_bodies.len()
    }

    pub fn num_particle_bodies(&self) -> usize {
        self.particle_bodies.len()
    }

    /// Position of either kind of body
    pub fn position(&self, id: impl Into<BodyId>) -> DVec3 {
        match id.into() {
            BodyId::Grav(id) => self.grav_body(id).pos,
            BodyId::Particle(id) => self.particle_body(id).pos,
        }
    }

    /// Velocity of either kind of body
    pub fn velocity(&self, id: impl Into<BodyId>) -> DVec3 {
        match id.into() {
            BodyId::Grav(id) => self.grav_body(id).vel,
            BodyId::Particle(id) => self.particle_body(id).vel,
        }
    }

    /// First body that is its own SOI parent
    pub fn root_grav_body(&self) -> Option<&GravBody> {
        self.grav_bodies.iter().find(|b| b.is_root())
    }

    /// The massive body that serves as the local gravitational reference.
    ///
    /// A gravitating body resolves to its `soi_parent`; a particle resolves
    /// to the root body. This is a lookup, not a distance search; see
    /// [`PhysicsSystem::dominant_grav_body`] for that.
    pub fn find_soi_grav_body(&self, body: impl Into<BodyId>) -> Option<&GravBody> {
        match body.into() {
            BodyId::Grav(id) => Some(self.grav_body(self.grav_body(id).soi_parent)),
            BodyId::Particle(_) => self.root_grav_body(),
        }
    }

    /// The body whose Laplace sphere of influence contains `pos`, picking
    /// the smallest sphere when several do. Falls back to the root body.
    pub fn dominant_grav_body(&self, pos: DVec3) -> Option<&GravBody> {
        let mut best: Option<(&GravBody, f64)> = None;

        for body in self.grav_bodies.iter().filter(|b| !b.is_root()) {
            let parent = self.grav_body(body.soi_parent);
            let a = (body.pos - parent.pos).length();
            let r_soi = gravity::soi_radius(a, body.mass, parent.mass);
            if (pos - body.pos).length() < r_soi && best.map_or(true, |(_, r)| r_soi < r) {
                best = Some((body, r_soi));
            }
        }

        best.map(|(b, _)| b).or_else(|| self.root_grav_body())
    }

    /// Sources as seen by the field evaluator, in grav body id order
    pub fn point_masses(&self) -> Vec<PointMass> {
        self.grav_bodies
            .iter()
            .map(|b| PointMass { pos: b.pos, mass: b.mass })
            .collect()
    }

    /// Gravitational acceleration at an arbitrary point from every massive body
    pub fn gravity_at(&self, pos: DVec3) -> Result<DVec3, GravityError> {
        gravity::acceleration_at(pos, &self.point_masses(), None, self.grav_constant)
    }

    /// Advance every registered body by `dt` seconds.
    ///
    /// Gravitating bodies feel every other gravitating body; particles feel
    /// every gravitating body plus their `user_acc`. All bodies share one
    /// state vector so each integrator stage sees consistent positions.
    pub fn update(&mut self, method: IntegrationMethod, dt: f64) -> StepReport {
        let num_grav = self.grav_bodies.len();
        let grav_constant = self.grav_constant;

        let mut states: Vec<PhaseState> = self
            .grav_bodies
            .iter()
            .map(|b| PhaseState::new(b.pos, b.vel))
            .chain(self.particle_bodies.iter().map(|p| PhaseState::new(p.pos, p.vel)))
            .collect();
        let masses: Vec<f64> = self.grav_bodies.iter().map(|b| b.mass).collect();
        let user_acc: Vec<DVec3> = self.particle_bodies.iter().map(|p| p.user_acc).collect();

        let mut degenerate: Vec<usize> = Vec::new();
        let mut sources = Vec::with_capacity(num_grav);

        integrator::advance(&mut states, dt, method, |positions, out| {
            sources.clear();
            sources.extend(
                positions[..num_grav]
                    .iter()
                    .zip(&masses)
                    .map(|(&pos, &mass)| PointMass { pos, mass }),
            );

            for (i, (&pos, acc)) in positions.iter().zip(out.iter_mut()).enumerate() {
                let exclude = (i < num_grav).then_some(i);
                let gravity = gravity::acceleration_at(pos, &sources, exclude, grav_constant)
                    .unwrap_or_else(|err| {
                        if !degenerate.contains(&i) {
                            degenerate.push(i);
                        }
                        err.partial()
                    });
                *acc = if i < num_grav {
                    gravity
                } else {
                    gravity + user_acc[i - num_grav]
                };
            }
        });

        for (body, state) in self.grav_bodies.iter_mut().zip(&states[..num_grav]) {
            body.pos = state.pos;
            body.vel = state.vel;
        }
        for (particle, state) in self.particle_bodies.iter_mut().zip(&states[num_grav..]) {
            particle.pos = state.pos;
            particle.vel = state.vel;
        }

        let degenerate: Vec<BodyId> = degenerate
            .into_iter()
            .map(|i| {
                if i < num_grav {
                    BodyId::Grav(GravBodyId::new(i))
                } else {
                    BodyId::Particle(ParticleBodyId::new(i - num_grav))
                }
            })
            .collect();
        for body in &degenerate {
            log::warn!("{body} is coincident with a gravity source; skipped that term this step");
        }

        StepReport { degenerate }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EARTH_MASS, EARTH_RADIUS, GRAV_CONSTANT, MOON_MASS, MOON_PERIOD, MOON_RADIUS};
    use crate::derived;
    use crate::world::CircularPair;
    use approx::assert_relative_eq;

    /// Earth and Moon on the app's circular starting orbit
    fn earth_moon() -> (PhysicsSystem, GravBodyId, GravBodyId) {
        let pair = CircularPair::new(EARTH_MASS, MOON_MASS, MOON_PERIOD, GRAV_CONSTANT);
        let mut physics = PhysicsSystem::new(GRAV_CONSTANT);
        let earth = physics
            .make_grav_body(EARTH_MASS, EARTH_RADIUS, pair.primary_pos, pair.primary_vel)
            .unwrap();
        let moon = physics
            .make_grav_body(MOON_MASS, MOON_RADIUS, pair.secondary_pos, pair.secondary_vel)
            .unwrap();
        physics.grav_body_mut(moon).soi_parent = earth;

        (physics, earth, moon)
    }

    /// One step of bare point-mass gravity over `states`, the first
    /// `masses.len()` of which are the sources
    fn reference_step(states: &mut [PhaseState], masses: &[f64], method: IntegrationMethod, dt: f64) {
        integrator::advance(states, dt, method, |positions, out| {
            let sources: Vec<PointMass> = positions
                .iter()
                .zip(masses)
                .map(|(&pos, &mass)| PointMass { pos, mass })
                .collect();
            for (i, (&pos, acc)) in positions.iter().zip(out.iter_mut()).enumerate() {
                let exclude = (i < masses.len()).then_some(i);
                *acc = gravity::acceleration_at(pos, &sources, exclude, GRAV_CONSTANT).unwrap();
            }
        });
    }

    fn assert_states_close(actual: &[PhaseState], expected: &[PhaseState]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.pos - e.pos).length() < 1.0e-6, "pos {} vs {}", a.pos, e.pos);
            assert!((a.vel - e.vel).length() < 1.0e-9, "vel {} vs {}", a.vel, e.vel);
        }
    }

    #[test]
    fn ids_are_monotonic() {
        let mut physics = PhysicsSystem::new(GRAV_CONSTANT);
        let a = physics.make_grav_body(1.0, 0.0, DVec3::ZERO, DVec3::ZERO).unwrap();
        let b = physics.make_grav_body(1.0, 0.0, DVec3::X, DVec3::ZERO).unwrap();
        let p = physics.make_particle_body(DVec3::Y, DVec3::ZERO).unwrap();
        let q = physics.make_particle_body(DVec3::Z, DVec3::ZERO).unwrap();

        assert!(a < b);
        assert!(p < q);
        assert_eq!(physics.position(q), DVec3::Z);
    }

    #[test]
    fn rejects_invalid_bodies() {
        let mut physics = PhysicsSystem::new(GRAV_CONSTANT);
        assert_eq!(
            physics.make_grav_body(0.0, 1.0, DVec3::ZERO, DVec3::ZERO),
            Err(PhysicsError::NonPositiveMass(0.0))
        );
        assert_eq!(
            physics.make_grav_body(1.0, -1.0, DVec3::ZERO, DVec3::ZERO),
            Err(PhysicsError::NegativeRadius(-1.0))
        );
        assert_eq!(
            physics.make_particle_body(DVec3::new(f64::NAN, 0.0, 0.0), DVec3::ZERO),
            Err(PhysicsError::NonFiniteState)
        );
        assert_eq!(physics.num_grav_bodies(), 0);
    }

    #[test]
    fn soi_lookup_is_one_level() {
        let (mut physics, earth, moon) = earth_moon();
        let ship = physics.make_particle_body(DVec3::new(0.0, 0.0, 1.3e7), DVec3::ZERO).unwrap();

        assert_eq!(physics.find_soi_grav_body(earth).unwrap().id, earth);
        assert_eq!(physics.find_soi_grav_body(moon).unwrap().id, earth);
        assert_eq!(physics.find_soi_grav_body(ship).unwrap().id, earth);
    }

    #[test]
    fn dominant_body_uses_sphere_of_influence() {
        let (physics, earth, moon) = earth_moon();
        let moon_pos = physics.grav_body(moon).pos;

        let near_moon = moon_pos + DVec3::new(1.0e7, 0.0, 0.0);
        assert_eq!(physics.dominant_grav_body(near_moon).unwrap().id, moon);

        let low_earth_orbit = physics.grav_body(earth).pos + DVec3::new(7.0e6, 0.0, 0.0);
        assert_eq!(physics.dominant_grav_body(low_earth_orbit).unwrap().id, earth);
    }

    #[test]
    fn moon_returns_after_one_period() {
        let (mut physics, _earth, moon) = earth_moon();
        let start = physics.grav_body(moon).pos;

        let steps = 20_000;
        let dt = MOON_PERIOD / steps as f64;
        for _ in 0..steps {
            assert!(physics.update(IntegrationMethod::Rk4, dt).is_clean());
        }

        let end = physics.grav_body(moon).pos;
        assert!((end - start).length() < 1.0e3, "moon drifted {} m", (end - start).length());
    }

    #[test]
    fn rk4_drifts_far_less_than_euler() {
        let mu = GRAV_CONSTANT * EARTH_MASS;
        let r = 1.0e7;
        let v = (mu / r).sqrt();
        let dt = 10.0;
        let steps = 1_000;

        let drift = |method: IntegrationMethod| {
            let mut physics = PhysicsSystem::new(GRAV_CONSTANT);
            let earth = physics.make_grav_body(EARTH_MASS, EARTH_RADIUS, DVec3::ZERO, DVec3::ZERO).unwrap();
            let ship = physics
                .make_particle_body(DVec3::new(r, 0.0, 0.0), DVec3::new(0.0, 0.0, v))
                .unwrap();
            for _ in 0..steps {
                physics.update(method, dt);
            }
            let rel_pos = physics.position(ship) - physics.position(earth);
            let rel_vel = physics.velocity(ship) - physics.velocity(earth);
            derived::eccentricity_vector(rel_pos, rel_vel, mu).length()
        };

        let euler = drift(IntegrationMethod::Euler);
        let rk4 = drift(IntegrationMethod::Rk4);
        assert!(euler > 1.0e-3, "euler should visibly drift, got {euler}");
        assert!(rk4 * 10.0 < euler, "rk4 {rk4} vs euler {euler}");
    }

    #[test]
    fn switching_method_mid_run_continues_from_current_state() {
        let (mut physics, earth, moon) = earth_moon();
        let ship = physics
            .make_particle_body(DVec3::new(0.0, 0.0, 1.3e7), DVec3::new(5.0e3, 0.0, 0.0))
            .unwrap();
        let masses = [EARTH_MASS, MOON_MASS];
        let snapshot = |p: &PhysicsSystem| {
            [
                PhaseState::new(p.position(earth), p.velocity(earth)),
                PhaseState::new(p.position(moon), p.velocity(moon)),
                PhaseState::new(p.position(ship), p.velocity(ship)),
            ]
        };
        let dt = 60.0;

        for _ in 0..50 {
            physics.update(IntegrationMethod::Rk4, dt);
        }
        let before = snapshot(&physics);

        let mut expected = before;
        reference_step(&mut expected, &masses, IntegrationMethod::Euler, dt);
        let mut rk4_instead = before;
        reference_step(&mut rk4_instead, &masses, IntegrationMethod::Rk4, dt);

        physics.update(IntegrationMethod::Euler, dt);
        let after_euler = snapshot(&physics);
        assert_states_close(&after_euler, &expected);
        // The step really was Euler: the ship lands kilometres from where RK4 puts it
        assert!((after_euler[2].pos - rk4_instead[2].pos).length() > 1.0e3);

        reference_step(&mut expected, &masses, IntegrationMethod::Rk4, dt);
        physics.update(IntegrationMethod::Rk4, dt);
        assert_states_close(&snapshot(&physics), &expected);
    }

    #[test]
    fn field_query_at_arbitrary_points() {
        let (physics, earth, moon) = earth_moon();
        let earth_pos = physics.grav_body(earth).pos;
        let moon_pos = physics.grav_body(moon).pos;

        // Beside the Earth the field points back at it with magnitude ~ GM/r²
        let r = 1.0e7;
        let acc = physics.gravity_at(earth_pos + DVec3::new(r, 0.0, 0.0)).unwrap();
        assert!(acc.x < 0.0);
        assert_relative_eq!(acc.length(), GRAV_CONSTANT * EARTH_MASS / (r * r), max_relative = 1e-3);

        // On the Earth itself only the Moon's pull remains
        match physics.gravity_at(earth_pos) {
            Err(GravityError::Coincident { source, partial }) => {
                assert_eq!(source, earth.index());
                let d = moon_pos - earth_pos;
                let expected = d * (GRAV_CONSTANT * MOON_MASS / d.length().powi(3));
                assert_relative_eq!((partial - expected).length(), 0.0, epsilon = 1e-12);
            }
            other => panic!("expected a coincident source, got {other:?}"),
        }
    }

    #[test]
    fn user_acc_only_moves_particles() {
        let mut physics = PhysicsSystem::new(GRAV_CONSTANT);
        let ship = physics.make_particle_body(DVec3::ZERO, DVec3::ZERO).unwrap();
        physics.particle_body_mut(ship).user_acc = DVec3::new(10.0, 0.0, 0.0);

        physics.update(IntegrationMethod::Rk4, 2.0);

        let body = physics.particle_body(ship);
        assert_relative_eq!(body.vel.x, 20.0, epsilon = 1e-12);
        assert_relative_eq!(body.pos.x, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn coincident_particle_is_contained() {
        let (mut physics, earth, moon) = earth_moon();
        let earth_pos = physics.grav_body(earth).pos;
        let ship = physics.make_particle_body(earth_pos, DVec3::ZERO).unwrap();

        let report = physics.update(IntegrationMethod::Euler, 1.0);

        assert_eq!(report.degenerate, vec![BodyId::Particle(ship)]);
        assert!(physics.particle_body(ship).pos.is_finite());
        assert!(physics.grav_body(moon).pos.is_finite());
    }
}
