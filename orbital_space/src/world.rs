//! The Earth-Moon scenario and its per-tick update
//!
//! `OrbitalWorld` owns the physics and entity systems and wires them
//! together: thrust in, integrate, record trails, refresh derived points.
//! Front ends only read from it between ticks.

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::derived::{self, OrbitConic};
use crate::entity::{
    CameraTargetId, EntitySystem, Moon, MoonId, Planet, PlanetId, Poi, PoiId, Ship, ShipId, TargetSource,
};
use crate::ephemeris;
use crate::physics::{BodyId, IntegrationMethod, PhysicsError, PhysicsSystem, StepReport};
use crate::thrust::{calc_player_thrust, Thruster, ThrusterState};
use crate::trail::Trail;
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::f64::consts::TAU;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldError {
    Physics(PhysicsError),
    /// Moon period must be positive for a circular starting orbit
    InvalidPeriod(f64),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physics(e) => write!(f, "invalid body: {e}"),
            Self::InvalidPeriod(p) => write!(f, "moon period must be positive, got {p}"),
        }
    }
}

impl Error for WorldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Physics(e) => Some(e),
            Self::InvalidPeriod(_) => None,
        }
    }
}

impl From<PhysicsError> for WorldError {
    fn from(e: PhysicsError) -> Self {
        Self::Physics(e)
    }
}

/// Positions and velocities placing two bodies on circular orbits about
/// their common centre of mass at the origin, separated along z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularPair {
    pub separation: f64,
    pub primary_pos: DVec3,
    pub primary_vel: DVec3,
    pub secondary_pos: DVec3,
    pub secondary_vel: DVec3,
}

impl CircularPair {
    /// Solve Kepler's third law for the separation giving `period`
    pub fn new(primary_mass: f64, secondary_mass: f64, period: f64, grav_constant: f64) -> Self {
        let total = primary_mass + secondary_mass;
        let mu = grav_constant * total;
        let angular_speed = TAU / period;
        let separation = (mu / (angular_speed * angular_speed)).cbrt();

        let r_primary = separation * secondary_mass / total;
        let r_secondary = separation - r_primary;

        Self {
            separation,
            primary_pos: DVec3::new(0.0, 0.0, -r_primary),
            primary_vel: DVec3::new(-r_primary * angular_speed, 0.0, 0.0),
            secondary_pos: DVec3::new(0.0, 0.0, r_secondary),
            secondary_vel: DVec3::new(r_secondary * angular_speed, 0.0, 0.0),
        }
    }
}

/// Snapshot for the HUD
#[derive(Debug, Clone, PartialEq)]
pub struct WorldStatus {
    pub date: String,
    pub time_scale: u32,
    pub method: IntegrationMethod,
    pub camera_target: String,
    pub paused: bool,
    pub player_eccentricity: Option<f64>,
    pub player_soi: String,
}

pub struct OrbitalWorld {
    pub physics: PhysicsSystem,
    pub entities: EntitySystem,
    pub clock: SimClock,
    method: IntegrationMethod,
    thrusters: ThrusterState,
    thrust_accel: f64,

    earth: PlanetId,
    moon: MoonId,
    player: ShipId,
    suspect: ShipId,
    com: PoiId,
    lagrange: [PoiId; 5],
    camera_target: CameraTargetId,

    sun_dir: DVec3,
    last_report: StepReport,
}

impl OrbitalWorld {
    pub fn new(config: &SimConfig) -> Result<Self, WorldError> {
        let phys = &config.physics;
        if !(phys.moon_period > 0.0) {
            return Err(WorldError::InvalidPeriod(phys.moon_period));
        }
        let palette = &config.palette;
        let trail_cfg = &config.trail;
        let new_trail = |ramp: &[[f32; 3]; 5]| Trail::with_capacity(trail_cfg.capacity, trail_cfg.duration, ramp[0], ramp[4]);

        let mut physics = PhysicsSystem::new(phys.grav_constant);
        let mut entities = EntitySystem::new();

        let pair = CircularPair::new(phys.earth_mass, phys.moon_mass, phys.moon_period, phys.grav_constant);

        // Earth
        let earth_body = physics.make_grav_body(phys.earth_mass, phys.earth_radius, pair.primary_pos, pair.primary_vel)?;
        let earth = entities.make_planet(Planet {
            name: "Earth".into(),
            grav_body: earth_body,
            colour: palette.green[1],
        });
        let earth_target = entities.make_camera_target("Earth", TargetSource::Body(earth_body.into()));

        // Moon
        let moon_body = physics.make_grav_body(phys.moon_mass, phys.moon_radius, pair.secondary_pos, pair.secondary_vel)?;
        physics.grav_body_mut(moon_body).soi_parent = earth_body;
        let moon_trail = entities.make_trail(new_trail(&palette.green));
        let moon = entities.make_moon(Moon {
            name: "Moon".into(),
            grav_body: moon_body,
            trail: moon_trail,
            colour: palette.green[1],
            orbit_colour: palette.green[1],
            orbit: None,
        });
        entities.make_camera_target("Moon", TargetSource::Body(moon_body.into()));

        // Centre of mass and Lagrange points, positioned by the first derived update
        let com = entities.make_poi(Poi {
            name: "Earth-Moon COM".into(),
            pos: DVec3::ZERO,
            colour: palette.marker,
        });
        entities.make_camera_target("Earth-Moon COM", TargetSource::Poi(com));

        let mut lagrange = [com; 5];
        for (i, slot) in lagrange.iter_mut().enumerate() {
            let name = format!("Earth-Moon L{}", i + 1);
            *slot = entities.make_poi(Poi {
                name: name.clone(),
                pos: DVec3::ZERO,
                colour: palette.marker,
            });
            entities.make_camera_target(name, TargetSource::Poi(*slot));
        }

        // Ships share a starting orbit; the suspect is nudged off it
        let ships = &config.ships;
        let start_pos = DVec3::from_array(ships.start_position);
        let start_vel = DVec3::from_array(ships.start_velocity);

        let player_body = physics.make_particle_body(start_pos, start_vel)?;
        let player_trail = entities.make_trail(new_trail(&palette.blue));
        let player = entities.make_ship(Ship {
            name: "Player".into(),
            particle_body: player_body,
            trail: player_trail,
            colour: palette.blue[4],
            orbit_colour: palette.blue[2],
            orbit: None,
        });
        entities.make_camera_target("Player", TargetSource::Body(player_body.into()));

        let mut rng = match ships.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut jitter = |scale: f64| {
            DVec3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            ) * scale
        };
        let suspect_pos = start_pos + jitter(ships.position_jitter);
        let suspect_vel = start_vel + jitter(ships.velocity_jitter);

        let suspect_body = physics.make_particle_body(suspect_pos, suspect_vel)?;
        let suspect_trail = entities.make_trail(new_trail(&palette.red));
        let suspect = entities.make_ship(Ship {
            name: "Suspect".into(),
            particle_body: suspect_body,
            trail: suspect_trail,
            colour: palette.red[4],
            orbit_colour: palette.red[2],
            orbit: None,
        });
        entities.make_camera_target("Suspect", TargetSource::Body(suspect_body.into()));

        log::info!(
            "built Earth-Moon world: separation {:.0} km, {} ships, {} camera targets",
            pair.separation / 1.0e3,
            entities.num_ships(),
            entities.num_camera_targets()
        );

        let mut world = Self {
            physics,
            entities,
            clock: SimClock::new(phys.time_scale, phys.max_frame_ms),
            method: phys.integration_method,
            thrusters: ThrusterState::default(),
            thrust_accel: ships.thrust_accel,
            earth,
            moon,
            player,
            suspect,
            com,
            lagrange,
            camera_target: earth_target,
            sun_dir: DVec3::X,
            last_report: StepReport::default(),
        };
        world.update_derived();
        Ok(world)
    }

    /// Advance by one frame of wall time. Returns the step report when the
    /// clock let the simulation run.
    pub fn tick(&mut self, elapsed: Duration) -> Option<&StepReport> {
        let dt = self.clock.tick(elapsed)?;
        self.step(dt);
        Some(&self.last_report)
    }

    /// One simulation step of `dt` seconds, regardless of the clock
    pub fn step(&mut self, dt: f64) {
        self.apply_thrust();
        self.last_report = self.physics.update(self.method, dt);
        self.entities.update(dt, &self.physics);
        self.update_derived();
    }

    fn apply_thrust(&mut self) {
        let body_id = self.entities.ship(self.player).particle_body;
        let soi_origin = self
            .physics
            .find_soi_grav_body(body_id)
            .map_or(DVec3::ZERO, |b| b.pos);

        let body = self.physics.particle_body_mut(body_id);
        body.user_acc = calc_player_thrust(&self.thrusters, body.pos, body.vel, soi_origin, self.thrust_accel);
    }

    /// Recompute the centre of mass, Lagrange points, orbit conics and sun
    /// direction from the current body states. Failures keep the previous value.
    fn update_derived(&mut self) {
        let earth = self.physics.grav_body(self.entities.planet(self.earth).grav_body).clone();
        let moon = self.physics.grav_body(self.entities.moon(self.moon).grav_body).clone();
        let g = self.physics.grav_constant();

        match derived::center_of_mass(&[(earth.mass, earth.pos), (moon.mass, moon.pos)]) {
            Some(com) => self.entities.poi_mut(self.com).pos = com,
            None => log::warn!("Earth-Moon centre of mass is undefined"),
        }

        match derived::lagrange_points(&earth, &moon) {
            Ok(points) => {
                for (id, pos) in self.lagrange.iter().zip(points.as_array()) {
                    self.entities.poi_mut(*id).pos = pos;
                }
            }
            Err(e) => log::warn!("Lagrange points not updated: {e}"),
        }

        match OrbitConic::about(&earth, moon.pos, moon.vel, g) {
            Ok(conic) => self.entities.moon_mut(self.moon).orbit = Some(conic),
            Err(e) => log::warn!("Moon orbit not updated: {e}"),
        }

        for ship_id in [self.player, self.suspect] {
            let body_id = self.entities.ship(ship_id).particle_body;
            let body = self.physics.particle_body(body_id);
            let conic = self
                .physics
                .dominant_grav_body(body.pos)
                .map(|parent| OrbitConic::about(parent, body.pos, body.vel, g));
            match conic {
                Some(Ok(conic)) => self.entities.ship_mut(ship_id).orbit = Some(conic),
                Some(Err(e)) => log::warn!("{} orbit not updated: {e}", self.entities.ship(ship_id).name),
                None => {}
            }
        }

        match ephemeris::sun_direction(ephemeris::julian_date_at(self.clock.sim_time())) {
            Ok(dir) => self.sun_dir = dir,
            Err(e) => log::warn!("sun direction not updated: {e}"),
        }
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    pub fn cycle_method(&mut self) {
        self.method = self.method.next();
        log::debug!("integration method: {}", self.method);
    }

    pub fn set_thruster(&mut self, thruster: Thruster, firing: bool) {
        self.thrusters.set(thruster, firing);
    }

    pub fn thrusters(&self) -> &ThrusterState {
        &self.thrusters
    }

    pub fn camera_target(&self) -> CameraTargetId {
        self.camera_target
    }

    pub fn cycle_camera_target(&mut self) {
        self.camera_target = self.entities.next_camera_target(self.camera_target);
        log::debug!("camera target: {}", self.entities.camera_target(self.camera_target).name);
    }

    pub fn camera_target_pos(&self) -> DVec3 {
        self.entities.camera_target_pos(self.camera_target, &self.physics)
    }

    pub fn earth(&self) -> PlanetId {
        self.earth
    }

    pub fn moon(&self) -> MoonId {
        self.moon
    }

    pub fn player(&self) -> ShipId {
        self.player
    }

    pub fn suspect(&self) -> ShipId {
        self.suspect
    }

    pub fn com(&self) -> PoiId {
        self.com
    }

    pub fn lagrange(&self) -> [PoiId; 5] {
        self.lagrange
    }

    /// World-frame unit vector towards the Sun
    pub fn sun_dir(&self) -> DVec3 {
        self.sun_dir
    }

    pub fn last_report(&self) -> &StepReport {
        &self.last_report
    }

    pub fn player_pos(&self) -> DVec3 {
        self.physics.position(self.entities.ship(self.player).particle_body)
    }

    pub fn player_vel(&self) -> DVec3 {
        self.physics.velocity(self.entities.ship(self.player).particle_body)
    }

    pub fn status(&self) -> WorldStatus {
        let player_body: BodyId = self.entities.ship(self.player).particle_body.into();
        let player_soi = self
            .physics
            .dominant_grav_body(self.physics.position(player_body))
            .and_then(|b| {
                self.entities
                    .planets()
                    .find(|p| p.grav_body == b.id)
                    .map(|p| p.name.clone())
                    .or_else(|| self.entities.moons().find(|m| m.grav_body == b.id).map(|m| m.name.clone()))
            })
            .unwrap_or_default();

        WorldStatus {
            date: ephemeris::calendar_string(self.clock.sim_time()),
            time_scale: self.clock.time_scale(),
            method: self.method,
            camera_target: self.entities.camera_target(self.camera_target).name.clone(),
            paused: self.clock.is_paused(),
            player_eccentricity: self.entities.ship(self.player).orbit.map(|o| o.e),
            player_soi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EARTH_MASS, GRAV_CONSTANT, MOON_MASS, MOON_PERIOD};
    use approx::assert_relative_eq;

    fn quiet_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.ships.seed = Some(42);
        config.trail.capacity = 64;
        config
    }

    #[test]
    fn circular_pair_has_zero_momentum() {
        let pair = CircularPair::new(EARTH_MASS, MOON_MASS, MOON_PERIOD, GRAV_CONSTANT);
        let momentum = pair.primary_vel * EARTH_MASS + pair.secondary_vel * MOON_MASS;
        let com = pair.primary_pos * EARTH_MASS + pair.secondary_pos * MOON_MASS;

        assert_relative_eq!(momentum.length(), 0.0, epsilon = 1e-3 * EARTH_MASS);
        assert_relative_eq!(com.length() / (EARTH_MASS + MOON_MASS), 0.0, epsilon = 1e-6);
        assert_relative_eq!(pair.secondary_pos.z - pair.primary_pos.z, pair.separation, max_relative = 1e-12);
        // About 384 000 km
        assert!((3.8e8..3.9e8).contains(&pair.separation));
    }

    #[test]
    fn builds_the_earth_moon_scene() {
        let world = OrbitalWorld::new(&quiet_config()).unwrap();

        assert_eq!(world.physics.num_grav_bodies(), 2);
        assert_eq!(world.physics.num_particle_bodies(), 2);
        assert_eq!(world.entities.num_camera_targets(), 10);
        assert_eq!(world.status().camera_target, "Earth");
        assert_relative_eq!(world.entities.poi(world.com()).pos.length(), 0.0, epsilon = 1.0);
        assert!(world.entities.moon(world.moon()).orbit.is_some());
        assert_relative_eq!(world.sun_dir().length(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn invalid_bodies_are_reported() {
        let mut config = quiet_config();
        config.physics.earth_mass = -1.0;
        assert!(matches!(
            OrbitalWorld::new(&config),
            Err(WorldError::Physics(PhysicsError::NonPositiveMass(_)))
        ));

        let mut config = quiet_config();
        config.physics.moon_period = 0.0;
        assert_eq!(OrbitalWorld::new(&config).err(), Some(WorldError::InvalidPeriod(0.0)));
    }

    #[test]
    fn same_seed_same_suspect() {
        let a = OrbitalWorld::new(&quiet_config()).unwrap();
        let b = OrbitalWorld::new(&quiet_config()).unwrap();
        let pos = |w: &OrbitalWorld| w.physics.position(w.entities.ship(w.suspect()).particle_body);

        assert_eq!(pos(&a), pos(&b));
        assert_ne!(pos(&a), a.player_pos());
        assert!((pos(&a) - a.player_pos()).abs().max_element() <= 6.0e4);
    }

    #[test]
    fn step_records_trails_and_moves_lagrange_points() {
        let mut world = OrbitalWorld::new(&quiet_config()).unwrap();
        let l4_before = world.entities.poi(world.lagrange()[3]).pos;

        for _ in 0..10 {
            world.step(600.0);
        }

        let moon = world.entities.moon(world.moon());
        assert_eq!(world.entities.trail(moon.trail).len(), 10);
        let l4_after = world.entities.poi(world.lagrange()[3]).pos;
        assert!((l4_after - l4_before).length() > 1.0e5);

        let earth = world.physics.grav_body(world.entities.planet(world.earth()).grav_body).pos;
        let moon_pos = world.physics.grav_body(moon.grav_body).pos;
        let sep = (moon_pos - earth).length();
        assert_relative_eq!((l4_after - earth).length(), sep, max_relative = 1e-9);
        assert!(world.last_report().is_clean());
    }

    #[test]
    fn prograde_thrust_speeds_up_the_player() {
        let mut config = quiet_config();
        config.ships.position_jitter = 0.0;
        config.ships.velocity_jitter = 0.0;
        let mut world = OrbitalWorld::new(&config).unwrap();

        world.set_thruster(Thruster::Forward, true);
        world.step(1.0);

        let suspect_vel = world.physics.velocity(world.entities.ship(world.suspect()).particle_body);
        let gained = world.player_vel().length() - suspect_vel.length();
        assert_relative_eq!(gained, 10.0, max_relative = 1e-3);
    }

    #[test]
    fn paused_tick_does_nothing() {
        let mut world = OrbitalWorld::new(&quiet_config()).unwrap();
        let before = world.player_pos();

        world.clock.toggle_pause();
        assert!(world.tick(Duration::from_millis(16)).is_none());
        assert_eq!(world.player_pos(), before);

        world.clock.step_once();
        assert!(world.tick(Duration::from_millis(16)).is_some());
        assert_ne!(world.player_pos(), before);
        assert!(world.status().paused);
    }

    #[test]
    fn camera_cycles_through_every_target() {
        let mut world = OrbitalWorld::new(&quiet_config()).unwrap();
        let mut names = Vec::new();
        for _ in 0..world.entities.num_camera_targets() {
            names.push(world.status().camera_target);
            world.cycle_camera_target();
        }
        assert_eq!(world.status().camera_target, "Earth");
        assert_eq!(names[1], "Moon");
        assert_eq!(names[2], "Earth-Moon COM");
        assert_eq!(names[7], "Earth-Moon L5");
        assert_eq!(names[9], "Suspect");
    }

    #[test]
    fn method_cycles_from_config_default() {
        let mut world = OrbitalWorld::new(&quiet_config()).unwrap();
        assert_eq!(world.method(), IntegrationMethod::Rk4);
        world.cycle_method();
        assert_eq!(world.status().method, IntegrationMethod::Euler);
    }

    #[test]
    fn player_starts_on_a_bound_earth_orbit() {
        let world = OrbitalWorld::new(&quiet_config()).unwrap();
        let status = world.status();
        let e = status.player_eccentricity.unwrap();
        assert!(e < 1.0, "player orbit should be bound, e = {e}");
        assert_eq!(status.player_soi, "Earth");
        assert_eq!(status.date, "2025-05-27 01:00:00");
    }
}
