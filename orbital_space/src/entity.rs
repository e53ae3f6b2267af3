//! Entity arena: the named things in the scene and what they track
//!
//! Entities never own physics state. They refer to bodies by id and keep
//! only presentation data (names, colours, trails, osculating orbits).

use crate::derived::OrbitConic;
use crate::physics::{BodyId, GravBodyId, ParticleBodyId, PhysicsSystem};
use crate::trail::Trail;
use glam::DVec3;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

entity_id!(
    /// Handle to a [`Planet`]
    PlanetId
);
entity_id!(
    /// Handle to a [`Moon`]
    MoonId
);
entity_id!(
    /// Handle to a [`Ship`]
    ShipId
);
entity_id!(
    /// Handle to a [`Poi`]
    PoiId
);
entity_id!(
    /// Handle to a [`Trail`]
    TrailId
);
entity_id!(
    /// Handle to a [`CameraTarget`]
    CameraTargetId
);

#[derive(Debug, Clone)]
pub struct Planet {
    pub name: String,
    pub grav_body: GravBodyId,
    pub colour: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct Moon {
    pub name: String,
    pub grav_body: GravBodyId,
    pub trail: TrailId,
    pub colour: [f32; 3],
    pub orbit_colour: [f32; 3],
    /// Osculating orbit about the SOI parent, refreshed every step
    pub orbit: Option<OrbitConic>,
}

#[derive(Debug, Clone)]
pub struct Ship {
    pub name: String,
    pub particle_body: ParticleBodyId,
    pub trail: TrailId,
    pub colour: [f32; 3],
    pub orbit_colour: [f32; 3],
    pub orbit: Option<OrbitConic>,
}

/// Point of interest: a derived position with no body behind it
#[derive(Debug, Clone)]
pub struct Poi {
    pub name: String,
    pub pos: DVec3,
    pub colour: [f32; 3],
}

/// What a camera target follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Body(BodyId),
    Poi(PoiId),
}

#[derive(Debug, Clone)]
pub struct CameraTarget {
    pub name: String,
    pub source: TargetSource,
}

#[derive(Debug, Default)]
pub struct EntitySystem {
    planets: Vec<Planet>,
    moons: Vec<Moon>,
    ships: Vec<Ship>,
    pois: Vec<Poi>,
    trails: Vec<Trail>,
    camera_targets: Vec<CameraTarget>,
}

impl EntitySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_trail(&mut self, trail: Trail) -> TrailId {
        self.trails.push(trail);
        TrailId(self.trails.len() - 1)
    }

    pub fn make_planet(&mut self, planet: Planet) -> PlanetId {
        self.planets.push(planet);
        PlanetId(self.planets.len() - 1)
    }

    pub fn make_moon(&mut self, moon: Moon) -> MoonId {
        self.moons.push(moon);
        MoonId(self.moons.len() - 1)
    }

    pub fn make_ship(&mut self, ship: Ship) -> ShipId {
        self.ships.push(ship);
        ShipId(self.ships.len() - 1)
    }

    pub fn make_poi(&mut self, poi: Poi) -> PoiId {
        self.pois.push(poi);
        PoiId(self.pois.len() - 1)
    }

    pub fn make_camera_target(&mut self, name: impl Into<String>, source: TargetSource) -> CameraTargetId {
        self.camera_targets.push(CameraTarget {
            name: name.into(),
            source,
        });
        CameraTargetId(self.camera_targets.len() - 1)
    }

    pub fn planet(&self, id: PlanetId) -> &Planet {
        &self.planets[id.0]
    }

    pub fn moon(&self, id: MoonId) -> &Moon {
        &self.moons[id.0]
    }

    pub fn moon_mut(&mut self, id: MoonId) -> &mut Moon {
        &mut self.moons[id.0]
    }

    pub fn ship(&self, id: ShipId) -> &Ship {
        &self.ships[id.0]
    }

    pub fn ship_mut(&mut self, id: ShipId) -> &mut Ship {
        &mut self.ships[id.0]
    }

    pub fn poi(&self, id: PoiId) -> &Poi {
        &self.pois[id.0]
    }

    pub fn poi_mut(&mut self, id: PoiId) -> &mut Poi {
        &mut self.pois[id.0]
    }

    pub fn trail(&self, id: TrailId) -> &Trail {
        &self.trails[id.0]
    }

    pub fn trail_mut(&mut self, id: TrailId) -> &mut Trail {
        &mut self.trails[id.0]
    }

    pub fn camera_target(&self, id: CameraTargetId) -> &CameraTarget {
        &self.camera_targets[id.0]
    }

    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.planets.iter()
    }

    pub fn moons(&self) -> impl Iterator<Item = &Moon> {
        self.moons.iter()
    }

    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.iter()
    }

    pub fn pois(&self) -> impl Iterator<Item = &Poi> {
        self.pois.iter()
    }

    pub fn num_ships(&self) -> usize {
        self.ships.len()
    }

    pub fn num_camera_targets(&self) -> usize {
        self.camera_targets.len()
    }

    /// The target after `id`, wrapping around
    pub fn next_camera_target(&self, id: CameraTargetId) -> CameraTargetId {
        CameraTargetId((id.0 + 1) % self.camera_targets.len().max(1))
    }

    /// Current world position of whatever the target follows
    pub fn camera_target_pos(&self, id: CameraTargetId, physics: &PhysicsSystem) -> DVec3 {
        match self.camera_target(id).source {
            TargetSource::Body(body) => physics.position(body),
            TargetSource::Poi(poi) => self.poi(poi).pos,
        }
    }

    /// Push the current position of every tracked body into its trail
    pub fn update(&mut self, dt: f64, physics: &PhysicsSystem) {
        for moon in &self.moons {
            self.trails[moon.trail.0].update(dt, physics.grav_body(moon.grav_body).pos);
        }
        for ship in &self.ships {
            self.trails[ship.trail.0].update(dt, physics.particle_body(ship.particle_body).pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GRAV_CONSTANT;

    const GREY: [f32; 3] = [0.5, 0.5, 0.5];

    #[test]
    fn ids_are_handed_out_in_order() {
        let mut entities = EntitySystem::new();
        let a = entities.make_poi(Poi { name: "A".into(), pos: DVec3::ZERO, colour: GREY });
        let b = entities.make_poi(Poi { name: "B".into(), pos: DVec3::X, colour: GREY });
        let t0 = entities.make_trail(Trail::with_capacity(4, 1.0, GREY, GREY));
        let t1 = entities.make_trail(Trail::with_capacity(4, 1.0, GREY, GREY));

        assert!(a < b);
        assert!(t0 < t1);
        assert_eq!(entities.poi(b).name, "B");
    }

    #[test]
    fn update_feeds_trails_from_physics() {
        let mut physics = PhysicsSystem::new(GRAV_CONSTANT);
        let body = physics.make_particle_body(DVec3::new(1.0, 2.0, 3.0), DVec3::ZERO).unwrap();

        let mut entities = EntitySystem::new();
        let trail = entities.make_trail(Trail::with_capacity(8, 1.0, GREY, GREY));
        let ship = entities.make_ship(Ship {
            name: "Player".into(),
            particle_body: body,
            trail,
            colour: GREY,
            orbit_colour: GREY,
            orbit: None,
        });

        entities.update(0.5, &physics);
        physics.particle_body_mut(body).pos = DVec3::new(4.0, 5.0, 6.0);
        entities.update(0.5, &physics);

        let trail = entities.trail(entities.ship(ship).trail);
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.oldest(), Some(DVec3::new(1.0, 2.0, 3.0)));
        assert_eq!(trail.newest(), Some(DVec3::new(4.0, 5.0, 6.0)));
    }

    #[test]
    fn camera_targets_wrap_and_follow_their_source() {
        let mut physics = PhysicsSystem::new(GRAV_CONSTANT);
        let earth = physics.make_grav_body(1.0e24, 1.0, DVec3::Y, DVec3::ZERO).unwrap();

        let mut entities = EntitySystem::new();
        let poi = entities.make_poi(Poi { name: "COM".into(), pos: DVec3::Z, colour: GREY });
        let first = entities.make_camera_target("Earth", TargetSource::Body(earth.into()));
        let second = entities.make_camera_target("COM", TargetSource::Poi(poi));

        assert_eq!(entities.next_camera_target(first), second);
        assert_eq!(entities.next_camera_target(second), first);
        assert_eq!(entities.camera_target_pos(first, &physics), DVec3::Y);

        entities.poi_mut(poi).pos = DVec3::X;
        assert_eq!(entities.camera_target_pos(second, &physics), DVec3::X);
    }
}
