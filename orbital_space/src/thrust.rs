//! Ship thrusters expressed in the local orbital frame

use glam::DVec3;

/// Default thrust acceleration in m/s²
pub const DEFAULT_THRUST_ACCEL: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thruster {
    Left,
    Right,
    Forward,
    Back,
    Up,
    Down,
}

/// Which thrusters are currently firing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrusterState {
    pub left: bool,
    pub right: bool,
    pub forward: bool,
    pub back: bool,
    pub up: bool,
    pub down: bool,
}

impl ThrusterState {
    pub fn set(&mut self, thruster: Thruster, firing: bool) {
        match thruster {
            Thruster::Left => self.left = firing,
            Thruster::Right => self.right = firing,
            Thruster::Forward => self.forward = firing,
            Thruster::Back => self.back = firing,
            Thruster::Up => self.up = firing,
            Thruster::Down => self.down = firing,
        }
    }

    pub fn any(&self) -> bool {
        self.left || self.right || self.forward || self.back || self.up || self.down
    }
}

/// Orthonormal frame of a ship relative to the body it orbits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalFrame {
    /// Along the velocity
    pub forward: DVec3,
    /// forward × (towards the parent)
    pub left: DVec3,
    /// left × forward, roughly towards the parent
    pub down: DVec3,
}

impl OrbitalFrame {
    /// Zero axes where the frame is undefined (at rest, or moving radially)
    pub fn new(pos: DVec3, vel: DVec3, soi_origin: DVec3) -> Self {
        let r_dir = (soi_origin - pos).normalize_or_zero();
        let forward = vel.normalize_or_zero();
        let left = forward.cross(r_dir).normalize_or_zero();
        let down = left.cross(forward);
        Self { forward, left, down }
    }
}

/// User acceleration for the ship at `pos`/`vel` orbiting `soi_origin`
pub fn calc_player_thrust(
    thrusters: &ThrusterState,
    pos: DVec3,
    vel: DVec3,
    soi_origin: DVec3,
    thrust_accel: f64,
) -> DVec3 {
    let frame = OrbitalFrame::new(pos, vel, soi_origin);

    let mut dir = DVec3::ZERO;
    if thrusters.forward {
        dir += frame.forward;
    }
    if thrusters.back {
        dir -= frame.forward;
    }
    if thrusters.down {
        dir += frame.down;
    }
    if thrusters.up {
        dir -= frame.down;
    }
    if thrusters.left {
        dir += frame.left;
    }
    if thrusters.right {
        dir -= frame.left;
    }

    dir * thrust_accel
}
