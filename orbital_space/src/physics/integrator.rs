//! Fixed-step time integrators
//!
//! Both methods treat the bodies as one coupled system: the acceleration
//! callback sees every position at the same stage of the step, so sources
//! and targets stay consistent inside an RK4 step.

use glam::DVec3;
use serde::Deserialize;
use std::fmt;

/// Which stepping function the physics system applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum IntegrationMethod {
    /// Explicit (forward) Euler, first order
    #[serde(rename = "euler")]
    Euler,
    /// Classical 4th-order Runge-Kutta
    #[default]
    #[serde(rename = "rk4")]
    Rk4,
}

impl IntegrationMethod {
    /// Cycle to the next method (Euler -> RK4 -> Euler)
    pub fn next(self) -> Self {
        match self {
            Self::Euler => Self::Rk4,
            Self::Rk4 => Self::Euler,
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Euler => write!(f, "Euler"),
            Self::Rk4 => write!(f, "RK4"),
        }
    }
}

/// Position and velocity of one body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseState {
    pub pos: DVec3,
    pub vel: DVec3,
}

impl PhaseState {
    pub fn new(pos: DVec3, vel: DVec3) -> Self {
        Self { pos, vel }
    }
}

/// Advance every state by `dt` using `method`.
///
/// `accel(positions, out)` must write the acceleration of body `i` into
/// `out[i]` given all current stage positions.
pub fn advance<F>(states: &mut [PhaseState], dt: f64, method: IntegrationMethod, mut accel: F)
where
    F: FnMut(&[DVec3], &mut [DVec3]),
{
    if states.is_empty() {
        return;
    }

    match method {
        IntegrationMethod::Euler => euler_step(states, dt, &mut accel),
        IntegrationMethod::Rk4 => rk4_step(states, dt, &mut accel),
    }
}

/// Advance a single state under a position-dependent acceleration field
pub fn advance_single<F>(state: PhaseState, dt: f64, method: IntegrationMethod, mut accel: F) -> PhaseState
where
    F: FnMut(DVec3) -> DVec3,
{
    let mut states = [state];
    advance(&mut states, dt, method, |pos, out| out[0] = accel(pos[0]));
    states[0]
}

fn euler_step<F>(states: &mut [PhaseState], dt: f64, accel: &mut F)
where
    F: FnMut(&[DVec3], &mut [DVec3]),
{
    let positions: Vec<DVec3> = states.iter().map(|s| s.pos).collect();
    let mut acc = vec![DVec3::ZERO; states.len()];
    accel(&positions, &mut acc);

    // Both derivatives are taken at the start of the step
    for (s, a) in states.iter_mut().zip(&acc) {
        let v0 = s.vel;
        s.vel += *a * dt;
        s.pos += v0 * dt;
    }
}

fn rk4_step<F>(states: &mut [PhaseState], dt: f64, accel: &mut F)
where
    F: FnMut(&[DVec3], &mut [DVec3]),
{
    let n = states.len();
    let half_dt = 0.5 * dt;

    let p0: Vec<DVec3> = states.iter().map(|s| s.pos).collect();
    let v0: Vec<DVec3> = states.iter().map(|s| s.vel).collect();

    // k1 at t
    let k1p = v0.clone();
    let mut k1v = vec![DVec3::ZERO; n];
    accel(&p0, &mut k1v);

    // k2 at t + dt/2 along k1
    let p2: Vec<DVec3> = (0..n).map(|i| p0[i] + k1p[i] * half_dt).collect();
    let k2p: Vec<DVec3> = (0..n).map(|i| v0[i] + k1v[i] * half_dt).collect();
    let mut k2v = vec![DVec3::ZERO; n];
    accel(&p2, &mut k2v);

    // k3 at t + dt/2 along k2
    let p3: Vec<DVec3> = (0..n).map(|i| p0[i] + k2p[i] * half_dt).collect();
    let k3p: Vec<DVec3> = (0..n).map(|i| v0[i] + k2v[i] * half_dt).collect();
    let mut k3v = vec![DVec3::ZERO; n];
    accel(&p3, &mut k3v);

    // k4 at t + dt along k3
    let p4: Vec<DVec3> = (0..n).map(|i| p0[i] + k3p[i] * dt).collect();
    let k4p: Vec<DVec3> = (0..n).map(|i| v0[i] + k3v[i] * dt).collect();
    let mut k4v = vec![DVec3::ZERO; n];
    accel(&p4, &mut k4v);

    let sixth_dt = dt / 6.0;
    for (i, s) in states.iter_mut().enumerate() {
        s.pos = p0[i] + (k1p[i] + 2.0 * k2p[i] + 2.0 * k3p[i] + k4p[i]) * sixth_dt;
        s.vel = v0[i] + (k1v[i] + 2.0 * k2v[i] + 2.0 * k3v[i] + k4v[i]) * sixth_dt;
    }
}
