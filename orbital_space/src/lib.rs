//! Orbital Space
//!
//! An Earth-Moon sandbox: two gravitating bodies on a circular orbit, two
//! ships flying under their gravity, and the derived points (centre of mass,
//! Lagrange points, osculating orbits) recomputed every step.
//!
//! The library holds all simulation state and has no rendering dependency.
//! The `orbital_space` binary wraps it in a winit/wgpu viewer.
//!
//! Per tick:
//! 1. [`clock::SimClock`] turns wall time into a clamped, scaled `dt`
//! 2. thrusters set the player's `user_acc`
//! 3. [`physics::PhysicsSystem::update`] integrates every body (Euler or RK4)
//! 4. [`entity::EntitySystem::update`] pushes positions into trails
//! 5. derived quantities are refreshed from the new state

pub mod clock;
pub mod config;
pub mod constants;
pub mod derived;
pub mod entity;
pub mod ephemeris;
pub mod math;
pub mod physics;
pub mod thrust;
pub mod trail;
pub mod world;

pub use config::SimConfig;
pub use physics::{IntegrationMethod, PhysicsSystem};
pub use world::OrbitalWorld;
