//! Common utilities for the orbital simulation front end
//!
//! This crate provides the window/GPU setup and the camera used by the
//! `orbital_space` viewer. Nothing in here knows about physics: it only
//! consumes positions that have already been converted to render space.

pub mod graphics;
pub mod camera;

pub use graphics::*;
pub use camera::*;
