//! Scenario and presentation settings loaded from YAML
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```yaml
//! window:
//!   width: 1600
//!   height: 900
//! physics:
//!   integration_method: "euler"   # or "rk4"
//!   time_scale: 64
//! ships:
//!   start_velocity: [5.2e3, 0.0, 0.0]
//!   seed: 7
//! trail:
//!   capacity: 2000
//! ```

use crate::clock::{DEFAULT_MAX_FRAME_MS, MIN_TIME_SCALE};
use crate::constants::{EARTH_MASS, EARTH_RADIUS, GRAV_CONSTANT, MOON_MASS, MOON_PERIOD, MOON_RADIUS};
use crate::physics::IntegrationMethod;
use crate::thrust::DEFAULT_THRUST_ACCEL;
use crate::trail::NUM_TRAIL_PTS;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub ships: ShipsConfig,
    pub trail: TrailConfig,
    pub palette: Palette,
}

impl SimConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Orbital Space".to_string(),
        }
    }
}

/// Physical constants and stepping options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub grav_constant: f64,
    pub earth_mass: f64,
    pub earth_radius: f64,
    pub moon_mass: f64,
    pub moon_radius: f64,
    /// Sidereal period used to place the Moon on a circular orbit, s
    pub moon_period: f64,
    pub integration_method: IntegrationMethod,
    /// Initial time scale, rounded to a power of two
    pub time_scale: u32,
    /// Wall-clock frames longer than this are clamped, ms
    pub max_frame_ms: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            grav_constant: GRAV_CONSTANT,
            earth_mass: EARTH_MASS,
            earth_radius: EARTH_RADIUS,
            moon_mass: MOON_MASS,
            moon_radius: MOON_RADIUS,
            moon_period: MOON_PERIOD,
            integration_method: IntegrationMethod::Rk4,
            time_scale: MIN_TIME_SCALE,
            max_frame_ms: DEFAULT_MAX_FRAME_MS,
        }
    }
}

/// Starting state shared by the player and the suspect ship
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShipsConfig {
    pub start_position: [f64; 3],
    pub start_velocity: [f64; 3],
    /// Acceleration of one thruster, m/s²
    pub thrust_accel: f64,
    /// Uniform ± offset applied to the suspect's start position, m
    pub position_jitter: f64,
    /// Uniform ± offset applied to the suspect's start velocity, m/s
    pub velocity_jitter: f64,
    /// Seed for the jitter; random when absent
    pub seed: Option<u64>,
}

impl Default for ShipsConfig {
    fn default() -> Self {
        Self {
            start_position: [0.0, 0.0, 1.3e7],
            start_velocity: [5.0e3, 0.0, 0.0],
            thrust_accel: DEFAULT_THRUST_ACCEL,
            position_jitter: 6.0e4,
            velocity_jitter: 1.0e2,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub capacity: usize,
    pub duration: f64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            capacity: NUM_TRAIL_PTS,
            duration: 5000.0,
        }
    }
}

/// Five-step colour ramps, dark to light
pub type Ramp = [[f32; 3]; 5];

fn rgb(r: u8, g: u8, b: u8) -> [f32; 3] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub red: Ramp,
    pub green: Ramp,
    pub blue: Ramp,
    /// Centre of mass and Lagrange point markers
    pub marker: [f32; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            red: [
                rgb(0, 0, 0),
                rgb(136, 20, 0),
                rgb(228, 92, 16),
                rgb(252, 160, 68),
                rgb(252, 224, 168),
            ],
            green: [
                rgb(0, 0, 0),
                rgb(0, 120, 0),
                rgb(0, 184, 0),
                rgb(184, 248, 24),
                rgb(216, 248, 120),
            ],
            blue: [
                rgb(0, 0, 0),
                rgb(0, 0, 252),
                rgb(0, 120, 248),
                rgb(60, 188, 252),
                rgb(164, 228, 252),
            ],
            marker: [1.0, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;
    use std::time::Duration;

    #[test]
    fn empty_mapping_gives_defaults() {
        let config = SimConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.physics.grav_constant, GRAV_CONSTANT);
        assert_eq!(config.physics.integration_method, IntegrationMethod::Rk4);
        assert_eq!(config.trail.capacity, NUM_TRAIL_PTS);
        assert_eq!(config.ships.start_position, [0.0, 0.0, 1.3e7]);
        assert_eq!(config.palette.green[4], rgb(216, 248, 120));
    }

    #[test]
    fn default_physics_matches_the_default_clock() {
        let physics = PhysicsConfig::default();
        let clock = SimClock::new(physics.time_scale, physics.max_frame_ms);
        let long_frame = Duration::from_secs(1);

        assert_eq!(physics.max_frame_ms, DEFAULT_MAX_FRAME_MS);
        assert_eq!(clock.frame_dt(long_frame), SimClock::default().frame_dt(long_frame));
        assert_eq!(clock.frame_dt(long_frame), 0.1);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r#"
window:
  title: "Test"
physics:
  integration_method: "euler"
  time_scale: 64
ships:
  start_velocity: [5.2e3, 0.0, 0.0]
  seed: 7
trail:
  capacity: 16
"#;
        let config = SimConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.height, 720);
        assert_eq!(config.physics.integration_method, IntegrationMethod::Euler);
        assert_eq!(config.physics.time_scale, 64);
        assert_eq!(config.physics.moon_period, MOON_PERIOD);
        assert_eq!(config.ships.start_velocity, [5.2e3, 0.0, 0.0]);
        assert_eq!(config.ships.seed, Some(7));
        assert_eq!(config.ships.thrust_accel, DEFAULT_THRUST_ACCEL);
        assert_eq!(config.trail.capacity, 16);
        assert_eq!(config.trail.duration, 5000.0);
    }

    #[test]
    fn unknown_integrator_is_rejected() {
        let err = SimConfig::from_yaml_str("physics:\n  integration_method: \"leapfrog\"\n").unwrap_err();
        assert!(err.to_string().contains("leapfrog") || err.to_string().contains("variant"));
    }
}
