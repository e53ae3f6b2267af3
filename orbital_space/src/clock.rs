//! Simulation clock: turns wall-clock frame time into a physics step

use std::time::Duration;

pub const MIN_TIME_SCALE: u32 = 1;
pub const MAX_TIME_SCALE: u32 = 1 << 16;

/// Frames longer than this are treated as this long
pub const DEFAULT_MAX_FRAME_MS: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct SimClock {
    time_scale: u32,
    paused: bool,
    single_step: bool,
    sim_time: f64,
    max_frame_ms: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(MIN_TIME_SCALE, DEFAULT_MAX_FRAME_MS)
    }
}

impl SimClock {
    /// `time_scale` is rounded to a power of two inside the allowed range
    pub fn new(time_scale: u32, max_frame_ms: f64) -> Self {
        Self {
            time_scale: time_scale
                .clamp(MIN_TIME_SCALE, MAX_TIME_SCALE)
                .next_power_of_two()
                .min(MAX_TIME_SCALE),
            paused: false,
            single_step: false,
            sim_time: 0.0,
            max_frame_ms: max_frame_ms.max(0.0),
        }
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Seconds of simulated time elapsed so far
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Simulated seconds for a frame that took `elapsed` of wall time
    pub fn frame_dt(&self, elapsed: Duration) -> f64 {
        let ms = (elapsed.as_secs_f64() * 1000.0).min(self.max_frame_ms);
        self.time_scale as f64 * ms / 1000.0
    }

    /// Advance the clock for one frame.
    ///
    /// Returns the step to integrate, or `None` while paused. A pending
    /// single step runs once and then pauses again.
    pub fn tick(&mut self, elapsed: Duration) -> Option<f64> {
        let dt = self.frame_dt(elapsed);
        let step = if self.paused {
            None
        } else {
            self.sim_time += dt;
            Some(dt)
        };

        if self.single_step {
            self.single_step = false;
            self.paused = true;
        }
        step
    }

    pub fn speed_up(&mut self) {
        self.time_scale = (self.time_scale * 2).min(MAX_TIME_SCALE);
        log::debug!("time scale x{}", self.time_scale);
    }

    pub fn slow_down(&mut self) {
        self.time_scale = (self.time_scale / 2).max(MIN_TIME_SCALE);
        log::debug!("time scale x{}", self.time_scale);
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.single_step = false;
        log::debug!("paused: {}", self.paused);
    }

    /// Run exactly one more update, then pause
    pub fn step_once(&mut self) {
        self.paused = false;
        self.single_step = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn long_frames_are_clamped() {
        let clock = SimClock::default();
        assert_relative_eq!(clock.frame_dt(Duration::from_millis(16)), 0.016, epsilon = 1e-12);
        assert_relative_eq!(clock.frame_dt(Duration::from_secs(3)), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn time_scale_multiplies_the_clamped_step() {
        let mut clock = SimClock::default();
        for _ in 0..4 {
            clock.speed_up();
        }
        assert_eq!(clock.time_scale(), 16);
        assert_relative_eq!(clock.frame_dt(Duration::from_millis(500)), 1.6, epsilon = 1e-12);
    }

    #[test]
    fn time_scale_stays_in_bounds() {
        let mut clock = SimClock::default();
        clock.slow_down();
        assert_eq!(clock.time_scale(), MIN_TIME_SCALE);
        for _ in 0..40 {
            clock.speed_up();
        }
        assert_eq!(clock.time_scale(), MAX_TIME_SCALE);
        assert_eq!(SimClock::new(100, 100.0).time_scale(), 128);
        assert_eq!(SimClock::new(0, 100.0).time_scale(), 1);
    }

    #[test]
    fn paused_clock_does_not_advance() {
        let mut clock = SimClock::default();
        clock.toggle_pause();
        assert_eq!(clock.tick(Duration::from_millis(20)), None);
        assert_eq!(clock.sim_time(), 0.0);
    }

    #[test]
    fn single_step_runs_once_then_pauses() {
        let mut clock = SimClock::default();
        clock.toggle_pause();
        clock.step_once();

        assert!(clock.tick(Duration::from_millis(50)).is_some());
        assert!(clock.is_paused());
        assert_eq!(clock.tick(Duration::from_millis(50)), None);
        assert_relative_eq!(clock.sim_time(), 0.05, epsilon = 1e-12);
    }
}
