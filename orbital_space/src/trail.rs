//! Fixed-capacity position history drawn behind moving bodies

use crate::math::lerp_colour;
use glam::DVec3;

/// Default number of samples kept per trail
pub const NUM_TRAIL_PTS: usize = 1000;

/// Circular buffer of recent world positions.
///
/// Every `update` writes one sample. Once `capacity` samples exist the
/// oldest is overwritten, so `len() == min(updates, capacity)` always holds.
#[derive(Debug, Clone)]
pub struct Trail {
    points: Vec<DVec3>,
    head_id: usize,
    tail_id: usize,
    len: usize,
    /// Intended time span of the trail in seconds. Sampling is not gated on
    /// it: every update writes a slot, so at slow time scales the buffer
    /// covers less than `duration`.
    pub duration: f64,
    /// Simulation time fed through `update` since creation or `clear`
    total_time: f64,
    pub col_old: [f32; 3],
    pub col_new: [f32; 3],
}

impl Trail {
    pub fn new(duration: f64, col_old: [f32; 3], col_new: [f32; 3]) -> Self {
        Self::with_capacity(NUM_TRAIL_PTS, duration, col_old, col_new)
    }

    /// A trail holding `capacity` samples (at least one)
    pub fn with_capacity(capacity: usize, duration: f64, col_old: [f32; 3], col_new: [f32; 3]) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: vec![DVec3::ZERO; capacity],
            // The first push lands in slot 0
            head_id: capacity - 1,
            tail_id: 0,
            len: 0,
            duration,
            total_time: 0.0,
            col_old,
            col_new,
        }
    }

    /// Record `pos` as the newest sample
    pub fn update(&mut self, dt: f64, pos: DVec3) {
        self.total_time += dt;

        let n = self.points.len();
        self.head_id = (self.head_id + 1) % n;
        self.points[self.head_id] = pos;
        if self.len == n {
            self.tail_id = (self.tail_id + 1) % n;
        } else {
            self.len += 1;
        }
    }

    /// Forget every sample
    pub fn clear(&mut self) {
        self.head_id = self.points.len() - 1;
        self.tail_id = 0;
        self.len = 0;
        self.total_time = 0.0;
    }

    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot of the newest sample
    pub fn head_id(&self) -> usize {
        self.head_id
    }

    /// Slot of the oldest valid sample
    pub fn tail_id(&self) -> usize {
        self.tail_id
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn newest(&self) -> Option<DVec3> {
        (!self.is_empty()).then(|| self.points[self.head_id])
    }

    pub fn oldest(&self) -> Option<DVec3> {
        (!self.is_empty()).then(|| self.points[self.tail_id])
    }

    /// Valid samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = DVec3> + '_ {
        let n = self.points.len();
        (0..self.len).map(move |i| self.points[(self.tail_id + i) % n])
    }

    /// Samples paired with their age colour, oldest (`col_old`) first
    pub fn coloured_points(&self) -> impl Iterator<Item = (DVec3, [f32; 3])> + '_ {
        let n = self.points.len() as f32;
        self.iter()
            .enumerate()
            .map(move |(i, p)| (p, lerp_colour(self.col_old, self.col_new, i as f32 / n)))
    }
}
