//! Vector and rotation helpers on top of glam's double-precision types
//!
//! Physics runs in `f64` metres; rendering converts to camera-relative
//! `f32` megametres at the very end via [`to_render_space`].

use glam::{DQuat, DVec3, Vec3};

/// Metres to render units (megametres)
pub const RENDER_SCALE: f64 = 1.0e-6;

/// Rotate `v` by `angle` radians about `axis` (right-handed).
///
/// `axis` does not need to be unit length; a zero axis leaves `v` unchanged.
pub fn rotate_about_axis(v: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    let axis = axis.normalize_or_zero();
    if axis == DVec3::ZERO {
        return v;
    }
    DQuat::from_axis_angle(axis, angle) * v
}

/// Floating point modulo whose result has the sign of the divisor
pub fn fmod(x: f64, m: f64) -> f64 {
    x - m * (x / m).floor()
}

/// Wrap `x` into the half-open range `[lo, hi)`
pub fn wrap(x: f64, lo: f64, hi: f64) -> f64 {
    lo + fmod(x - lo, hi - lo)
}

/// Linear interpolation between two RGB colours
pub fn lerp_colour(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Convert a world position to camera-relative render space
pub fn to_render_space(pos: DVec3, origin: DVec3) -> Vec3 {
    ((pos - origin) * RENDER_SCALE).as_vec3()
}
