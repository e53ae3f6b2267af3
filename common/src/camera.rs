//! Camera system for the 3D viewer

use glam::{Mat4, Quat, Vec3};
use std::f32::consts::TAU;

/// Pitch is kept just short of straight up/down so the view basis never degenerates.
const MAX_PITCH: f32 = 0.249 * TAU;

/// Multiplicative zoom factor per scroll notch
pub const ZOOM_STEP: f32 = 0.9;

/// How the camera position is derived each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Camera sits at an externally supplied eye position (e.g. the player ship)
    FirstPerson,
    /// Camera orbits the target at `distance`, steered by yaw/pitch
    ThirdPerson,
}

/// 3D perspective camera with orbital controls
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    pub mode: CameraMode,
    // Orbital parameters
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Camera3D {
    pub fn new(aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 35.0f32.to_radians(),
            aspect_ratio,
            near: 0.1,
            far: 1.0e5,
            mode: CameraMode::ThirdPerson,
            distance: 10.0,
            yaw: 0.0,
            pitch: 0.0,
        };
        camera.update_orbital();
        camera
    }

    /// Offset of the eye from the target for the current orbital parameters.
    ///
    /// Rotates `(0, 0, distance)` by pitch about X, then yaw about Y.
    pub fn orbital_offset(&self) -> Vec3 {
        let rotation = Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch);
        rotation * Vec3::new(0.0, 0.0, self.distance)
    }

    /// Update camera position based on orbital parameters
    pub fn update_orbital(&mut self) {
        if self.mode == CameraMode::ThirdPerson {
            self.position = self.target + self.orbital_offset();
        }
    }

    /// Place the eye directly, used in first-person mode
    pub fn set_eye(&mut self, eye: Vec3) {
        self.position = eye;
    }

    /// Orbit the camera around the target
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(TAU);
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.update_orbital();
    }

    /// Zoom by whole scroll notches; positive notches move closer
    pub fn zoom(&mut self, notches: f32) {
        self.distance = (self.distance * ZOOM_STEP.powf(notches)).max(self.near * 2.0);
        self.update_orbital();
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Get the combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn update_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }
}

/// Camera uniform data for shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub position: [f32; 4],
    /// Direction towards the light source, w unused
    pub light_dir: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera_3d(camera: &Camera3D, light_dir: Vec3) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
            light_dir: [light_dir.x, light_dir.y, light_dir.z, 0.0],
        }
    }
}
