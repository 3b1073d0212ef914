//! Per-frame input to [`PathTracerEngine::draw`](crate::render::PathTracerEngine::draw).

use std::f32::consts::PI;

use glam::Vec3;

use crate::error::TracerError;

/// Spherical view angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseAngles {
    /// φ, unconstrained.
    pub azimuth: f32,
    /// θ from the +z pole, in [0, π].
    pub polar: f32,
}

impl MouseAngles {
    pub fn new(azimuth: f32, polar: f32) -> Self {
        Self { azimuth, polar }
    }
}

/// Everything the engine needs to draw one frame. Built by the loop
/// controller each frame; not retained by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawInfo {
    pub mouse_angles: MouseAngles,
    /// Orbit target.
    pub camera_anchor: Vec3,
    /// Distance from the anchor along the basis' front axis, > 0.
    pub orbit_distance: f32,
    /// Full vertical field of view in degrees, in (0, 180).
    pub field_of_view: f32,
    /// Frames accumulated since the camera last changed.
    pub frame_index: u32,
}

impl DrawInfo {
    /// Checks the invariants `draw` relies on.
    ///
    /// # Errors
    ///
    /// `InvalidDrawInfo` describing the first violated invariant.
    pub fn validate(&self) -> Result<(), TracerError> {
        let invalid = |msg: String| Err(TracerError::InvalidDrawInfo(msg));

        let MouseAngles { azimuth, polar } = self.mouse_angles;
        if !azimuth.is_finite() || !polar.is_finite() {
            return invalid(format!("angles must be finite, got ({azimuth}, {polar})"));
        }
        if !(0.0..=PI).contains(&polar) {
            return invalid(format!("polar angle {polar} outside [0, π]"));
        }
        if !self.camera_anchor.is_finite() {
            return invalid(format!("camera anchor {} is not finite", self.camera_anchor));
        }
        if !(self.orbit_distance.is_finite() && self.orbit_distance > 0.0) {
            return invalid(format!(
                "orbit distance must be positive, got {}",
                self.orbit_distance
            ));
        }
        if !(self.field_of_view > 0.0 && self.field_of_view < 180.0) {
            return invalid(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.field_of_view
            ));
        }
        Ok(())
    }

    /// `tan(fov / 2)`, the half-extent of the image plane at unit distance.
    pub fn fov_tangent(&self) -> f32 {
        (self.field_of_view.to_radians() * 0.5).tan()
    }
}
