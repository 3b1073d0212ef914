//! Orbit camera basis from spherical angles.
//!
//! θ (polar) is measured from the +z pole, φ (azimuth) in the xy-plane from
//! +x. `front` points from the orbit anchor towards the camera, so the view
//! direction is `-front`.

use glam::{Mat3, Vec3};

use crate::frame::MouseAngles;

/// Orthonormal right-handed camera frame: `right × up = front`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub front: Vec3,
}

impl CameraBasis {
    /// Builds the basis for azimuth φ and polar θ.
    ///
    /// ```text
    /// right = (-sinφ,        cosφ,       0)
    /// up    = (-cosθ·cosφ,  -cosθ·sinφ,  sinθ)
    /// front = ( sinθ·cosφ,   sinθ·sinφ,  cosθ)
    /// ```
    pub fn from_angles(angles: MouseAngles) -> Self {
        let (sin_phi, cos_phi) = angles.azimuth.sin_cos();
        let (sin_theta, cos_theta) = angles.polar.sin_cos();
        Self {
            right: Vec3::new(-sin_phi, cos_phi, 0.0),
            up: Vec3::new(-cos_theta * cos_phi, -cos_theta * sin_phi, sin_theta),
            front: Vec3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta),
        }
    }

    /// Camera position on the orbit: `anchor + distance * front`.
    pub fn orbit_position(&self, anchor: Vec3, distance: f32) -> Vec3 {
        anchor + distance * self.front
    }

    /// Column-major matrix with columns (right, up, front).
    pub fn to_mat3(&self) -> Mat3 {
        Mat3::from_cols(self.right, self.up, self.front)
    }
}
