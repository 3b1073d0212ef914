//! Camera and accumulation state shared by the pointer and frame callbacks.
//!
//! Owned by the loop controller. Pointer drags rotate the orbit and restart
//! accumulation; each drawn frame advances the counter.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::config::TracerConfig;
use crate::frame::{DrawInfo, MouseAngles};

/// Input-side state turned into a [`DrawInfo`] every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInputState {
    angles: MouseAngles,
    frame_index: u32,
    last_pointer: Option<Vec2>,
    sensitivity: Vec2,
    anchor: Vec3,
    orbit_distance: f32,
    field_of_view: f32,
}

impl EngineInputState {
    pub fn new(config: &TracerConfig) -> Self {
        Self {
            angles: config.initial_angles(),
            frame_index: 0,
            last_pointer: None,
            sensitivity: config.sensitivity(),
            anchor: config.anchor(),
            orbit_distance: config.orbit_distance,
            field_of_view: config.field_of_view,
        }
    }

    /// Handles a pointer move to `(x, y)` in surface pixels.
    ///
    /// The pointer position is always tracked. Only while the primary button
    /// is held does the delta rotate the camera: azimuth wraps into
    /// (-2π, 2π), polar clamps to [0, π], and the frame counter resets.
    /// Returns whether the camera changed.
    pub fn pointer_moved(&mut self, x: f32, y: f32, primary_down: bool) -> bool {
        let position = Vec2::new(x, y);
        let previous = self.last_pointer.replace(position);
        if !primary_down {
            return false;
        }
        // First event after the pointer enters carries no usable delta.
        let Some(previous) = previous else {
            return false;
        };

        let delta = (position - previous) / self.sensitivity;
        if delta == Vec2::ZERO {
            return false;
        }
        self.angles.azimuth = (self.angles.azimuth - delta.x) % TAU;
        self.angles.polar = (self.angles.polar - delta.y).clamp(0.0, PI);
        self.frame_index = 0;
        true
    }

    /// Forgets the last pointer position, e.g. when the pointer leaves the surface.
    pub fn pointer_left(&mut self) {
        self.last_pointer = None;
    }

    /// Restarts accumulation without moving the camera.
    pub fn reset_accumulation(&mut self) {
        self.frame_index = 0;
    }

    /// Counts one drawn frame.
    pub fn advance_frame(&mut self) {
        self.frame_index = self.frame_index.saturating_add(1);
    }

    pub fn angles(&self) -> MouseAngles {
        self.angles
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Snapshot for the next `draw`.
    pub fn draw_info(&self) -> DrawInfo {
        DrawInfo {
            mouse_angles: self.angles,
            camera_anchor: self.anchor,
            orbit_distance: self.orbit_distance,
            field_of_view: self.field_of_view,
            frame_index: self.frame_index,
        }
    }
}
