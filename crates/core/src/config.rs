//! Viewer configuration.
//!
//! Read from a JSON object; every field is optional and falls back to the
//! default viewer setup (a 384x216 canvas orbiting `(0, 0, 2)` at distance 3
//! with a 75° field of view).

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TracerError;
use crate::frame::MouseAngles;

/// Canvas size, orbit setup, and pointer sensitivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracerConfig {
    /// Accumulation resolution in pixels.
    pub width: u32,
    pub height: u32,
    /// Orbit target.
    pub anchor: [f32; 3],
    pub orbit_distance: f32,
    /// Degrees.
    pub field_of_view: f32,
    /// Pixels of pointer travel per radian, for (azimuth, polar).
    pub sensitivity: [f32; 2],
    /// Starting (azimuth, polar) in radians.
    pub initial_angles: [f32; 2],
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            width: 2 * 192,
            height: 2 * 108,
            anchor: [0.0, 0.0, 2.0],
            orbit_distance: 3.0,
            field_of_view: 75.0,
            sensitivity: [100.0, 100.0],
            initial_angles: [0.0, FRAC_PI_2],
        }
    }
}

impl TracerConfig {
    /// Parses and validates a JSON object.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for unknown keys, wrong types, or out-of-range values.
    pub fn from_json(value: &Value) -> Result<Self, TracerError> {
        let config = Self::deserialize(value)
            .map_err(|e| TracerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates JSON text.
    ///
    /// # Errors
    ///
    /// As [`from_json`](Self::from_json), plus malformed JSON.
    pub fn from_json_str(text: &str) -> Result<Self, TracerError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| TracerError::InvalidConfig(e.to_string()))?;
        Self::from_json(&value)
    }

    /// # Errors
    ///
    /// `InvalidConfig` naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), TracerError> {
        let fail = |msg: String| Err(TracerError::InvalidConfig(msg));

        if self.width == 0 || self.height == 0 {
            return fail(format!(
                "width and height must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        if !self.anchor.iter().all(|c| c.is_finite()) {
            return fail(format!("anchor {:?} is not finite", self.anchor));
        }
        if !(self.orbit_distance.is_finite() && self.orbit_distance > 0.0) {
            return fail(format!(
                "orbit_distance must be positive, got {}",
                self.orbit_distance
            ));
        }
        if !(self.field_of_view > 0.0 && self.field_of_view < 180.0) {
            return fail(format!(
                "field_of_view must be in (0, 180), got {}",
                self.field_of_view
            ));
        }
        if !self.sensitivity.iter().all(|s| s.is_finite() && *s > 0.0) {
            return fail(format!(
                "sensitivity must be positive, got {:?}",
                self.sensitivity
            ));
        }
        let [azimuth, polar] = self.initial_angles;
        if !azimuth.is_finite() || !(0.0..=PI).contains(&polar) {
            return fail(format!(
                "initial_angles must be finite with polar in [0, π], got {:?}",
                self.initial_angles
            ));
        }
        Ok(())
    }

    pub fn anchor(&self) -> Vec3 {
        Vec3::from_array(self.anchor)
    }

    pub fn sensitivity(&self) -> Vec2 {
        Vec2::from_array(self.sensitivity)
    }

    pub fn initial_angles(&self) -> MouseAngles {
        MouseAngles::new(self.initial_angles[0], self.initial_angles[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn default_config_is_valid() {
        let config = TracerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.width, config.height), (384, 216));
        assert_eq!(config.anchor(), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = TracerConfig::from_json(&json!({})).unwrap();
        assert_eq!(config, TracerConfig::default());
    }

    #[test]
    fn partial_object_overrides_only_given_fields() {
        let config = TracerConfig::from_json(&json!({"width": 64, "field_of_view": 40.0})).unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 216);
        assert!((config.field_of_view - 40.0).abs() < f32::EPSILON);
        assert!((config.orbit_distance - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = TracerConfig::from_json(&json!({"widht": 64})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert!(err.to_string().contains("widht"), "got: {err}");
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = TracerConfig::from_json(&json!({"width": "wide"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn zero_size_is_rejected() {
        let err = TracerConfig::from_json(&json!({"height": 0})).unwrap_err();
        assert!(err.to_string().contains("non-zero"), "got: {err}");
    }

    #[test]
    fn out_of_range_fov_is_rejected() {
        assert!(TracerConfig::from_json(&json!({"field_of_view": 180.0})).is_err());
        assert!(TracerConfig::from_json(&json!({"field_of_view": 0.0})).is_err());
    }

    #[test]
    fn polar_outside_range_is_rejected() {
        assert!(TracerConfig::from_json(&json!({"initial_angles": [0.0, 4.0]})).is_err());
    }

    #[test]
    fn malformed_text_is_invalid_config() {
        let err = TracerConfig::from_json_str("{width: 3").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn serializes_back_to_the_same_config() {
        let config = TracerConfig {
            width: 32,
            ..TracerConfig::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(TracerConfig::from_json_str(&text).unwrap(), config);
    }
}
