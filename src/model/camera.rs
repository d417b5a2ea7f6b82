//! Orbit camera domain.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::Vec3;

pub const DEFAULT_CAMERA_DISTANCE: f64 = 1.0;
pub const MIN_CAMERA_DISTANCE: f64 = 0.01;

/// Persisted camera shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    pub distance: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub origin: Vec3,
}

impl Default for CameraData {
    fn default() -> Self {
        Self { distance: DEFAULT_CAMERA_DISTANCE, yaw: 0.0, pitch: 0.0, origin: [0.0; 3] }
    }
}

/// Store-side camera state. `is_dragging` is local only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraState {
    pub data: CameraData,
    pub is_dragging: bool,
}

impl CameraState {
    /// Rotate around the origin. Pitch stays within a quarter turn of level.
    pub fn orbit(&mut self, delta_yaw: f64, delta_pitch: f64) {
        self.data.yaw += delta_yaw;
        self.data.pitch = (self.data.pitch + delta_pitch).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Scale the orbit distance by `factor`. Non-positive factors are ignored.
    pub fn zoom(&mut self, factor: f64) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        self.data.distance = (self.data.distance * factor).max(MIN_CAMERA_DISTANCE);
    }

    pub fn set_origin(&mut self, origin: Vec3) {
        self.data.origin = origin;
    }
}
