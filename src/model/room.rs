//! Room-scan domain: planes captured once per session from the XR
//! environment. Pushed on demand rather than continuously.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One detected plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlane {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_label: Option<String>,
    pub orientation: Orientation,
    /// 4x4 pose in the layout the producing XR runtime uses.
    pub pose_matrix: [f64; 16],
    pub polygon: Vec<Point3>,
}

/// Persisted room shape: the plane list.
pub type RoomData = Vec<RoomPlane>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomState {
    pub planes: Vec<RoomPlane>,
}

impl RoomState {
    pub fn set_planes(&mut self, planes: Vec<RoomPlane>) {
        self.planes = planes;
    }

    pub fn clear(&mut self) {
        self.planes.clear();
    }
}
