//! Document model for the four synchronized domains.
//!
//! DESIGN
//! ======
//! Every type here serializes to the exact JSON shape stored remotely: field
//! names are camelCase, enums are their string literals, and "no trigger" /
//! "no target" are empty strings. Store-side state types (`EditorState`,
//! `CameraState`, `RoomState`) carry extra UI-transient fields; the sync
//! layer's projector narrows them to the persisted shapes defined here.

pub mod camera;
pub mod editor;
pub mod room;
pub mod scene;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

pub use camera::{CameraData, CameraState};
pub use editor::{ConnectSession, EditorData, EditorMode, EditorState};
pub use room::{Orientation, Point3, RoomData, RoomPlane, RoomState};
pub use scene::{ObjState, SceneData, SceneObject};

/// Three-component float vector (`[x, y, z]` on the wire).
pub type Vec3 = [f64; 3];

/// Object-id key into `SceneData::content`.
pub type ObjId = String;

// =============================================================================
// PRIMITIVES
// =============================================================================

/// Primitive shape of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjKind {
    Sphere,
    Cube,
    Cone,
}

impl ObjKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Cube => "cube",
            Self::Cone => "cone",
        }
    }
}

/// Pose of one object state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians (x, y, z); the rotation order is not persisted.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Transform at `position` with no rotation and unit scale.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self { position, rotation: [0.0; 3], scale: [1.0; 3] }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at([0.0; 3])
    }
}

/// Event that fires a transition out of an object state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    Click,
    HoverStart,
    HoverEnd,
    Auto,
    /// No active transition. Encoded as `""`.
    #[default]
    #[serde(rename = "")]
    None,
}

impl Trigger {
    /// Cycle order used while authoring a transition.
    pub const ORDER: [Trigger; 5] = [Self::Click, Self::HoverStart, Self::HoverEnd, Self::Auto, Self::None];

    /// Next trigger in `ORDER`, wrapping from `None` back to `Click`.
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|t| *t == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::None
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::HoverStart => "hoverStart",
            Self::HoverEnd => "hoverEnd",
            Self::Auto => "auto",
            Self::None => "",
        }
    }
}

/// Fresh client-side identifier for objects and states.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
