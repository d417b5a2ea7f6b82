//! Scene content: objects, their behavior states, and authoring operations.
//!
//! Each object owns an ordered, never-empty list of states. Index 0 is the
//! base state. A state may name a trigger and a target state id, forming a
//! small per-object state machine the player walks at runtime.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ObjId, ObjKind, Transform, Trigger, Vec3, new_id};

/// Light position for a fresh scene.
pub const DEFAULT_LIGHT_POSITION: Vec3 = [0.3, 0.3, 0.3];

/// One authored pose plus an optional outgoing transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjState {
    pub id: String,
    pub transform: Transform,
    pub trigger: Trigger,
    /// Target `ObjState::id`, or empty for no transition.
    pub transition_to: String,
}

impl ObjState {
    /// New state with a fresh id and no transition.
    #[must_use]
    pub fn new(transform: Transform) -> Self {
        Self { id: new_id(), transform, trigger: Trigger::None, transition_to: String::new() }
    }

    #[must_use]
    pub fn has_transition(&self) -> bool {
        !self.trigger.is_none() && !self.transition_to.is_empty()
    }

    fn clear_transition(&mut self) {
        self.trigger = Trigger::None;
        self.transition_to.clear();
    }
}

/// A primitive placed in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(rename = "type")]
    pub kind: ObjKind,
    pub name: String,
    pub states: Vec<ObjState>,
}

impl SceneObject {
    /// Object with a single base state at `position`.
    #[must_use]
    pub fn new(kind: ObjKind, name: impl Into<String>, position: Vec3) -> Self {
        Self { kind, name: name.into(), states: vec![ObjState::new(Transform::at(position))] }
    }

    #[must_use]
    pub fn base_state(&self) -> Option<&ObjState> {
        self.states.first()
    }

    #[must_use]
    pub fn state_index(&self, state_id: &str) -> Option<usize> {
        self.states.iter().position(|s| s.id == state_id)
    }
}

/// Synchronized scene domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneData {
    pub light_position: Vec3,
    pub content: BTreeMap<ObjId, SceneObject>,
}

impl Default for SceneData {
    fn default() -> Self {
        Self { light_position: DEFAULT_LIGHT_POSITION, content: BTreeMap::new() }
    }
}

// =============================================================================
// OBJECT OPERATIONS
// =============================================================================

impl SceneData {
    /// Insert a new object with one base state at `position`. Returns its id.
    pub fn insert_object(&mut self, kind: ObjKind, name: impl Into<String>, position: Vec3) -> ObjId {
        let id = new_id();
        self.content.insert(id.clone(), SceneObject::new(kind, name, position));
        id
    }

    pub fn remove_object(&mut self, obj_id: &str) -> Option<SceneObject> {
        self.content.remove(obj_id)
    }

    /// Rename an object. Returns false if the object does not exist.
    pub fn rename_object(&mut self, obj_id: &str, name: impl Into<String>) -> bool {
        let Some(obj) = self.content.get_mut(obj_id) else {
            return false;
        };
        obj.name = name.into();
        true
    }

    pub fn set_light_position(&mut self, position: Vec3) {
        self.light_position = position;
    }

    #[must_use]
    pub fn object(&self, obj_id: &str) -> Option<&SceneObject> {
        self.content.get(obj_id)
    }
}

// =============================================================================
// STATE OPERATIONS
// =============================================================================

impl SceneData {
    /// Insert a copy of the state at `current_idx` right after it.
    ///
    /// The new state clones the transform of `current_idx` (or of the last
    /// state when `current_idx` is out of range), gets a fresh id and no
    /// transition. Returns the index of the new state, or `current_idx`
    /// unchanged when the object is unknown.
    pub fn add_obj_state(&mut self, obj_id: &str, current_idx: usize) -> usize {
        let Some(states) = self.content.get_mut(obj_id).map(|o| &mut o.states) else {
            return current_idx;
        };
        let Some(base) = states.get(current_idx).or_else(|| states.last()) else {
            return current_idx;
        };

        let new_state = ObjState::new(base.transform);
        let insert_at = (current_idx + 1).min(states.len());
        states.insert(insert_at, new_state);
        insert_at
    }

    /// Remove the state at `idx`, keeping at least one state.
    ///
    /// Returns the index that should be selected afterwards: `idx` clamped to
    /// the new length. Removing the last remaining state is a no-op. Other
    /// states whose transition targeted the removed state lose that
    /// transition.
    pub fn remove_obj_state(&mut self, obj_id: &str, idx: usize) -> usize {
        let Some(states) = self.content.get_mut(obj_id).map(|o| &mut o.states) else {
            return idx;
        };
        if states.len() <= 1 || idx >= states.len() {
            return idx.min(states.len().saturating_sub(1));
        }

        let removed = states.remove(idx);
        for state in states.iter_mut() {
            if state.transition_to == removed.id {
                state.clear_transition();
            }
        }
        idx.min(states.len() - 1)
    }

    /// Replace the transform of a state. Returns false if it does not exist.
    pub fn set_transform(&mut self, obj_id: &str, idx: usize, transform: Transform) -> bool {
        self.with_state(obj_id, idx, |s| s.transform = transform)
    }

    pub fn set_position(&mut self, obj_id: &str, idx: usize, position: Vec3) -> bool {
        self.with_state(obj_id, idx, |s| s.transform.position = position)
    }

    pub fn set_rotation(&mut self, obj_id: &str, idx: usize, rotation: Vec3) -> bool {
        self.with_state(obj_id, idx, |s| s.transform.rotation = rotation)
    }

    pub fn set_scale(&mut self, obj_id: &str, idx: usize, scale: Vec3) -> bool {
        self.with_state(obj_id, idx, |s| s.transform.scale = scale)
    }

    /// Point the transition of `state_id` at `target_id` under `trigger`.
    ///
    /// Setting `Trigger::None` clears the transition. Returns false when the
    /// object or either state does not exist.
    pub fn set_transition(&mut self, obj_id: &str, state_id: &str, trigger: Trigger, target_id: &str) -> bool {
        let Some(obj) = self.content.get_mut(obj_id) else {
            return false;
        };
        if obj.state_index(target_id).is_none() {
            return false;
        }
        let Some(state) = obj.states.iter_mut().find(|s| s.id == state_id) else {
            return false;
        };
        if trigger.is_none() {
            state.clear_transition();
        } else {
            state.trigger = trigger;
            state.transition_to = target_id.to_string();
        }
        true
    }

    /// Remove the outgoing transition of `state_id`.
    pub fn clear_transition(&mut self, obj_id: &str, state_id: &str) -> bool {
        let Some(state) = self
            .content
            .get_mut(obj_id)
            .and_then(|o| o.states.iter_mut().find(|s| s.id == state_id))
        else {
            return false;
        };
        state.clear_transition();
        true
    }

    fn with_state(&mut self, obj_id: &str, idx: usize, f: impl FnOnce(&mut ObjState)) -> bool {
        match self.content.get_mut(obj_id).and_then(|o| o.states.get_mut(idx)) {
            Some(state) => {
                f(state);
                true
            }
            None => false,
        }
    }
}

/// Display label for a state index.
#[must_use]
pub fn state_label(idx: usize) -> String {
    if idx == 0 { "Base State".to_string() } else { format!("State {idx}") }
}
