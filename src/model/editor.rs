//! Editor domain: mode, selection, per-object active state, and the
//! transient transition-authoring session.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ObjId, SceneData, SceneObject, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Edit,
    Play,
}

/// Persisted editor shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorData {
    pub mode: EditorMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_obj_id: Option<ObjId>,
    pub obj_state_idx_map: BTreeMap<ObjId, usize>,
    pub is_hybrid: bool,
}

/// In-progress transition authoring: the source state and the trigger the
/// user is cycling through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectSession {
    pub from_obj_id: ObjId,
    pub from_state_id: String,
    pub trigger: Trigger,
}

/// Store-side editor state. Only the `EditorData` part is synchronized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorState {
    pub mode: EditorMode,
    pub selected_obj_id: Option<ObjId>,
    pub obj_state_idx_map: BTreeMap<ObjId, usize>,
    pub is_hybrid: bool,
    pub is_authoring_animation: bool,
    pub connecting: Option<ConnectSession>,
}

impl EditorState {
    /// Persisted part of the state.
    #[must_use]
    pub fn data(&self) -> EditorData {
        EditorData {
            mode: self.mode,
            selected_obj_id: self.selected_obj_id.clone(),
            obj_state_idx_map: self.obj_state_idx_map.clone(),
            is_hybrid: self.is_hybrid,
        }
    }

    /// Overwrite the persisted part. Transient fields survive unless the new
    /// mode is play, which ends authoring the same way `toggle_mode` does.
    pub fn apply_data(&mut self, data: EditorData) {
        self.mode = data.mode;
        self.selected_obj_id = data.selected_obj_id;
        self.obj_state_idx_map = data.obj_state_idx_map;
        self.is_hybrid = data.is_hybrid;
        if self.mode == EditorMode::Play {
            self.is_authoring_animation = false;
            self.connecting = None;
        }
    }

    /// Switch between edit and play. Entering play ends animation authoring
    /// and any open connect session.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            EditorMode::Edit => EditorMode::Play,
            EditorMode::Play => EditorMode::Edit,
        };
        if self.mode == EditorMode::Play {
            self.is_authoring_animation = false;
            self.connecting = None;
        }
    }

    pub fn set_authoring_animation(&mut self, value: bool) {
        self.is_authoring_animation = value && self.mode == EditorMode::Edit;
    }

    /// Select an object (or clear the selection). The active-state entry for
    /// a newly selected object is created at 0 if missing.
    pub fn select(&mut self, obj_id: Option<ObjId>) {
        if let Some(id) = &obj_id {
            self.obj_state_idx_map.entry(id.clone()).or_insert(0);
        }
        self.selected_obj_id = obj_id;
    }

    /// Active state index for `obj_id`, defaulting to 0.
    #[must_use]
    pub fn obj_state_idx(&self, obj_id: &str) -> usize {
        self.obj_state_idx_map.get(obj_id).copied().unwrap_or(0)
    }

    /// Active state index of the selection, or 0 with nothing selected.
    #[must_use]
    pub fn selected_state_idx(&self) -> usize {
        self.selected_obj_id
            .as_deref()
            .map_or(0, |id| self.obj_state_idx(id))
    }

    /// Set the active state index of the selection. No-op without selection.
    pub fn set_selected_state_idx(&mut self, idx: usize) {
        if let Some(id) = &self.selected_obj_id {
            self.obj_state_idx_map.insert(id.clone(), idx);
        }
    }

    /// Look the selection up in `scene`. The id may dangle after a delete,
    /// in which case this is `None`.
    #[must_use]
    pub fn selected_object<'a>(&self, scene: &'a SceneData) -> Option<&'a SceneObject> {
        self.selected_obj_id.as_deref().and_then(|id| scene.object(id))
    }

    /// Drop every reference to a deleted object.
    pub fn forget_object(&mut self, obj_id: &str) {
        self.obj_state_idx_map.remove(obj_id);
        if self.selected_obj_id.as_deref() == Some(obj_id) {
            self.selected_obj_id = None;
        }
        if self
            .connecting
            .as_ref()
            .is_some_and(|c| c.from_obj_id == obj_id)
        {
            self.connecting = None;
        }
    }
}

// =============================================================================
// CONNECT MODE
// =============================================================================

impl EditorState {
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.connecting.is_some()
    }

    /// Open a connect session from `state_id`, starting at the first trigger.
    pub fn start_connecting(&mut self, obj_id: impl Into<ObjId>, state_id: impl Into<String>) {
        self.connecting = Some(ConnectSession {
            from_obj_id: obj_id.into(),
            from_state_id: state_id.into(),
            trigger: Trigger::ORDER[0],
        });
    }

    /// Advance the session trigger. Returns the new trigger, or `None` when
    /// the cycle reached "no trigger" and the session ended.
    pub fn cycle_connecting_trigger(&mut self) -> Option<Trigger> {
        let session = self.connecting.as_mut()?;
        let next = session.trigger.next();
        if next.is_none() {
            self.connecting = None;
            return None;
        }
        session.trigger = next;
        Some(next)
    }

    pub fn cancel_connecting(&mut self) -> Option<ConnectSession> {
        self.connecting.take()
    }
}
