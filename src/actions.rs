//! Cross-store authoring actions.
//!
//! Interaction handles usually touch the scene and the editor together
//! (create an object and select it, add a state and make it active). Each
//! action here performs those edits through the stores, one store at a time,
//! so each domain's sync picks its own change up independently.

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

use crate::model::{ObjId, ObjKind, Trigger, Vec3};
use crate::sync::Stores;

/// Result of pressing the connect handle on the selected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    /// Nothing selected, or the selection has no such state.
    Unavailable,
    /// A session opened with this trigger.
    Started(Trigger),
    /// The session moved on to this trigger.
    Cycled(Trigger),
    /// The cycle ran out; the session closed and the source state's
    /// transition was removed.
    Cleared,
}

/// Insert an object and select it.
pub fn create_object(stores: &Stores, kind: ObjKind, name: &str, position: Vec3) -> ObjId {
    let id = stores.scene.update(|scene| scene.insert_object(kind, name, position));
    stores.editor.update(|editor| editor.select(Some(id.clone())));
    id
}

/// Remove an object and every editor reference to it.
pub fn delete_object(stores: &Stores, obj_id: &str) -> bool {
    let removed = stores.scene.update(|scene| scene.remove_object(obj_id)).is_some();
    stores.editor.update(|editor| editor.forget_object(obj_id));
    removed
}

/// Duplicate the selected object's active state right after it and make
/// the copy active. Returns the new active index.
pub fn add_state_to_selection(stores: &Stores) -> Option<usize> {
    let (obj_id, current) = selection(stores)?;
    let new_idx = stores.scene.update(|scene| {
        scene
            .object(&obj_id)
            .is_some()
            .then(|| scene.add_obj_state(&obj_id, current))
    })?;
    stores.editor.update(|editor| editor.set_selected_state_idx(new_idx));
    Some(new_idx)
}

/// Remove the selected object's active state, keeping at least one, and
/// keep the active index in range. Returns the new active index.
pub fn remove_state_from_selection(stores: &Stores) -> Option<usize> {
    let (obj_id, current) = selection(stores)?;
    let new_idx = stores.scene.update(|scene| {
        scene
            .object(&obj_id)
            .is_some()
            .then(|| scene.remove_obj_state(&obj_id, current))
    })?;
    stores.editor.update(|editor| editor.set_selected_state_idx(new_idx));
    Some(new_idx)
}

/// Start, advance or finish a connect session from the selected state.
pub fn advance_connect(stores: &Stores) -> ConnectStep {
    if stores.editor.read(|editor| !editor.is_connecting()) {
        let Some((obj_id, idx)) = selection(stores) else {
            return ConnectStep::Unavailable;
        };
        let Some(state_id) = stores
            .scene
            .read(|scene| scene.object(&obj_id).and_then(|o| o.states.get(idx)).map(|s| s.id.clone()))
        else {
            return ConnectStep::Unavailable;
        };
        let trigger = stores.editor.update(|editor| {
            editor.start_connecting(obj_id, state_id);
            editor.connecting.as_ref().map_or(Trigger::ORDER[0], |c| c.trigger)
        });
        return ConnectStep::Started(trigger);
    }

    let source = stores
        .editor
        .read(|editor| editor.connecting.as_ref().map(|c| (c.from_obj_id.clone(), c.from_state_id.clone())));
    match stores.editor.update(|editor| editor.cycle_connecting_trigger()) {
        Some(trigger) => ConnectStep::Cycled(trigger),
        None => {
            if let Some((obj_id, state_id)) = source {
                stores.scene.update(|scene| scene.clear_transition(&obj_id, &state_id));
            }
            ConnectStep::Cleared
        }
    }
}

/// Finish the open session by pointing the source state at
/// `target_state_id` with the session's trigger. Returns false when no
/// session is open or the target does not exist; the session closes either
/// way.
pub fn complete_connect(stores: &Stores, target_state_id: &str) -> bool {
    let Some(session) = stores.editor.update(|editor| editor.cancel_connecting()) else {
        return false;
    };
    stores.scene.update(|scene| {
        scene.set_transition(&session.from_obj_id, &session.from_state_id, session.trigger, target_state_id)
    })
}

fn selection(stores: &Stores) -> Option<(ObjId, usize)> {
    stores
        .editor
        .read(|editor| editor.selected_obj_id.clone().map(|id| (id, editor.selected_state_idx())))
}
