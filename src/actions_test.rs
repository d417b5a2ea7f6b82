use super::*;
use crate::model::EditorMode;

fn stores_with_object() -> (Stores, ObjId) {
    let stores = Stores::new();
    let id = create_object(&stores, ObjKind::Cube, "Box", [0.0, 1.0, 0.0]);
    (stores, id)
}

fn state_ids(stores: &Stores, obj_id: &str) -> Vec<String> {
    stores
        .scene
        .read(|s| s.content[obj_id].states.iter().map(|st| st.id.clone()).collect())
}

#[test]
fn create_object_inserts_and_selects() {
    let (stores, id) = stores_with_object();
    assert!(stores.scene.read(|s| s.object(&id).is_some()));
    let editor = stores.editor.get();
    assert_eq!(editor.selected_obj_id.as_deref(), Some(id.as_str()));
    assert_eq!(editor.obj_state_idx_map.get(&id), Some(&0));
}

#[test]
fn delete_object_clears_selection() {
    let (stores, id) = stores_with_object();
    assert!(delete_object(&stores, &id));
    assert!(stores.scene.get().content.is_empty());
    assert!(stores.editor.get().selected_obj_id.is_none());
    assert!(!delete_object(&stores, &id));
}

#[test]
fn add_state_selects_new_copy() {
    let (stores, id) = stores_with_object();
    assert_eq!(add_state_to_selection(&stores), Some(1));
    assert_eq!(add_state_to_selection(&stores), Some(2));
    assert_eq!(state_ids(&stores, &id).len(), 3);
    assert_eq!(stores.editor.get().selected_state_idx(), 2);
}

#[test]
fn add_state_without_selection_is_none() {
    let stores = Stores::new();
    assert_eq!(add_state_to_selection(&stores), None);
}

#[test]
fn add_state_for_dangling_selection_is_none() {
    let stores = Stores::new();
    stores.editor.update(|e| e.select(Some("gone".into())));
    assert_eq!(add_state_to_selection(&stores), None);
    assert_eq!(stores.editor.get().selected_state_idx(), 0);
}

#[test]
fn remove_state_keeps_index_valid() {
    let (stores, id) = stores_with_object();
    add_state_to_selection(&stores);
    assert_eq!(remove_state_from_selection(&stores), Some(0));
    assert_eq!(state_ids(&stores, &id).len(), 1);

    assert_eq!(remove_state_from_selection(&stores), Some(0));
    assert_eq!(state_ids(&stores, &id).len(), 1);
}

#[test]
fn connect_cycle_starts_cycles_and_clears() {
    let (stores, id) = stores_with_object();
    add_state_to_selection(&stores);
    let ids = state_ids(&stores, &id);
    stores.editor.update(|e| e.set_selected_state_idx(0));

    assert_eq!(advance_connect(&stores), ConnectStep::Started(Trigger::Click));
    assert!(complete_connect(&stores, &ids[1]));
    let first = stores.scene.read(|s| s.content[&id].states[0].clone());
    assert_eq!(first.trigger, Trigger::Click);
    assert_eq!(first.transition_to, ids[1]);

    assert_eq!(advance_connect(&stores), ConnectStep::Started(Trigger::Click));
    assert_eq!(advance_connect(&stores), ConnectStep::Cycled(Trigger::HoverStart));
    assert_eq!(advance_connect(&stores), ConnectStep::Cycled(Trigger::HoverEnd));
    assert_eq!(advance_connect(&stores), ConnectStep::Cycled(Trigger::Auto));
    assert_eq!(advance_connect(&stores), ConnectStep::Cleared);

    let first = stores.scene.read(|s| s.content[&id].states[0].clone());
    assert!(first.trigger.is_none());
    assert!(first.transition_to.is_empty());
    assert!(!stores.editor.get().is_connecting());
}

#[test]
fn complete_connect_with_hover_trigger() {
    let (stores, id) = stores_with_object();
    add_state_to_selection(&stores);
    let ids = state_ids(&stores, &id);

    assert_eq!(advance_connect(&stores), ConnectStep::Started(Trigger::Click));
    advance_connect(&stores);
    assert!(complete_connect(&stores, &ids[0]));
    let from = stores.scene.read(|s| s.content[&id].states[1].clone());
    assert_eq!(from.trigger, Trigger::HoverStart);
    assert_eq!(from.transition_to, ids[0]);
}

#[test]
fn complete_connect_without_session_or_target_fails() {
    let (stores, _id) = stores_with_object();
    assert!(!complete_connect(&stores, "whatever"));
    advance_connect(&stores);
    assert!(!complete_connect(&stores, "missing-state"));
    assert!(!stores.editor.get().is_connecting());
}

#[test]
fn connect_is_unavailable_without_selection() {
    let stores = Stores::new();
    assert_eq!(advance_connect(&stores), ConnectStep::Unavailable);
}

#[test]
fn entering_play_ends_connect_session() {
    let (stores, _id) = stores_with_object();
    advance_connect(&stores);
    stores.editor.update(|e| e.toggle_mode());
    let editor = stores.editor.get();
    assert_eq!(editor.mode, EditorMode::Play);
    assert!(!editor.is_connecting());
}
