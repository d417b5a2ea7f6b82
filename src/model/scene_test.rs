#![allow(clippy::float_cmp)]

use super::*;
use serde_json::json;

const OBJ: &str = "test-obj-1";

fn state(id: &str, x: f64) -> ObjState {
    ObjState {
        id: id.into(),
        transform: Transform::at([x, 0.0, 0.0]),
        trigger: Trigger::None,
        transition_to: String::new(),
    }
}

fn scene_with_states(ids: &[&str]) -> SceneData {
    let mut scene = SceneData::default();
    let states = ids
        .iter()
        .enumerate()
        .map(|(i, id)| state(id, f64::from(u32::try_from(i).unwrap())))
        .collect();
    scene
        .content
        .insert(OBJ.into(), SceneObject { kind: ObjKind::Cube, name: "Test Cube".into(), states });
    scene
}

fn ids(scene: &SceneData) -> Vec<String> {
    scene.content[OBJ].states.iter().map(|s| s.id.clone()).collect()
}

// =============================================================================
// defaults / wire shape
// =============================================================================

#[test]
fn default_scene_has_light_and_no_content() {
    let scene = SceneData::default();
    assert_eq!(scene.light_position, DEFAULT_LIGHT_POSITION);
    assert!(scene.content.is_empty());
}

#[test]
fn scene_wire_shape_uses_camel_case_and_type_key() {
    let scene = scene_with_states(&["state-0"]);
    let value = serde_json::to_value(&scene).unwrap();
    assert_eq!(value["lightPosition"], json!([0.3, 0.3, 0.3]));
    let obj = &value["content"][OBJ];
    assert_eq!(obj["type"], json!("cube"));
    assert_eq!(obj["name"], json!("Test Cube"));
    assert_eq!(obj["states"][0]["trigger"], json!(""));
    assert_eq!(obj["states"][0]["transitionTo"], json!(""));
    assert_eq!(obj["states"][0]["transform"]["scale"], json!([1.0, 1.0, 1.0]));
}

// =============================================================================
// insert / remove object
// =============================================================================

#[test]
fn insert_object_creates_single_base_state_at_position() {
    let mut scene = SceneData::default();
    let id = scene.insert_object(ObjKind::Sphere, "Ball", [0.0, 1.0, 0.0]);
    let obj = scene.object(&id).unwrap();
    assert_eq!(obj.states.len(), 1);
    assert_eq!(obj.base_state().unwrap().transform.position, [0.0, 1.0, 0.0]);
    assert!(!obj.base_state().unwrap().id.is_empty());
}

#[test]
fn remove_object_returns_removed_value() {
    let mut scene = scene_with_states(&["a"]);
    assert!(scene.remove_object(OBJ).is_some());
    assert!(scene.remove_object(OBJ).is_none());
}

#[test]
fn rename_object_reports_missing_object() {
    let mut scene = scene_with_states(&["a"]);
    assert!(scene.rename_object(OBJ, "Renamed"));
    assert_eq!(scene.content[OBJ].name, "Renamed");
    assert!(!scene.rename_object("missing", "x"));
}

// =============================================================================
// add_obj_state
// =============================================================================

#[test]
fn add_obj_state_inserts_after_current_and_clones_transform() {
    let mut scene = scene_with_states(&["state-0", "state-1", "state-2"]);
    scene.set_rotation(OBJ, 1, [0.1, 0.2, 0.3]);

    let new_idx = scene.add_obj_state(OBJ, 1);

    assert_eq!(new_idx, 2);
    let states = &scene.content[OBJ].states;
    assert_eq!(states.len(), 4);
    assert_eq!(states[0].id, "state-0");
    assert_eq!(states[1].id, "state-1");
    assert_eq!(states[3].id, "state-2");
    assert_eq!(states[2].transform.position, [1.0, 0.0, 0.0]);
    assert_eq!(states[2].transform.rotation, [0.1, 0.2, 0.3]);
    assert!(states[2].trigger.is_none());
    assert!(states[2].transition_to.is_empty());
}

#[test]
fn add_obj_state_generates_fresh_ids() {
    let mut scene = scene_with_states(&["state-0"]);
    scene.add_obj_state(OBJ, 0);
    scene.add_obj_state(OBJ, 0);
    let all = ids(&scene);
    assert_eq!(all.len(), 3);
    assert_ne!(all[1], all[2]);
    assert_ne!(all[1], "state-0");
}

#[test]
fn add_obj_state_out_of_range_clones_last_and_appends() {
    let mut scene = scene_with_states(&["state-0", "state-1"]);
    let new_idx = scene.add_obj_state(OBJ, 9);
    assert_eq!(new_idx, 2);
    assert_eq!(scene.content[OBJ].states[2].transform.position, [1.0, 0.0, 0.0]);
}

#[test]
fn add_obj_state_unknown_object_is_noop() {
    let mut scene = SceneData::default();
    assert_eq!(scene.add_obj_state("nope", 3), 3);
    assert!(scene.content.is_empty());
}

// =============================================================================
// remove_obj_state
// =============================================================================

#[test]
fn remove_last_remaining_state_is_noop() {
    let mut scene = scene_with_states(&["state-0"]);
    let idx = scene.remove_obj_state(OBJ, 0);
    assert_eq!(idx, 0);
    assert_eq!(ids(&scene), vec!["state-0"]);
}

#[test]
fn remove_from_two_states_leaves_one_and_valid_index() {
    let mut scene = scene_with_states(&["state-0", "state-1"]);
    let idx = scene.remove_obj_state(OBJ, 1);
    assert_eq!(ids(&scene), vec!["state-0"]);
    assert!(idx < scene.content[OBJ].states.len());
    assert_eq!(idx, 0);
}

#[test]
fn remove_middle_state_keeps_index() {
    let mut scene = scene_with_states(&["a", "b", "c"]);
    let idx = scene.remove_obj_state(OBJ, 1);
    assert_eq!(idx, 1);
    assert_eq!(ids(&scene), vec!["a", "c"]);
}

#[test]
fn remove_state_clears_transitions_targeting_it() {
    let mut scene = scene_with_states(&["a", "b", "c"]);
    assert!(scene.set_transition(OBJ, "a", Trigger::Click, "b"));
    assert!(scene.set_transition(OBJ, "c", Trigger::Auto, "a"));

    scene.remove_obj_state(OBJ, 1);

    let states = &scene.content[OBJ].states;
    assert!(states[0].trigger.is_none());
    assert!(states[0].transition_to.is_empty());
    assert_eq!(states[1].trigger, Trigger::Auto);
    assert_eq!(states[1].transition_to, "a");
}

// =============================================================================
// transforms / transitions
// =============================================================================

#[test]
fn setters_report_missing_targets() {
    let mut scene = scene_with_states(&["a"]);
    assert!(scene.set_position(OBJ, 0, [5.0, 0.0, 0.0]));
    assert!(!scene.set_position(OBJ, 1, [5.0, 0.0, 0.0]));
    assert!(!scene.set_scale("missing", 0, [2.0; 3]));
    assert!(scene.set_transform(OBJ, 0, Transform::at([9.0, 9.0, 9.0])));
    assert_eq!(scene.content[OBJ].states[0].transform.position, [9.0, 9.0, 9.0]);
}

#[test]
fn set_transition_requires_existing_target() {
    let mut scene = scene_with_states(&["a", "b"]);
    assert!(!scene.set_transition(OBJ, "a", Trigger::Click, "zzz"));
    assert!(scene.set_transition(OBJ, "a", Trigger::HoverStart, "b"));
    let a = &scene.content[OBJ].states[0];
    assert!(a.has_transition());
    assert_eq!(a.trigger, Trigger::HoverStart);
}

#[test]
fn set_transition_with_no_trigger_clears() {
    let mut scene = scene_with_states(&["a", "b"]);
    scene.set_transition(OBJ, "a", Trigger::Click, "b");
    assert!(scene.set_transition(OBJ, "a", Trigger::None, "b"));
    assert!(!scene.content[OBJ].states[0].has_transition());
    assert!(scene.content[OBJ].states[0].transition_to.is_empty());
}

#[test]
fn clear_transition_resets_trigger_and_target() {
    let mut scene = scene_with_states(&["a", "b"]);
    scene.set_transition(OBJ, "b", Trigger::Auto, "a");
    assert!(scene.clear_transition(OBJ, "b"));
    assert!(!scene.content[OBJ].states[1].has_transition());
    assert!(!scene.clear_transition(OBJ, "missing"));
}

#[test]
fn state_label_names_base_and_numbered_states() {
    assert_eq!(state_label(0), "Base State");
    assert_eq!(state_label(1), "State 1");
    assert_eq!(state_label(12), "State 12");
}
