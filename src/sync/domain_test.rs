use super::*;
use crate::model::{ObjKind, Orientation, RoomPlane};
use serde_json::json;

fn scene_value() -> Value {
    json!({
        "lightPosition": [0.3, 0.3, 0.3],
        "content": {
            "obj1": {
                "type": "sphere",
                "name": "Ball",
                "states": [{
                    "id": "s0",
                    "transform": {"position": [0, 0, 0], "rotation": [0, 0, 0], "scale": [1, 1, 1]},
                    "trigger": "",
                    "transitionTo": ""
                }]
            }
        }
    })
}

#[test]
fn scene_decodes_valid_payload() {
    let scene = decode::<SceneDomain>(&scene_value()).unwrap();
    assert_eq!(scene.content["obj1"].kind, ObjKind::Sphere);
}

#[test]
fn scene_rejects_object_without_states() {
    let mut value = scene_value();
    value["content"]["obj1"]["states"] = json!([]);
    let err = decode::<SceneDomain>(&value).unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION_EMPTY_STATES");
}

#[test]
fn scene_rejects_partial_payload() {
    let err = decode::<SceneDomain>(&json!({"content": {}})).unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION_SHAPE");
}

#[test]
fn scene_rejects_unknown_trigger_literal() {
    let mut value = scene_value();
    value["content"]["obj1"]["states"][0]["trigger"] = json!("doubleClick");
    assert!(decode::<SceneDomain>(&value).is_err());
}

#[test]
fn null_column_is_missing() {
    let err = decode::<CameraDomain>(&Value::Null).unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION_MISSING");
}

#[test]
fn editor_accepts_dangling_selection() {
    let value = json!({"mode": "edit", "selectedObjId": "gone", "objStateIdxMap": {}, "isHybrid": false});
    let data = decode::<EditorDomain>(&value).unwrap();
    assert_eq!(data.selected_obj_id.as_deref(), Some("gone"));
}

#[test]
fn editor_projection_drops_transient_fields() {
    let mut state = EditorState::default();
    state.set_authoring_animation(true);
    let value = encode_state::<EditorDomain>(&state).unwrap();
    assert!(value.get("isAuthoringAnimation").is_none());
    assert_eq!(value["mode"], json!("edit"));
}

#[test]
fn camera_projection_drops_drag_flag() {
    let state = CameraState { is_dragging: true, ..CameraState::default() };
    let value = encode_state::<CameraDomain>(&state).unwrap();
    assert_eq!(value, json!({"distance": 1.0, "yaw": 0.0, "pitch": 0.0, "origin": [0.0, 0.0, 0.0]}));
}

#[test]
fn non_finite_float_is_not_encodable() {
    let mut state = CameraState::default();
    state.data.yaw = f64::NAN;
    let err = try_encode::<CameraDomain>(&state.data).unwrap_err();
    assert_eq!(err.error_code(), "E_ENCODE_NOT_REPRESENTABLE");
    assert!(encode_state::<CameraDomain>(&state).is_none());
}

#[test]
fn apply_editor_preserves_connect_session() {
    let mut state = EditorState::default();
    state.start_connecting("obj1", "s0");
    let data = EditorData { is_hybrid: true, ..EditorData::default() };
    EditorDomain::apply(&mut state, data);
    assert!(state.is_hybrid);
    assert!(state.is_connecting());
}

#[test]
fn room_round_trips_through_canonical_encoding() {
    let state = RoomState {
        planes: vec![RoomPlane {
            id: "floor".into(),
            semantic_label: Some("floor".into()),
            orientation: Orientation::Horizontal,
            pose_matrix: [0.0; 16],
            polygon: Vec::new(),
        }],
    };
    let value = encode_state::<RoomDomain>(&state).unwrap();
    let planes = decode::<RoomDomain>(&value).unwrap();
    let mut applied = RoomState::default();
    RoomDomain::apply(&mut applied, planes);
    assert_eq!(applied, state);
}

#[test]
fn domain_columns_are_distinct() {
    let cols = [SceneDomain::COLUMN, EditorDomain::COLUMN, CameraDomain::COLUMN, RoomDomain::COLUMN];
    let names: std::collections::BTreeSet<_> = cols.iter().map(|c| c.as_str()).collect();
    assert_eq!(names.len(), 4);
}
