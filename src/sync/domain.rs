//! Per-domain projection, validation and application.
//!
//! DESIGN
//! ======
//! `SyncDomain` is the seam between the generic coordinator and the four
//! concrete domains. A domain names its store state, its persisted shape,
//! the remote column it lives in, and three pure functions:
//!
//! - `project` narrows store state to the persisted shape (transient UI
//!   fields never leave the process),
//! - `validate` rejects payloads serde accepts but the model forbids,
//! - `apply` writes a persisted value back into store state.
//!
//! `encode` and `decode` are the only way values cross the wire, so the
//! outbound payload and the change detector's baseline always come from the
//! same canonical encoding.
//!
//! ERROR HANDLING
//! ==============
//! Inbound payloads that fail `decode` are rejected whole; the store is
//! never partially updated. Outbound values that would not decode back
//! (non-finite floats encode as `null`) are an `EncodeError` and nothing is
//! sent.

#[cfg(test)]
#[path = "domain_test.rs"]
mod domain_test;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorCode;
use crate::model::{CameraData, CameraState, EditorData, EditorState, RoomData, RoomState, SceneData};
use crate::remote::Column;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("no {0} payload in row")]
    Missing(&'static str),
    #[error("malformed {domain} payload: {source}")]
    Shape {
        domain: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("object {0} has no states")]
    EmptyStates(String),
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "E_VALIDATION_MISSING",
            Self::Shape { .. } => "E_VALIDATION_SHAPE",
            Self::EmptyStates(_) => "E_VALIDATION_EMPTY_STATES",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to encode {domain}: {source}")]
    Serialize {
        domain: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{domain} value does not survive encoding: {source}")]
    NotRepresentable {
        domain: &'static str,
        #[source]
        source: ValidationError,
    },
}

impl ErrorCode for EncodeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Serialize { .. } => "E_ENCODE_SERIALIZE",
            Self::NotRepresentable { .. } => "E_ENCODE_NOT_REPRESENTABLE",
        }
    }
}

// =============================================================================
// DOMAIN TRAIT
// =============================================================================

pub trait SyncDomain: Send + Sync + 'static {
    /// What the store holds.
    type State: Clone + Send + 'static;
    /// What the remote column holds.
    type Persisted: Serialize + DeserializeOwned + Send + 'static;

    const NAME: &'static str;
    const COLUMN: Column;

    fn project(state: &Self::State) -> Self::Persisted;

    fn validate(_persisted: &Self::Persisted) -> Result<(), ValidationError> {
        Ok(())
    }

    fn apply(state: &mut Self::State, persisted: Self::Persisted);
}

/// Decode and validate an inbound column value.
///
/// # Errors
///
/// Returns `ValidationError` when the value is missing fields, has wrong
/// types or literals, or breaks a model invariant.
pub fn decode<D: SyncDomain>(value: &Value) -> Result<D::Persisted, ValidationError> {
    if value.is_null() {
        return Err(ValidationError::Missing(D::NAME));
    }
    let persisted = <D::Persisted as Deserialize>::deserialize(value)
        .map_err(|source| ValidationError::Shape { domain: D::NAME, source })?;
    D::validate(&persisted)?;
    Ok(persisted)
}

/// Canonical encoding of a persisted value.
///
/// # Errors
///
/// Returns `EncodeError` when the value cannot be serialized or would not
/// decode back.
pub fn try_encode<D: SyncDomain>(persisted: &D::Persisted) -> Result<Value, EncodeError> {
    let value = serde_json::to_value(persisted)
        .map_err(|source| EncodeError::Serialize { domain: D::NAME, source })?;
    decode::<D>(&value).map_err(|source| EncodeError::NotRepresentable { domain: D::NAME, source })?;
    Ok(value)
}

/// Project store state and encode it. `None` means "nothing to send"; the
/// failure has already been logged.
pub fn encode_state<D: SyncDomain>(state: &D::State) -> Option<Value> {
    match try_encode::<D>(&D::project(state)) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(domain = D::NAME, code = e.error_code(), error = %e, "projection not encodable");
            None
        }
    }
}

// =============================================================================
// DOMAINS
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SceneDomain;

impl SyncDomain for SceneDomain {
    type State = SceneData;
    type Persisted = SceneData;

    const NAME: &'static str = "scene";
    const COLUMN: Column = Column::Scene;

    fn project(state: &SceneData) -> SceneData {
        state.clone()
    }

    fn validate(persisted: &SceneData) -> Result<(), ValidationError> {
        match persisted.content.iter().find(|(_, obj)| obj.states.is_empty()) {
            Some((id, _)) => Err(ValidationError::EmptyStates(id.clone())),
            None => Ok(()),
        }
    }

    fn apply(state: &mut SceneData, persisted: SceneData) {
        *state = persisted;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EditorDomain;

impl SyncDomain for EditorDomain {
    type State = EditorState;
    type Persisted = EditorData;

    const NAME: &'static str = "editor";
    const COLUMN: Column = Column::Editor;

    fn project(state: &EditorState) -> EditorData {
        state.data()
    }

    fn apply(state: &mut EditorState, persisted: EditorData) {
        state.apply_data(persisted);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CameraDomain;

impl SyncDomain for CameraDomain {
    type State = CameraState;
    type Persisted = CameraData;

    const NAME: &'static str = "camera";
    const COLUMN: Column = Column::Camera;

    fn project(state: &CameraState) -> CameraData {
        state.data
    }

    fn apply(state: &mut CameraState, persisted: CameraData) {
        state.data = persisted;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoomDomain;

impl SyncDomain for RoomDomain {
    type State = RoomState;
    type Persisted = RoomData;

    const NAME: &'static str = "room";
    const COLUMN: Column = Column::Room;

    fn project(state: &RoomState) -> RoomData {
        state.planes.clone()
    }

    fn apply(state: &mut RoomState, persisted: RoomData) {
        state.set_planes(persisted);
    }
}
