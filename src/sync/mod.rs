//! State sync engine.
//!
//! DESIGN
//! ======
//! `SyncEngine::mount` wires four independent domains to one remote
//! document: scene, editor and camera each get a live coordinator task
//! (listen, debounce, push; feed, validate, apply), and room gets a
//! push-on-demand `RoomSync` that hydrates once at mount. Domains share
//! nothing but the remote handle and client identity; each has its own
//! store, baseline, debouncer and loop-prevention guard.
//!
//! Cross-domain writes are independent. A scene write and an editor write
//! issued together may land in either order, so a reader can briefly see a
//! selection that points at an object not yet in the content map. Readers
//! of `selectedObjId` already treat it as a lookup key that may dangle.

pub mod coordinator;
pub mod debounce;
pub mod detect;
pub mod domain;
pub mod guard;
pub mod room;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SyncTimings;
use crate::error::ErrorCode;
use crate::model::{CameraState, EditorState, RoomState, SceneData};
use crate::remote::TransportError;
use crate::store::Store;

pub use coordinator::{SyncContext, SyncHandle, SyncPhase, spawn_coordinator};
pub use domain::{CameraDomain, EditorDomain, RoomDomain, SceneDomain, SyncDomain};
pub use room::RoomSync;

/// The four domain stores, created with their default snapshots.
#[derive(Debug, Clone)]
pub struct Stores {
    pub scene: Store<SceneData>,
    pub editor: Store<EditorState>,
    pub camera: Store<CameraState>,
    pub room: Store<RoomState>,
}

impl Stores {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scene: Store::new(SceneDomain::NAME, SceneData::default()),
            editor: Store::new(EditorDomain::NAME, EditorState::default()),
            camera: Store::new(CameraDomain::NAME, CameraState::default()),
            room: Store::new(RoomDomain::NAME, RoomState::default()),
        }
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::new()
    }
}

/// Running sync for one document.
#[derive(Debug)]
pub struct SyncEngine {
    scene: SyncHandle,
    editor: SyncHandle,
    camera: SyncHandle,
    room: RoomSync,
    room_hydration: JoinHandle<()>,
}

impl SyncEngine {
    /// Start every domain. Must be called inside a tokio runtime.
    #[must_use]
    pub fn mount(ctx: SyncContext, stores: &Stores, timings: SyncTimings) -> Self {
        info!(document_id = %ctx.document_id, client_id = %ctx.client_id, "mounting sync engine");

        let scene = spawn_coordinator::<SceneDomain>(ctx.clone(), stores.scene.clone(), timings.scene);
        let editor = spawn_coordinator::<EditorDomain>(ctx.clone(), stores.editor.clone(), timings.editor);
        let camera = spawn_coordinator::<CameraDomain>(ctx.clone(), stores.camera.clone(), timings.camera);

        let room = RoomSync::new(ctx, stores.room.clone());
        let hydrating = room.clone();
        let room_hydration = tokio::spawn(async move {
            if let Err(e) = hydrating.hydrate().await {
                warn!(domain = RoomDomain::NAME, code = e.error_code(), error = %e, "room hydration failed");
            }
        });

        Self { scene, editor, camera, room, room_hydration }
    }

    #[must_use]
    pub fn scene(&self) -> &SyncHandle {
        &self.scene
    }

    #[must_use]
    pub fn editor(&self) -> &SyncHandle {
        &self.editor
    }

    #[must_use]
    pub fn camera(&self) -> &SyncHandle {
        &self.camera
    }

    #[must_use]
    pub fn room(&self) -> &RoomSync {
        &self.room
    }

    /// Wait until every live domain has hydrated (or given up on it).
    pub async fn wait_live(&self) -> bool {
        let (scene, editor, camera) =
            tokio::join!(self.scene.wait_live(), self.editor.wait_live(), self.camera.wait_live());
        scene && editor && camera
    }

    /// Push the current room scan.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the write fails.
    pub async fn push_room(&self) -> Result<(), TransportError> {
        self.room.push().await
    }

    /// Stop all domains. Pending debounced changes are dropped; writes
    /// already in flight are allowed to finish.
    pub async fn shutdown(self) {
        self.room_hydration.abort();
        tokio::join!(self.scene.shutdown(), self.editor.shutdown(), self.camera.shutdown());
        info!("sync engine stopped");
    }
}
