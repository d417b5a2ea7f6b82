//! Room-scan sync: hydrate once, push on demand.
//!
//! Room geometry is captured in discrete bursts by the environment scanner,
//! so there is no listener or debounce loop. The scanner calls `push` after
//! each capture.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::coordinator::SyncContext;
use super::domain::{RoomDomain, SyncDomain, decode, encode_state};
use super::guard::RemoteApplyGuard;
use crate::error::ErrorCode;
use crate::identity::now_ms;
use crate::model::RoomState;
use crate::remote::{Patch, TransportError};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct RoomSync {
    ctx: SyncContext,
    store: Store<RoomState>,
    guard: RemoteApplyGuard,
}

impl RoomSync {
    #[must_use]
    pub fn new(ctx: SyncContext, store: Store<RoomState>) -> Self {
        Self { ctx, store, guard: RemoteApplyGuard::new() }
    }

    /// True while a stored room is being applied to the store.
    #[must_use]
    pub fn is_applying(&self) -> bool {
        self.guard.is_applying()
    }

    /// Load the stored room into the store. Returns whether anything was
    /// applied; a missing or malformed value leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the read fails.
    pub async fn hydrate(&self) -> Result<bool, TransportError> {
        let Some(raw) = self.ctx.remote.read(&self.ctx.document_id, RoomDomain::COLUMN).await? else {
            debug!(domain = RoomDomain::NAME, "no stored room");
            return Ok(false);
        };
        Ok(self.apply_value(&raw).await)
    }

    async fn apply_value(&self, raw: &Value) -> bool {
        let planes = match decode::<RoomDomain>(raw) {
            Ok(planes) => planes,
            Err(e) => {
                warn!(domain = RoomDomain::NAME, code = e.error_code(), error = %e, "rejected stored room");
                return false;
            }
        };
        let count = planes.len();
        let store = self.store.clone();
        self.guard
            .apply(move || store.update(|state| RoomDomain::apply(state, planes)))
            .await;
        info!(domain = RoomDomain::NAME, planes = count, "room hydrated");
        true
    }

    /// Write the current room to the remote. An unencodable room is logged
    /// and nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the write fails.
    pub async fn push(&self) -> Result<(), TransportError> {
        let Some(value) = self.store.read(encode_state::<RoomDomain>) else {
            return Ok(());
        };
        let patch = Patch { column: RoomDomain::COLUMN, value, edited_by: self.ctx.client_id, edited_at: now_ms() };
        let planes = self.store.read(|state| state.planes.len());
        match self.ctx.remote.update(&self.ctx.document_id, patch).await {
            Ok(()) => {
                debug!(domain = RoomDomain::NAME, planes, "room pushed");
                Ok(())
            }
            Err(e) => {
                warn!(domain = RoomDomain::NAME, code = e.error_code(), error = %e, "room push failed");
                Err(e)
            }
        }
    }
}
