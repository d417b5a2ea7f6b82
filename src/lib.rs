//! scenesync: state sync for a collaborative 3D scene editor.
//!
//! Four domains (scene, editor, camera, room) live in observable stores and
//! are kept in step with one remote project row: local edits are debounced
//! and pushed, remote edits are validated and applied without echoing back.

pub mod actions;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod model;
pub mod remote;
pub mod store;
pub mod sync;

pub use config::SyncConfig;
pub use identity::ClientId;
pub use store::{Store, Subscription};
pub use sync::{Stores, SyncContext, SyncEngine};
