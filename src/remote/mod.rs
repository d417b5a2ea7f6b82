//! Remote document store abstraction.
//!
//! DESIGN
//! ======
//! One document row per project holds four JSON columns, one per domain,
//! plus the identity and timestamp of the last writer. Coordinators talk to
//! the row only through `RemoteStore`: point reads of one column, partial
//! updates of one column, and a change feed of whole rows. Each event names
//! the columns the write actually changed, so a domain can ignore writes to
//! its siblings. The feed includes this client's own writes; filtering
//! echoes is the coordinator's job.
//!
//! `memory` is an in-process implementation used by tests and embedders;
//! `postgres` is the production one.

pub mod memory;
pub mod postgres;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::ErrorCode;
use crate::identity::ClientId;

pub use memory::MemoryRemote;
pub use postgres::PgRemote;

/// Capacity of each change-feed channel.
pub const CHANGE_FEED_CAPACITY: usize = 256;

// =============================================================================
// TYPES
// =============================================================================

/// Domain column of the document row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Scene,
    Editor,
    Camera,
    Room,
}

impl Column {
    pub const ALL: [Column; 4] = [Self::Scene, Self::Editor, Self::Camera, Self::Room];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::Editor => "editor",
            Self::Camera => "camera",
            Self::Room => "room",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial update of one column, stamped with the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub column: Column,
    pub value: Value,
    pub edited_by: ClientId,
    pub edited_at: i64,
}

/// One row-level change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Row after the change, as a JSON object keyed by column name.
    pub new: Value,
    /// Columns whose value this write changed.
    pub changed: Vec<Column>,
    pub edited_by: Option<ClientId>,
}

impl ChangeEvent {
    /// Value of `column` in the new row, if present.
    #[must_use]
    pub fn column(&self, column: Column) -> Option<&Value> {
        self.new.get(column.as_str())
    }

    #[must_use]
    pub fn touches(&self, column: Column) -> bool {
        self.changed.contains(&column)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("change feed closed")]
    Closed,
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("undecodable row: {0}")]
    Decode(String),
}

impl ErrorCode for TransportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_TRANSPORT_NOT_FOUND",
            Self::Database(_) => "E_TRANSPORT_DATABASE",
            Self::Closed => "E_TRANSPORT_CLOSED",
            Self::Rejected(_) => "E_TRANSPORT_REJECTED",
            Self::Decode(_) => "E_TRANSPORT_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Closed | Self::Rejected(_))
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Current value of one column. `Ok(None)` when the column is null.
    async fn read(&self, document_id: &str, column: Column) -> Result<Option<Value>, TransportError>;

    /// Write one column plus the writer stamp.
    async fn update(&self, document_id: &str, patch: Patch) -> Result<(), TransportError>;

    /// Open a change feed for the document. Dropping the receiver ends it.
    async fn subscribe(&self, document_id: &str) -> Result<mpsc::Receiver<ChangeEvent>, TransportError>;
}
