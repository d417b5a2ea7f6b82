//! In-process remote store.
//!
//! Behaves like the production row store: per-document rows with one JSON
//! column per domain, last-writer stamps, and a change feed that includes the
//! writer's own echoes. Test hooks can fail reads/updates, delay reads, and
//! inject writes from other clients.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use super::{CHANGE_FEED_CAPACITY, ChangeEvent, Column, Patch, RemoteStore, TransportError};
use crate::identity::ClientId;

#[derive(Default)]
struct MemoryInner {
    documents: HashMap<String, Map<String, Value>>,
    subscribers: HashMap<String, Vec<mpsc::Sender<ChangeEvent>>>,
    writes: Vec<Patch>,
    fail_next_updates: usize,
    fail_next_reads: usize,
    read_delay: Option<Duration>,
}

/// Shared in-memory store. Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Mutex<MemoryInner>>,
}

impl std::fmt::Debug for MemoryRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryRemote")
            .field("documents", &inner.documents.len())
            .field("writes", &inner.writes.len())
            .finish_non_exhaustive()
    }
}

fn empty_row(document_id: &str) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("id".into(), json!(document_id));
    for column in Column::ALL {
        row.insert(column.as_str().into(), Value::Null);
    }
    row.insert("edited_by_client".into(), Value::Null);
    row.insert("edited_at".into(), Value::Null);
    row
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row (all columns null) if it does not exist.
    pub fn provision(&self, document_id: &str) {
        self.lock()
            .documents
            .entry(document_id.to_string())
            .or_insert_with(|| empty_row(document_id));
    }

    /// Set a column directly, without logging a write or notifying.
    pub fn seed(&self, document_id: &str, column: Column, value: Value) {
        let mut inner = self.lock();
        let row = inner
            .documents
            .entry(document_id.to_string())
            .or_insert_with(|| empty_row(document_id));
        row.insert(column.as_str().into(), value);
    }

    /// Current row as a JSON object.
    #[must_use]
    pub fn row(&self, document_id: &str) -> Option<Value> {
        self.lock()
            .documents
            .get(document_id)
            .map(|row| Value::Object(row.clone()))
    }

    /// Every successful write issued through `update`, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<Patch> {
        self.lock().writes.clone()
    }

    #[must_use]
    pub fn writes_for(&self, column: Column) -> Vec<Patch> {
        self.lock()
            .writes
            .iter()
            .filter(|p| p.column == column)
            .cloned()
            .collect()
    }

    /// Make the next `n` updates fail with `TransportError::Rejected`.
    pub fn fail_next_updates(&self, n: usize) {
        self.lock().fail_next_updates = n;
    }

    /// Make the next `n` reads fail with `TransportError::Rejected`.
    pub fn fail_next_reads(&self, n: usize) {
        self.lock().fail_next_reads = n;
    }

    /// Delay every read by `delay`. The value returned is the one present
    /// when the read was issued.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        self.lock().read_delay = delay;
    }

    #[must_use]
    pub fn subscriber_count(&self, document_id: &str) -> usize {
        self.lock()
            .subscribers
            .get(document_id)
            .map_or(0, |subs| subs.iter().filter(|tx| !tx.is_closed()).count())
    }

    /// Apply a write from another client: updates the row and notifies, but
    /// is not recorded in `writes`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::NotFound` if the document does not exist.
    pub fn inject(&self, document_id: &str, patch: Patch) -> Result<(), TransportError> {
        let mut inner = self.lock();
        Self::write_row(&mut inner, document_id, &patch)
    }

    fn write_row(inner: &mut MemoryInner, document_id: &str, patch: &Patch) -> Result<(), TransportError> {
        let Some(row) = inner.documents.get_mut(document_id) else {
            return Err(TransportError::NotFound(document_id.to_string()));
        };
        let previous = row.insert(patch.column.as_str().into(), patch.value.clone());
        let changed = if previous.as_ref() == Some(&patch.value) { Vec::new() } else { vec![patch.column] };
        row.insert("edited_by_client".into(), json!(patch.edited_by));
        row.insert("edited_at".into(), json!(patch.edited_at));
        let event = ChangeEvent { new: Value::Object(row.clone()), changed, edited_by: Some(patch.edited_by) };
        Self::broadcast(inner, document_id, &event);
        Ok(())
    }

    fn broadcast(inner: &mut MemoryInner, document_id: &str, event: &ChangeEvent) {
        let Some(subs) = inner.subscribers.get_mut(document_id) else {
            return;
        };
        subs.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(document_id, "change feed full; dropping event");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryRemote {
    async fn read(&self, document_id: &str, column: Column) -> Result<Option<Value>, TransportError> {
        let (result, delay) = {
            let mut inner = self.lock();
            let result = if inner.fail_next_reads > 0 {
                inner.fail_next_reads -= 1;
                Err(TransportError::Rejected("injected read failure".into()))
            } else {
                match inner.documents.get(document_id) {
                    Some(row) => Ok(row.get(column.as_str()).filter(|v| !v.is_null()).cloned()),
                    None => Err(TransportError::NotFound(document_id.to_string())),
                }
            };
            (result, inner.read_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn update(&self, document_id: &str, patch: Patch) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if inner.fail_next_updates > 0 {
            inner.fail_next_updates -= 1;
            return Err(TransportError::Rejected("injected update failure".into()));
        }
        Self::write_row(&mut inner, document_id, &patch)?;
        trace!(document_id, column = %patch.column, "memory remote write");
        inner.writes.push(patch);
        Ok(())
    }

    async fn subscribe(&self, document_id: &str) -> Result<mpsc::Receiver<ChangeEvent>, TransportError> {
        let (tx, rx) = mpsc::channel(CHANGE_FEED_CAPACITY);
        self.lock()
            .subscribers
            .entry(document_id.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}

impl MemoryRemote {
    /// Patch stamped as written by `client` now.
    #[must_use]
    pub fn patch_from(client: ClientId, column: Column, value: Value) -> Patch {
        Patch { column, value, edited_by: client, edited_at: crate::identity::now_ms() }
    }
}
