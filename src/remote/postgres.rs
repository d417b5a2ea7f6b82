//! `PostgreSQL` remote store.
//!
//! DESIGN
//! ======
//! Each domain column is written with a single-column `UPDATE`, so writers
//! of different domains never overwrite each other. The change feed rides on
//! `LISTEN project_changes`: the trigger publishes the row id, the writer
//! and the list of domain columns the statement changed, and the feed task
//! re-reads the row to build a full event. The re-read row may already hold
//! later writes; the changed-column list is what scopes the event.
//!
//! ERROR HANDLING
//! ==============
//! Query failures surface as `TransportError::Database`. A feed task that
//! loses its listener logs and ends; the receiver then sees the channel
//! close.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CHANGE_FEED_CAPACITY, ChangeEvent, Column, Patch, RemoteStore, TransportError};
use crate::identity::ClientId;

/// Channel the `projects` trigger notifies on.
pub const CHANGE_CHANNEL: &str = "project_changes";

#[derive(Debug, Deserialize)]
struct NotifyPayload {
    id: String,
    #[serde(rename = "editedBy")]
    edited_by: Option<Uuid>,
    #[serde(default)]
    changed: Vec<Column>,
}

type RowTuple = (String, Option<Value>, Option<Value>, Option<Value>, Option<Value>, Option<Uuid>, Option<i64>);

#[derive(Debug, Clone)]
pub struct PgRemote {
    pool: PgPool,
}

impl PgRemote {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the row with the given initial columns if it is missing.
    /// Returns whether a row was created.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Database` if the insert fails.
    pub async fn ensure_document(&self, document_id: &str, columns: &[(Column, Value)]) -> Result<bool, TransportError> {
        let value_of = |column: Column| {
            columns
                .iter()
                .find(|(c, _)| *c == column)
                .map(|(_, v)| v.clone())
        };
        let result = sqlx::query(
            "INSERT INTO projects (id, scene, editor, camera, room) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(document_id)
        .bind(value_of(Column::Scene))
        .bind(value_of(Column::Editor))
        .bind(value_of(Column::Camera))
        .bind(value_of(Column::Room))
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() > 0;
        if created {
            info!(document_id, "provisioned project row");
        }
        Ok(created)
    }

    async fn read_row(pool: &PgPool, document_id: &str) -> Result<Option<Value>, TransportError> {
        let row = sqlx::query_as::<_, RowTuple>(
            "SELECT id, scene, editor, camera, room, edited_by_client, edited_at FROM projects WHERE id = $1",
        )
        .bind(document_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(row_to_json))
    }
}

fn row_to_json((id, scene, editor, camera, room, edited_by, edited_at): RowTuple) -> Value {
    let mut row = Map::new();
    row.insert("id".into(), json!(id));
    row.insert(Column::Scene.as_str().into(), scene.unwrap_or(Value::Null));
    row.insert(Column::Editor.as_str().into(), editor.unwrap_or(Value::Null));
    row.insert(Column::Camera.as_str().into(), camera.unwrap_or(Value::Null));
    row.insert(Column::Room.as_str().into(), room.unwrap_or(Value::Null));
    row.insert("edited_by_client".into(), json!(edited_by));
    row.insert("edited_at".into(), json!(edited_at));
    Value::Object(row)
}

#[async_trait::async_trait]
impl RemoteStore for PgRemote {
    async fn read(&self, document_id: &str, column: Column) -> Result<Option<Value>, TransportError> {
        // Column names come from the closed `Column` enum, never from input.
        let sql = format!("SELECT {} FROM projects WHERE id = $1", column.as_str());
        let row = sqlx::query_scalar::<_, Option<Value>>(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(value) => Ok(value),
            None => Err(TransportError::NotFound(document_id.to_string())),
        }
    }

    async fn update(&self, document_id: &str, patch: Patch) -> Result<(), TransportError> {
        let sql = format!(
            "UPDATE projects SET {} = $1, edited_by_client = $2, edited_at = $3 WHERE id = $4",
            patch.column.as_str()
        );
        let result = sqlx::query(&sql)
            .bind(&patch.value)
            .bind(patch.edited_by.as_uuid())
            .bind(patch.edited_at)
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(TransportError::NotFound(document_id.to_string()));
        }
        Ok(())
    }

    async fn subscribe(&self, document_id: &str) -> Result<mpsc::Receiver<ChangeEvent>, TransportError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let (tx, rx) = mpsc::channel(CHANGE_FEED_CAPACITY);
        let pool = self.pool.clone();
        let document_id = document_id.to_string();

        tokio::spawn(async move {
            loop {
                let notification = tokio::select! {
                    () = tx.closed() => break,
                    received = listener.recv() => match received {
                        Ok(n) => n,
                        Err(e) => {
                            warn!(error = %e, document_id = %document_id, "change feed listener failed");
                            break;
                        }
                    },
                };

                let payload = match serde_json::from_str::<NotifyPayload>(notification.payload()) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(error = %e, "undecodable change notification");
                        continue;
                    }
                };
                if payload.id != document_id {
                    continue;
                }

                let new = match PgRemote::read_row(&pool, &document_id).await {
                    Ok(Some(row)) => row,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(error = %e, document_id = %document_id, "change feed row read failed");
                        continue;
                    }
                };
                let event = ChangeEvent {
                    new,
                    changed: payload.changed,
                    edited_by: payload.edited_by.map(ClientId::from_uuid),
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            debug!(document_id = %document_id, "change feed ended");
        });

        Ok(rx)
    }
}
