use std::sync::Arc;

use scenesync::config::SyncConfig;
use scenesync::identity::ClientId;
use scenesync::model::{CameraData, EditorData, SceneData};
use scenesync::remote::{Column, PgRemote};
use scenesync::store::Subscription;
use scenesync::sync::{Stores, SyncContext, SyncEngine};
use tracing::info;

/// Log a one-line summary each time a mirrored domain changes.
fn log_mirrored_state(stores: &Stores) -> Vec<Subscription> {
    vec![
        stores.scene.subscribe(|scene| {
            info!(objects = scene.content.len(), light = ?scene.light_position, "scene mirrored");
        }),
        stores.editor.subscribe(|editor| {
            info!(mode = ?editor.mode, selected = ?editor.selected_obj_id, "editor mirrored");
        }),
        stores.camera.subscribe(|camera| {
            let view = &camera.data;
            info!(distance = view.distance, yaw = view.yaw, pitch = view.pitch, "camera mirrored");
        }),
        stores.room.subscribe(|room| info!(planes = room.planes.len(), "room mirrored")),
    ]
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("no .env loaded: {e}");
    }
    tracing_subscriber::fmt::init();

    let config = SyncConfig::from_env().expect("invalid sync configuration");
    let database_url = config.database_url.clone().expect("DATABASE_URL required");

    let pool = scenesync::db::init_pool(&database_url)
        .await
        .expect("database init failed");
    let remote = PgRemote::new(pool);

    if config.provision_project {
        let defaults = vec![
            (Column::Scene, serde_json::to_value(SceneData::default()).expect("encode scene defaults")),
            (Column::Editor, serde_json::to_value(EditorData::default()).expect("encode editor defaults")),
            (Column::Camera, serde_json::to_value(CameraData::default()).expect("encode camera defaults")),
        ];
        remote
            .ensure_document(&config.project_id, &defaults)
            .await
            .expect("project provisioning failed");
    }

    let ctx = SyncContext {
        remote: Arc::new(remote),
        document_id: config.project_id.clone(),
        client_id: ClientId::generate(),
        epsilon: config.epsilon,
    };
    let stores = Stores::new();
    let _mirror_logs = log_mirrored_state(&stores);
    let engine = SyncEngine::mount(ctx, &stores, config.timings);

    info!(project_id = %config.project_id, "scenesync agent running");
    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");

    info!("shutting down");
    engine.shutdown().await;
}
