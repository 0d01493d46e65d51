pub mod config;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{Config, StoreKind};
use crate::state::AppState;
use crate::store::{FileStore, KeyValueStore, MemoryStore};

pub fn create_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Opens the configured progress store. An unusable directory degrades to memory.
pub fn open_store(config: &Config) -> Arc<dyn KeyValueStore> {
    match config.store_kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => match FileStore::open(&config.store_dir) {
            Ok(store) => {
                tracing::info!(dir = %config.store_dir.display(), "file store opened");
                Arc::new(store)
            }
            Err(err) => {
                tracing::warn!(
                    dir = %config.store_dir.display(),
                    error = %err,
                    "file store unavailable, progress will not survive restarts"
                );
                Arc::new(MemoryStore::new())
            }
        },
    }
}
