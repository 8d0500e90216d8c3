//! Shared state handed to every handler.

use pf_core::config::models::AppConfig;
use pf_core::ingest::IngestionPipeline;
use pf_core::store::PhotoStore;
use pf_protocol::config_models::NormalizeConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: PhotoStore,
    pub pipeline: IngestionPipeline,
    /// Per-file upload ceiling in bytes.
    pub max_file_bytes: u64,
}

impl AppState {
    pub fn new(store: PhotoStore, normalize: NormalizeConfig, max_file_bytes: u64) -> Self {
        Self {
            pipeline: IngestionPipeline::new(store.clone(), normalize),
            store,
            max_file_bytes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            PhotoStore::new(&config.store_dir),
            config.normalize,
            config.max_file_bytes,
        )
    }
}
