use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ideadb_core::config::{expand_path, Config};
use ideadb_core::types::{InteractionKind, ItemId, SearchResult};
use ideadb_embed::provider_from_config;
use ideadb_engine::{EngineOptions, IdeaEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<IdeaEngine>,
    pub snapshot_path: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let embedder = provider_from_config(config)?;
        tracing::info!(provider = %embedder.id(), "embedding provider ready");
        let engine = IdeaEngine::new(embedder, EngineOptions::from_config(config));

        let snapshot_path =
            expand_path(config.get_or("data.snapshot_path", "data/ideas.json".to_string()));
        if snapshot_path.exists() {
            let loaded = engine.load_snapshot(&snapshot_path)?;
            tracing::info!(items = loaded, path = %snapshot_path.display(), "snapshot loaded");
        } else {
            tracing::warn!(path = %snapshot_path.display(), "no snapshot found; starting empty");
        }

        Ok(Self { engine: Arc::new(engine), snapshot_path })
    }
}

#[derive(Debug, Serialize)]
pub struct AddIdeaResponse {
    pub id: ItemId,
    /// Existing items close enough to be possible duplicates; may include
    /// the item itself.
    pub similar: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct InteractRequest {
    pub user_id: String,
    pub item_id: String,
    pub kind: InteractionKind,
}

fn default_window_days() -> u32 {
    7
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SnapshotReport {
    pub items: usize,
    pub path: String,
}
