//! Query-surface request and response types shared by the CLI and the
//! HTTP app.

use ideadb_core::types::{Attributes, Item, ItemId, SearchResult};
use serde::{Deserialize, Serialize};

use crate::scoring::ScoreWeights;

fn default_top_k() -> usize {
    5
}

fn default_threshold() -> f32 {
    0.3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
    #[serde(default)]
    pub filters: Attributes,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Budget for the embed + index stages; falls back to the engine
    /// option when absent.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: default_top_k(),
            similarity_threshold: default_threshold(),
            filters: Attributes::new(),
            weights: ScoreWeights::default(),
            user_id: None,
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Candidates that survived threshold and filters, before top-k
    /// truncation.
    pub total_found: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Recent,
    Popular,
    Likes,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self { page: default_page(), page_size: default_page_size(), sort_by: SortBy::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub items: Vec<Item>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingItem {
    pub id: ItemId,
    pub title: String,
    pub recent_interactions: usize,
    pub popularity_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: ItemId,
    pub title: String,
    pub body_snippet: String,
    pub attributes: Attributes,
    pub popularity_score: f32,
}
