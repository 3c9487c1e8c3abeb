//! Domain types shared by the index, engine, and app crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ItemId = String;
pub type Attributes = BTreeMap<String, String>;

/// One searchable entity (a policy record or a crowdsourced idea).
///
/// - `id`: stable unique identifier, immutable once assigned
/// - `title`/`body`: free-text fields; `body` may be empty
/// - `attributes`: categorical facets (region, target, field, ...) used
///   only for exact-match filtering, never for similarity
/// - `likes`/`dislikes`: engagement counters, mutable over the lifetime
/// - `normalized_text`: derived from title+body, the embedder input
/// - `popularity_score`: likes/(likes+dislikes), 0.5 when no votes yet
/// - `tombstoned`: superseded items keep their index position but are
///   skipped by queries, listings, and statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub attributes: Attributes,
    pub likes: u64,
    pub dislikes: u64,
    pub normalized_text: String,
    pub popularity_score: f32,
    #[serde(default)]
    pub tombstoned: bool,
    pub created_at: DateTime<Utc>,
}

/// likes/(likes+dislikes); 0.5 when nobody has voted yet, so missing
/// data reads as neutral rather than negative.
pub fn popularity_score(likes: u64, dislikes: u64) -> f32 {
    let total = likes + dislikes;
    if total == 0 {
        0.5
    } else {
        likes as f32 / total as f32
    }
}

impl Item {
    pub fn recompute_popularity(&mut self) {
        self.popularity_score = popularity_score(self.likes, self.dislikes);
    }

    /// Body preview truncated to `max_chars` characters on a char
    /// boundary, with a trailing ellipsis when shortened.
    pub fn snippet(&self, max_chars: usize) -> String {
        let count = self.body.chars().count();
        if count <= max_chars {
            return self.body.clone();
        }
        let mut s: String = self.body.chars().take(max_chars).collect();
        s.push_str("...");
        s
    }
}

/// Caller-facing payload for adding one item. A missing id gets a
/// generated one; counters default to zero and body to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub id: Option<ItemId>,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
}

/// One ranked query hit.
///
/// `similarity_score` is raw cosine similarity in [-1,1];
/// `final_score` is the blended ranking score; `rank` is 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: ItemId,
    pub title: String,
    pub body_snippet: String,
    pub attributes: Attributes,
    pub similarity_score: f32,
    pub final_score: f32,
    pub popularity_score: f32,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Like,
    Dislike,
    View,
    Share,
}

/// One recorded user-item interaction, timestamped for trend windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: String,
    pub item_id: ItemId,
    pub kind: InteractionKind,
    pub at: DateTime<Utc>,
}

/// Corpus-level engagement summary over live items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_items: usize,
    pub total_likes: u64,
    pub total_dislikes: u64,
    pub avg_likes: f32,
    pub avg_dislikes: f32,
    pub most_popular: Option<ItemId>,
    pub least_popular: Option<ItemId>,
    pub min_popularity: f32,
    pub max_popularity: f32,
}
