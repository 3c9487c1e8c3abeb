//! The engine object: owns the aligned store/index pair, the embedder,
//! the interaction log, and the result cache behind a single handle.
//!
//! Writers serialize on one lock so the (index row, store row) append
//! pair is a critical section. Readers share a snapshot-consistent view.
//! Embedding always runs outside the lock; it is the dominant latency.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use ideadb_core::config::Config;
use ideadb_core::error::{Error, Result};
use ideadb_core::normalize::normalize;
use ideadb_core::traits::{Embedder, VectorIndex};
use ideadb_core::types::{
    popularity_score, Attributes, Interaction, InteractionKind, Item, ItemId, ItemInput,
    SearchResult, Statistics,
};
use ideadb_index::{FlatIndex, ItemStore, Snapshot, SCHEMA_VERSION};

use crate::cache::ResultCache;
use crate::request::{
    ListRequest, ListResponse, Recommendation, SearchRequest, SearchResponse, SortBy, TrendingItem,
};
use crate::scoring::{blend, personalization_score};

pub const DEFAULT_OVERSAMPLE: usize = 3;
const INGEST_BATCH: usize = 32;
const INGEST_RETRIES: usize = 3;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Candidate multiplier for the index query; absorbs losses from the
    /// threshold and the categorical filters.
    pub oversample: usize,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    /// Default embed/search budget; a request's `timeout_ms` overrides.
    pub embed_timeout: Option<Duration>,
    pub snippet_chars: usize,
    /// Attribute consulted when inferring a user's preferred facet.
    pub preference_attribute: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            oversample: DEFAULT_OVERSAMPLE,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1024,
            embed_timeout: None,
            snippet_chars: 150,
            preference_attribute: "category".to_string(),
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        let timeout_ms: u64 = config.get_or("engine.embed_timeout_ms", 0);
        Self {
            oversample: config.get_or("search.oversample", defaults.oversample).max(1),
            cache_ttl: Duration::from_secs(config.get_or("cache.ttl_secs", 300)),
            cache_capacity: config.get_or("cache.capacity", defaults.cache_capacity),
            embed_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            snippet_chars: config.get_or("search.snippet_chars", defaults.snippet_chars),
            preference_attribute: config
                .get_or("search.preference_attribute", defaults.preference_attribute),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct IngestReport {
    pub ingested: usize,
    pub skipped: usize,
}

struct EngineState {
    store: ItemStore,
    index: Box<dyn VectorIndex>,
    interactions: Vec<Interaction>,
}

pub struct IdeaEngine {
    embedder: Arc<dyn Embedder>,
    state: RwLock<EngineState>,
    cache: Mutex<ResultCache>,
    options: EngineOptions,
}

impl IdeaEngine {
    pub fn new(embedder: Arc<dyn Embedder>, options: EngineOptions) -> Self {
        let index: Box<dyn VectorIndex> = Box::new(FlatIndex::new(embedder.dim()));
        Self {
            state: RwLock::new(EngineState {
                store: ItemStore::new(),
                index,
                interactions: Vec::new(),
            }),
            cache: Mutex::new(ResultCache::new(options.cache_ttl, options.cache_capacity)),
            embedder,
            options,
        }
    }

    pub fn with_defaults(embedder: Arc<dyn Embedder>) -> Self {
        Self::new(embedder, EngineOptions::default())
    }

    pub fn embedder_id(&self) -> String {
        self.embedder.id()
    }

    pub fn item_count(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn live_item_count(&self) -> usize {
        self.state.read().store.iter_live().count()
    }

    pub fn interaction_count(&self) -> usize {
        self.state.read().interactions.len()
    }

    /// Ranked search: normalize, embed, oversampled index query,
    /// threshold + exact-match filters, blend, sort, truncate.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let query = normalize(&request.query);
        if query.is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }
        if request.top_k == 0 {
            return Err(Error::InvalidInput("top_k must be positive".to_string()));
        }
        if !(-1.0..=1.0).contains(&request.similarity_threshold) {
            warn!(
                threshold = request.similarity_threshold,
                "similarity threshold outside [-1, 1]; filter may pass or drop everything"
            );
        }

        let key = cache_key(&query, request);
        if let Some((results, total_found)) = self.cache.lock().get(&key) {
            return Ok(SearchResponse { results, total_found });
        }

        let timeout = request.timeout_ms.map(Duration::from_millis).or(self.options.embed_timeout);
        let started = Instant::now();
        let query_vec = self.embed_bounded(&query, timeout)?;
        if let Some(limit) = timeout {
            // embedding consumed the whole budget; do not start the scan
            if started.elapsed() >= limit {
                return Err(Error::UpstreamTimeout(limit.as_millis() as u64));
            }
        }

        let (results, total_found) = {
            let state = self.state.read();
            self.rank_candidates(&state, &query_vec, request)?
        };

        self.cache.lock().put(key, results.clone(), total_found);
        Ok(SearchResponse { results, total_found })
    }

    /// Adds one item: the index row and the store row land at the same
    /// position inside one critical section, then the new item's own
    /// text is searched as a courtesy pass for near-duplicates. The new
    /// item may legitimately appear in those results.
    pub fn add_item(&self, input: ItemInput) -> Result<(ItemId, Vec<SearchResult>)> {
        let (item, vector) = self.prepare_item(input)?;
        let id = item.id.clone();
        let normalized = item.normalized_text.clone();
        self.append_pair(item, &vector)?;
        self.cache.lock().flush();

        let neighbors = {
            let request = SearchRequest::new(normalized);
            let state = self.state.read();
            let (results, _) = self.rank_candidates(&state, &vector, &request)?;
            results
        };
        Ok((id, neighbors))
    }

    /// Replaces an item's text by inserting the revision as a new item
    /// and tombstoning the old row. The old vector keeps its position;
    /// nothing ever shifts.
    pub fn revise_item(&self, old_id: &str, input: ItemInput) -> Result<(ItemId, Vec<SearchResult>)> {
        {
            let state = self.state.read();
            let old = state
                .store
                .find_by_id(old_id)
                .ok_or_else(|| Error::NotFound(format!("item '{old_id}'")))?;
            if old.tombstoned {
                return Err(Error::InvalidInput(format!("item '{old_id}' is already superseded")));
            }
        }
        let (new_id, neighbors) = self.add_item(input)?;
        self.state.write().store.tombstone(old_id)?;
        self.cache.lock().flush();
        Ok((new_id, neighbors))
    }

    /// Bulk load. Rows are validated individually (a bad row is counted,
    /// not fatal), embedded in batches with bounded retry, and appended
    /// pair-by-pair under the write lock.
    pub fn ingest_batch(&self, inputs: Vec<ItemInput>) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut pending: Vec<(ItemInput, String)> = Vec::new();
        for input in inputs {
            if input.title.trim().is_empty() {
                report.skipped += 1;
                continue;
            }
            let normalized = normalize(&format!("{} {}", input.title, input.body));
            if normalized.is_empty() {
                report.skipped += 1;
                continue;
            }
            pending.push((input, normalized));
        }

        for chunk in pending.chunks(INGEST_BATCH) {
            let texts: Vec<String> = chunk.iter().map(|(_, n)| n.clone()).collect();
            let vectors = self.embed_batch_with_retry(&texts)?;
            if vectors.len() != texts.len() {
                return Err(Error::EmbeddingUnavailable(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                )));
            }
            for ((input, normalized), vector) in chunk.iter().zip(vectors) {
                let item = build_item(input.clone(), normalized.clone());
                match self.append_pair(item, &vector) {
                    Ok(_) => report.ingested += 1,
                    Err(Error::InvalidInput(reason)) => {
                        warn!(%reason, "skipping row");
                        report.skipped += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if report.ingested > 0 {
            self.cache.lock().flush();
        }
        Ok(report)
    }

    /// Reads a JSON Lines file of item inputs and ingests it. Malformed
    /// lines are skipped and counted.
    pub fn ingest_jsonl(&self, path: &Path) -> Result<IngestReport> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut inputs = Vec::new();
        let mut malformed = 0usize;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ItemInput>(&line) {
                Ok(input) => inputs.push(input),
                Err(e) => {
                    warn!(error = %e, "skipping malformed row");
                    malformed += 1;
                }
            }
        }
        let mut report = self.ingest_batch(inputs)?;
        report.skipped += malformed;
        Ok(report)
    }

    /// Records one interaction: appends to the log, bumps the matching
    /// counter for likes/dislikes, and flushes the cache.
    pub fn record_interaction(&self, user_id: &str, item_id: &str, kind: InteractionKind) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user_id must not be empty".to_string()));
        }
        {
            let mut state = self.state.write();
            state.store.update_engagement(item_id, kind)?;
            state.interactions.push(Interaction {
                user_id: user_id.to_string(),
                item_id: item_id.to_string(),
                kind,
                at: Utc::now(),
            });
        }
        self.cache.lock().flush();
        Ok(())
    }

    /// Fetches one item by id, tombstoned or not; the caller sees the
    /// flag.
    pub fn get_item(&self, id: &str) -> Result<Item> {
        self.state
            .read()
            .store
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("item '{id}'")))
    }

    /// Paginated listing over live items.
    pub fn list_items(&self, request: &ListRequest) -> Result<ListResponse> {
        if request.page == 0 || request.page_size == 0 {
            return Err(Error::InvalidInput("page and page_size must be positive".to_string()));
        }
        let state = self.state.read();
        let mut live: Vec<&Item> = state.store.iter_live().collect();
        match request.sort_by {
            SortBy::Recent => live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))),
            SortBy::Popular => live.sort_by(|a, b| {
                b.popularity_score
                    .partial_cmp(&a.popularity_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            SortBy::Likes => live.sort_by(|a, b| b.likes.cmp(&a.likes).then_with(|| a.id.cmp(&b.id))),
        }
        let total = live.len();
        let start = (request.page - 1).saturating_mul(request.page_size);
        let items: Vec<Item> =
            live.into_iter().skip(start).take(request.page_size).cloned().collect();
        Ok(ListResponse { items, page: request.page, page_size: request.page_size, total })
    }

    /// Engagement summary over live items.
    pub fn statistics(&self) -> Statistics {
        let state = self.state.read();
        let mut stats = Statistics {
            total_items: 0,
            total_likes: 0,
            total_dislikes: 0,
            avg_likes: 0.0,
            avg_dislikes: 0.0,
            most_popular: None,
            least_popular: None,
            min_popularity: 0.0,
            max_popularity: 0.0,
        };
        let mut best: Option<(f32, &str)> = None;
        let mut worst: Option<(f32, &str)> = None;
        for item in state.store.iter_live() {
            stats.total_items += 1;
            stats.total_likes += item.likes;
            stats.total_dislikes += item.dislikes;
            if best.map_or(true, |(score, _)| item.popularity_score > score) {
                best = Some((item.popularity_score, item.id.as_str()));
            }
            if worst.map_or(true, |(score, _)| item.popularity_score < score) {
                worst = Some((item.popularity_score, item.id.as_str()));
            }
        }
        if stats.total_items > 0 {
            stats.avg_likes = stats.total_likes as f32 / stats.total_items as f32;
            stats.avg_dislikes = stats.total_dislikes as f32 / stats.total_items as f32;
        }
        if let Some((score, id)) = best {
            stats.max_popularity = score;
            stats.most_popular = Some(id.to_string());
        }
        if let Some((score, id)) = worst {
            stats.min_popularity = score;
            stats.least_popular = Some(id.to_string());
        }
        stats
    }

    /// Items ranked by interaction volume inside the window. A corpus
    /// with no recent interactions falls back to popularity order.
    pub fn trending(&self, window_days: u32, limit: usize) -> Vec<TrendingItem> {
        let state = self.state.read();
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(window_days));
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for interaction in state.interactions.iter().filter(|i| i.at >= cutoff) {
            *counts.entry(interaction.item_id.as_str()).or_insert(0) += 1;
        }

        let mut ranked: Vec<TrendingItem> = state
            .store
            .iter_live()
            .filter_map(|item| {
                let n = counts.get(item.id.as_str()).copied().unwrap_or(0);
                (n > 0).then(|| TrendingItem {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    recent_interactions: n,
                    popularity_score: item.popularity_score,
                })
            })
            .collect();

        if ranked.is_empty() {
            ranked = state
                .store
                .iter_live()
                .map(|item| TrendingItem {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    recent_interactions: 0,
                    popularity_score: item.popularity_score,
                })
                .collect();
            ranked.sort_by(|a, b| {
                b.popularity_score
                    .partial_cmp(&a.popularity_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
        } else {
            ranked.sort_by(|a, b| {
                b.recent_interactions
                    .cmp(&a.recent_interactions)
                    .then_with(|| {
                        b.popularity_score
                            .partial_cmp(&a.popularity_score)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        ranked.truncate(limit);
        ranked
    }

    /// Items from the user's preferred facet value (inferred from their
    /// like/view history), most popular first; global popularity when
    /// the user is unknown or the facet is exhausted. Items the user
    /// already touched are excluded.
    pub fn recommendations(&self, user_id: &str, limit: usize) -> Vec<Recommendation> {
        let state = self.state.read();
        let pref_key = self.options.preference_attribute.as_str();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut votes: HashMap<&str, usize> = HashMap::new();
        for interaction in state.interactions.iter().filter(|i| i.user_id == user_id) {
            seen.insert(interaction.item_id.as_str());
            if matches!(interaction.kind, InteractionKind::Like | InteractionKind::View) {
                if let Some(value) = state
                    .store
                    .find_by_id(&interaction.item_id)
                    .and_then(|item| item.attributes.get(pref_key))
                {
                    *votes.entry(value.as_str()).or_insert(0) += 1;
                }
            }
        }
        let preferred: Option<String> = votes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(value, _)| value.to_string());

        let collect = |restrict: Option<&String>| -> Vec<Recommendation> {
            let mut pool: Vec<&Item> = state
                .store
                .iter_live()
                .filter(|item| !seen.contains(item.id.as_str()))
                .filter(|item| match restrict {
                    Some(value) => item.attributes.get(pref_key) == Some(value),
                    None => true,
                })
                .collect();
            pool.sort_by(|a, b| {
                b.popularity_score
                    .partial_cmp(&a.popularity_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            pool.into_iter()
                .take(limit)
                .map(|item| Recommendation {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    body_snippet: item.snippet(self.options.snippet_chars),
                    attributes: item.attributes.clone(),
                    popularity_score: item.popularity_score,
                })
                .collect()
        };

        let mut recs = collect(preferred.as_ref());
        if recs.is_empty() && preferred.is_some() {
            recs = collect(None);
        }
        recs
    }

    /// Persists items, vectors, and the interaction log as one artifact.
    pub fn save_snapshot(&self, path: &Path) -> Result<usize> {
        let state = self.state.read();
        let items = state.store.items().to_vec();
        let mut vectors = Vec::with_capacity(items.len());
        for position in 0..items.len() {
            let v = state.index.vector(position).ok_or_else(|| {
                Error::CorruptIndexState(format!("vector {position} missing during export"))
            })?;
            vectors.push(v.to_vec());
        }
        let count = items.len();
        let snapshot = Snapshot {
            schema_version: SCHEMA_VERSION,
            embedder_id: self.embedder.id(),
            dim: self.embedder.dim(),
            items,
            vectors,
            interactions: state.interactions.clone(),
        };
        snapshot.save(path)?;
        Ok(count)
    }

    /// Replaces in-memory state with a snapshot. Everything is validated
    /// before the write lock is taken; a snapshot from a different
    /// embedding space is rejected outright.
    pub fn load_snapshot(&self, path: &Path) -> Result<usize> {
        let snapshot = Snapshot::load(path)?;
        if snapshot.embedder_id != self.embedder.id() {
            return Err(Error::CorruptIndexState(format!(
                "snapshot was built with embedder '{}' but this engine runs '{}'",
                snapshot.embedder_id,
                self.embedder.id()
            )));
        }
        if snapshot.dim != self.embedder.dim() {
            return Err(Error::CorruptIndexState(format!(
                "snapshot dim {} does not match embedder dim {}",
                snapshot.dim,
                self.embedder.dim()
            )));
        }
        let count = snapshot.items.len();
        let store = ItemStore::from_items(snapshot.items)?;

        let mut state = self.state.write();
        state.index.clear();
        for vector in &snapshot.vectors {
            state.index.insert(vector)?;
        }
        state.store = store;
        state.interactions = snapshot.interactions;
        drop(state);

        self.cache.lock().flush();
        Ok(count)
    }

    fn prepare_item(&self, input: ItemInput) -> Result<(Item, Vec<f32>)> {
        if input.title.trim().is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }
        let normalized = normalize(&format!("{} {}", input.title, input.body));
        if normalized.is_empty() {
            return Err(Error::InvalidInput("item text is empty after cleanup".to_string()));
        }
        let vector = self
            .embedder
            .embed(&normalized)
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;
        Ok((build_item(input, normalized), vector))
    }

    /// The single critical section of the whole design: vector and row
    /// must land at the same position, with no interleaving writer.
    fn append_pair(&self, item: Item, vector: &[f32]) -> Result<usize> {
        let mut state = self.state.write();
        if state.store.position_of(&item.id).is_some() {
            return Err(Error::InvalidInput(format!("duplicate item id '{}'", item.id)));
        }
        let vec_pos = state.index.insert(vector)?;
        let row_pos = state.store.append(item)?;
        if vec_pos != row_pos {
            return Err(Error::CorruptIndexState(format!(
                "index assigned position {vec_pos} but store assigned {row_pos}"
            )));
        }
        Ok(row_pos)
    }

    fn rank_candidates(
        &self,
        state: &EngineState,
        query_vec: &[f32],
        request: &SearchRequest,
    ) -> Result<(Vec<SearchResult>, usize)> {
        let k = request.top_k.saturating_mul(self.options.oversample);
        let candidates = state.index.search(query_vec, k)?;

        let mut kept: Vec<SearchResult> = Vec::new();
        for (position, similarity) in candidates {
            let item = state.store.get(position).ok_or_else(|| {
                Error::CorruptIndexState(format!("vector {position} has no item row"))
            })?;
            if item.tombstoned {
                continue;
            }
            if similarity < request.similarity_threshold {
                continue;
            }
            if !matches_filters(item, &request.filters) {
                continue;
            }
            let personalization = match &request.user_id {
                Some(user) => personalization_score(&state.interactions, user, &item.id),
                None => 0.0,
            };
            let final_score =
                blend(similarity, item.popularity_score, personalization, request.weights);
            kept.push(SearchResult {
                id: item.id.clone(),
                title: item.title.clone(),
                body_snippet: item.snippet(self.options.snippet_chars),
                attributes: item.attributes.clone(),
                similarity_score: similarity,
                final_score,
                popularity_score: item.popularity_score,
                rank: 0,
            });
        }

        kept.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.similarity_score
                        .partial_cmp(&a.similarity_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        let total_found = kept.len();
        kept.truncate(request.top_k);
        for (i, result) in kept.iter_mut().enumerate() {
            result.rank = i + 1;
        }
        Ok((kept, total_found))
    }

    /// Embed with an optional wall-clock budget. The provider call runs
    /// on a helper thread so a stuck model cannot hang the query path;
    /// on timeout the orphaned call finishes in the background and its
    /// result is dropped.
    fn embed_bounded(&self, text: &str, timeout: Option<Duration>) -> Result<Vec<f32>> {
        match timeout {
            None => self
                .embedder
                .embed(text)
                .map_err(|e| Error::EmbeddingUnavailable(e.to_string())),
            Some(limit) => {
                let embedder = Arc::clone(&self.embedder);
                let owned = text.to_string();
                let (tx, rx) = mpsc::sync_channel(1);
                thread::spawn(move || {
                    let _ = tx.send(embedder.embed(&owned));
                });
                match rx.recv_timeout(limit) {
                    Ok(Ok(vector)) => Ok(vector),
                    Ok(Err(e)) => Err(Error::EmbeddingUnavailable(e.to_string())),
                    Err(_) => Err(Error::UpstreamTimeout(limit.as_millis() as u64)),
                }
            }
        }
    }

    fn embed_batch_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let started = Instant::now();
        let mut delay = Duration::from_millis(100);
        for attempt in 1..=INGEST_RETRIES {
            match self.embedder.embed_batch(texts) {
                Ok(vectors) => return Ok(vectors),
                Err(e) => {
                    warn!(attempt, error = %e, "batch embedding failed");
                    if attempt < INGEST_RETRIES {
                        thread::sleep(delay);
                        delay *= 2;
                    }
                }
            }
        }
        Err(Error::UpstreamTimeout(started.elapsed().as_millis() as u64))
    }
}

fn build_item(input: ItemInput, normalized_text: String) -> Item {
    let id = input
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    Item {
        id,
        title: input.title,
        body: input.body,
        attributes: input.attributes,
        likes: input.likes,
        dislikes: input.dislikes,
        normalized_text,
        popularity_score: popularity_score(input.likes, input.dislikes),
        tombstoned: false,
        created_at: Utc::now(),
    }
}

fn matches_filters(item: &Item, filters: &Attributes) -> bool {
    filters.iter().all(|(key, value)| item.attributes.get(key).is_some_and(|actual| actual == value))
}

fn cache_key(normalized_query: &str, request: &SearchRequest) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(normalized_query.as_bytes());
    hasher.update(&[0xff]);
    hasher.update(&request.top_k.to_le_bytes());
    hasher.update(&request.similarity_threshold.to_le_bytes());
    hasher.update(&request.weights.popularity.to_le_bytes());
    hasher.update(&request.weights.personalization.to_le_bytes());
    for (key, value) in &request.filters {
        hasher.update(key.as_bytes());
        hasher.update(&[0xfe]);
        hasher.update(value.as_bytes());
        hasher.update(&[0xff]);
    }
    if let Some(user) = &request.user_id {
        hasher.update(user.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
