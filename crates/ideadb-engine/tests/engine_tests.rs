use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ideadb_core::error::Error;
use ideadb_core::normalize::normalize;
use ideadb_core::traits::Embedder;
use ideadb_core::types::{InteractionKind, ItemInput, SearchResult};
use ideadb_engine::{
    blend, popularity_score, IdeaEngine, ListRequest, ScoreWeights, SearchRequest, SortBy,
};
use tempfile::TempDir;

const DIM: usize = 4;

/// Embedder with hand-placed vectors keyed by normalized text, so every
/// similarity in these tests is a number chosen on purpose.
struct FixtureEmbedder {
    name: &'static str,
    vectors: HashMap<String, Vec<f32>>,
}

impl FixtureEmbedder {
    fn new(name: &'static str) -> Self {
        Self { name, vectors: HashMap::new() }
    }

    fn with(mut self, text: &str, vector: [f32; DIM]) -> Self {
        let mut v = vector.to_vec();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        self.vectors.insert(normalize(text), v);
        self
    }
}

impl Embedder for FixtureEmbedder {
    fn id(&self) -> String {
        format!("fixture:{}:d{DIM}", self.name)
    }

    fn dim(&self) -> usize {
        DIM
    }

    fn max_len(&self) -> usize {
        64
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no vector staged for '{text}'"))
    }
}

/// Wraps a fixture and sleeps before answering; simulates a stuck model.
struct SlowEmbedder {
    delay: Duration,
    inner: FixtureEmbedder,
}

impl Embedder for SlowEmbedder {
    fn id(&self) -> String {
        self.inner.id()
    }

    fn dim(&self) -> usize {
        DIM
    }

    fn max_len(&self) -> usize {
        64
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        thread::sleep(self.delay);
        self.inner.embed(text)
    }
}

fn input(id: &str, title: &str, likes: u64, dislikes: u64) -> ItemInput {
    ItemInput {
        id: Some(id.to_string()),
        title: title.to_string(),
        likes,
        dislikes,
        ..Default::default()
    }
}

fn with_attr(mut input: ItemInput, key: &str, value: &str) -> ItemInput {
    input.attributes.insert(key.to_string(), value.to_string());
    input
}

fn ids(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

/// Corpus for the canonical scenario: two cafe ideas that tie on raw
/// similarity but differ sharply in reception, plus an unrelated one.
fn korean_embedder() -> FixtureEmbedder {
    FixtureEmbedder::new("korean")
        .with("카페 창업 지원", [0.8, 0.6, 0.0, 0.0])
        .with("카페 인테리어 디자인", [0.8, 0.0, 0.6, 0.0])
        .with("농업 기술 지원", [0.1, 0.0, 0.0, 0.995])
        .with("카페 메뉴 개발", [0.9, 0.0, 0.0, 0.436])
        .with("카페 지원", [1.0, 0.0, 0.0, 0.0])
}

fn korean_engine() -> IdeaEngine {
    let engine = IdeaEngine::with_defaults(Arc::new(korean_embedder()));
    engine.add_item(input("idea-a", "카페 창업 지원", 10, 0)).expect("add a");
    engine.add_item(input("idea-b", "카페 인테리어 디자인", 2, 8)).expect("add b");
    engine.add_item(input("idea-c", "농업 기술 지원", 0, 0)).expect("add c");
    engine
}

/// Two items with identical vectors; only engagement can separate them.
fn tie_engine() -> IdeaEngine {
    let embedder = FixtureEmbedder::new("tie")
        .with("정책 하나", [1.0, 0.0, 0.0, 0.0])
        .with("정책 둘", [1.0, 0.0, 0.0, 0.0])
        .with("정책", [1.0, 0.0, 0.0, 0.0]);
    let engine = IdeaEngine::with_defaults(Arc::new(embedder));
    engine.add_item(input("a", "정책 하나", 0, 0)).expect("add a");
    engine.add_item(input("b", "정책 둘", 0, 0)).expect("add b");
    engine
}

#[test]
fn popularity_is_neutral_without_votes() {
    assert!((popularity_score(0, 0) - 0.5).abs() < 1e-6);
    assert!((popularity_score(3, 1) - 0.75).abs() < 1e-6);
    assert!((popularity_score(10, 0) - 1.0).abs() < 1e-6);
}

#[test]
fn blend_is_monotonic_in_each_signal() {
    let weights = ScoreWeights::default();
    assert!(blend(0.9, 0.5, 0.0, weights) > blend(0.6, 0.5, 0.0, weights));
    assert!(blend(0.6, 0.9, 0.0, weights) > blend(0.6, 0.4, 0.0, weights));
    assert!(blend(0.6, 0.5, 0.8, weights) > blend(0.6, 0.5, 0.1, weights));
}

#[test]
fn cafe_query_ranks_by_popularity_when_similarity_ties() {
    let engine = korean_engine();
    let mut request = SearchRequest::new("카페 지원");
    request.top_k = 2;
    request.similarity_threshold = 0.0;

    let response = engine.search(&request).expect("search");
    assert_eq!(ids(&response.results), vec!["idea-a", "idea-b"]);
    assert_eq!(response.total_found, 3, "the unrelated item still passed threshold 0.0");

    let a = &response.results[0];
    let b = &response.results[1];
    assert!(
        (a.similarity_score - b.similarity_score).abs() < 1e-6,
        "raw similarities tie by construction"
    );
    assert!(a.final_score > b.final_score, "popularity separates the tie");
    assert_eq!((a.rank, b.rank), (1, 2));
}

#[test]
fn threshold_drops_weak_candidates() {
    let engine = korean_engine();
    let mut request = SearchRequest::new("카페 지원");
    request.top_k = 10;
    request.similarity_threshold = 0.5;

    let response = engine.search(&request).expect("search");
    assert_eq!(response.total_found, 2);
    for result in &response.results {
        assert!(
            result.similarity_score >= 0.5,
            "{} returned below threshold: {}",
            result.id,
            result.similarity_score
        );
    }
    assert!(!ids(&response.results).contains(&"idea-c"));
}

#[test]
fn top_k_bounds_the_result_list() {
    let engine = korean_engine();
    let mut request = SearchRequest::new("카페 지원");
    request.similarity_threshold = 0.0;

    request.top_k = 1;
    assert_eq!(engine.search(&request).expect("search").results.len(), 1);

    request.top_k = 10;
    let response = engine.search(&request).expect("search");
    assert_eq!(response.results.len(), 3, "k beyond the corpus returns everything that passed");
    let ranks: Vec<usize> = response.results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn invalid_requests_fail_before_embedding() {
    // No vectors staged: if validation ran after embedding these would
    // surface as EmbeddingUnavailable instead.
    let engine = IdeaEngine::with_defaults(Arc::new(FixtureEmbedder::new("empty")));

    let err = engine.search(&SearchRequest::new("")).expect_err("empty query");
    assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");

    let err = engine.search(&SearchRequest::new("!!!???")).expect_err("symbols only");
    assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");

    let mut request = SearchRequest::new("카페");
    request.top_k = 0;
    let err = engine.search(&request).expect_err("zero top_k");
    assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");
}

#[test]
fn exact_match_filters_restrict_results() {
    let embedder = FixtureEmbedder::new("filters")
        .with("정책 하나", [1.0, 0.0, 0.0, 0.0])
        .with("정책 둘", [1.0, 0.0, 0.0, 0.0])
        .with("정책", [1.0, 0.0, 0.0, 0.0]);
    let engine = IdeaEngine::with_defaults(Arc::new(embedder));
    engine
        .add_item(with_attr(input("a", "정책 하나", 0, 0), "region", "서울"))
        .expect("add a");
    engine
        .add_item(with_attr(input("b", "정책 둘", 0, 0), "region", "부산"))
        .expect("add b");

    let mut request = SearchRequest::new("정책");
    request.filters.insert("region".to_string(), "서울".to_string());
    let response = engine.search(&request).expect("search");
    assert_eq!(ids(&response.results), vec!["a"]);
    assert_eq!(response.total_found, 1);

    request.filters.insert("region".to_string(), "대구".to_string());
    let response = engine.search(&request).expect("search");
    assert!(response.results.is_empty());
    assert_eq!(response.total_found, 0);

    // A filter on an attribute the item never set matches nothing.
    request.filters.clear();
    request.filters.insert("target".to_string(), "청년".to_string());
    assert!(engine.search(&request).expect("search").results.is_empty());
}

#[test]
fn own_text_query_returns_the_new_item_first() {
    let engine = korean_engine();
    let (id, neighbors) = engine.add_item(input("idea-d", "카페 메뉴 개발", 0, 0)).expect("add");
    assert_eq!(id, "idea-d");
    assert!(
        neighbors.iter().any(|r| r.id == "idea-a"),
        "the overlapping cafe idea should surface as a near-duplicate"
    );

    let mut request = SearchRequest::new("카페 메뉴 개발");
    request.top_k = 1;
    let response = engine.search(&request).expect("search");
    assert_eq!(ids(&response.results), vec!["idea-d"]);
    assert!((response.results[0].similarity_score - 1.0).abs() < 1e-5);
}

#[test]
fn cache_replays_results_until_a_write_invalidates() {
    let engine = korean_engine();
    let mut request = SearchRequest::new("카페 지원");
    request.top_k = 2;
    request.similarity_threshold = 0.0;

    let first = engine.search(&request).expect("search");
    let second = engine.search(&request).expect("search");
    assert_eq!(ids(&first.results), ids(&second.results));
    for (x, y) in first.results.iter().zip(&second.results) {
        assert_eq!(x.final_score, y.final_score, "cached replay is bitwise identical");
    }

    engine.add_item(input("idea-d", "카페 메뉴 개발", 0, 0)).expect("add");
    let third = engine.search(&request).expect("search");
    assert_eq!(
        ids(&third.results),
        vec!["idea-a", "idea-d"],
        "the write flushed the cache and the new item outranks idea-b"
    );
}

#[test]
fn like_flips_an_otherwise_tied_ranking() {
    let engine = tie_engine();
    let request = SearchRequest::new("정책");

    let before = engine.search(&request).expect("search");
    assert_eq!(ids(&before.results), vec!["a", "b"], "full tie falls back to id order");

    engine.record_interaction("u1", "b", InteractionKind::Like).expect("like");
    assert_eq!(engine.get_item("b").expect("item").likes, 1);
    assert!((engine.get_item("b").expect("item").popularity_score - 1.0).abs() < 1e-6);

    let after = engine.search(&request).expect("search");
    assert_eq!(ids(&after.results), vec!["b", "a"], "the like reranked past the cache");
}

#[test]
fn personalization_only_affects_the_engaged_user() {
    let engine = tie_engine();
    // Views touch the log but not the counters.
    engine.record_interaction("u1", "b", InteractionKind::View).expect("view");
    assert_eq!(engine.get_item("b").expect("item").likes, 0);

    let mut request = SearchRequest::new("정책");
    request.user_id = Some("u1".to_string());
    assert_eq!(ids(&engine.search(&request).expect("search").results), vec!["b", "a"]);

    request.user_id = Some("u2".to_string());
    assert_eq!(ids(&engine.search(&request).expect("search").results), vec!["a", "b"]);
}

#[test]
fn interaction_validation() {
    let engine = tie_engine();

    let err = engine
        .record_interaction("u1", "missing", InteractionKind::Like)
        .expect_err("unknown item");
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");

    let err = engine.record_interaction("  ", "a", InteractionKind::Like).expect_err("blank user");
    assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");
}

#[test]
fn duplicate_ids_are_rejected_without_breaking_alignment() {
    let engine = korean_engine();
    let err = engine.add_item(input("idea-a", "카페 창업 지원", 0, 0)).expect_err("duplicate");
    assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");
    assert_eq!(engine.item_count(), 3, "the failed insert left no row behind");

    let mut request = SearchRequest::new("카페 지원");
    request.top_k = 10;
    request.similarity_threshold = 0.0;
    assert_eq!(engine.search(&request).expect("search").results.len(), 3);
}

#[test]
fn revision_tombstones_the_old_row_in_place() {
    let embedder = korean_embedder().with("카페 리모델링 지원", [0.85, 0.0, 0.0, 0.527]);
    let engine = IdeaEngine::with_defaults(Arc::new(embedder));
    engine.add_item(input("idea-a", "카페 창업 지원", 10, 0)).expect("add a");
    engine.add_item(input("idea-b", "카페 인테리어 디자인", 2, 8)).expect("add b");

    let (new_id, _) =
        engine.revise_item("idea-b", input("idea-b2", "카페 리모델링 지원", 0, 0)).expect("revise");
    assert_eq!(new_id, "idea-b2");
    assert!(engine.get_item("idea-b").expect("old row").tombstoned);
    assert_eq!(engine.item_count(), 3, "the old row keeps its position");
    assert_eq!(engine.live_item_count(), 2);

    let mut request = SearchRequest::new("카페 지원");
    request.top_k = 10;
    request.similarity_threshold = 0.0;
    let found = engine.search(&request).expect("search");
    assert!(!ids(&found.results).contains(&"idea-b"), "superseded rows never surface");
    assert!(ids(&found.results).contains(&"idea-b2"));

    let err = engine.revise_item("idea-b", input("x", "카페 리모델링 지원", 0, 0)).expect_err("again");
    assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");
    let err = engine.revise_item("nope", input("y", "카페 리모델링 지원", 0, 0)).expect_err("unknown");
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[test]
fn ingest_counts_rejected_rows_without_aborting() {
    let embedder = FixtureEmbedder::new("ingest")
        .with("청년 주거 지원", [1.0, 0.0, 0.0, 0.0])
        .with("전통 시장 활성화", [0.0, 1.0, 0.0, 0.0]);
    let engine = IdeaEngine::with_defaults(Arc::new(embedder));

    let rows = vec![
        input("g1", "청년 주거 지원", 0, 0),
        ItemInput { title: String::new(), ..Default::default() },
        input("g3", "!!!@@@", 0, 0),
        input("g1", "청년 주거 지원", 0, 0),
        input("g2", "전통 시장 활성화", 0, 0),
    ];
    let report = engine.ingest_batch(rows).expect("ingest");
    assert_eq!(report.ingested, 2);
    assert_eq!(report.skipped, 3, "blank title, empty after cleanup, duplicate id");
    assert_eq!(engine.item_count(), 2);
}

#[test]
fn jsonl_ingestion_skips_malformed_lines() {
    let embedder = FixtureEmbedder::new("jsonl")
        .with("청년 주거 지원", [1.0, 0.0, 0.0, 0.0])
        .with("전통 시장 활성화", [0.0, 1.0, 0.0, 0.0]);
    let engine = IdeaEngine::with_defaults(Arc::new(embedder));

    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("rows.jsonl");
    std::fs::write(
        &path,
        concat!(
            r#"{"id":"j1","title":"청년 주거 지원"}"#,
            "\n",
            "this line is not json\n",
            "\n",
            r#"{"id":"j2","title":"전통 시장 활성화","likes":4}"#,
            "\n",
        ),
    )
    .expect("write rows");

    let report = engine.ingest_jsonl(&path).expect("ingest");
    assert_eq!(report.ingested, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(engine.get_item("j2").expect("item").likes, 4);
}

#[test]
fn slow_embedder_times_out_with_a_retryable_error() {
    let inner = FixtureEmbedder::new("slow").with("카페 지원", [1.0, 0.0, 0.0, 0.0]);
    let engine =
        IdeaEngine::with_defaults(Arc::new(SlowEmbedder { delay: Duration::from_millis(200), inner }));

    let mut request = SearchRequest::new("카페 지원");
    request.timeout_ms = Some(25);
    let err = engine.search(&request).expect_err("timeout");
    assert!(matches!(err, Error::UpstreamTimeout(25)), "got {err:?}");
    assert!(err.is_retryable());
}

#[test]
fn snapshot_round_trip_preserves_items_vectors_and_log() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("data/ideas.json");

    let engine = korean_engine();
    engine.record_interaction("u1", "idea-a", InteractionKind::Like).expect("like");
    engine.record_interaction("u1", "idea-b", InteractionKind::View).expect("view");
    let saved = engine.save_snapshot(&path).expect("save");
    assert_eq!(saved, 3);

    let mut request = SearchRequest::new("카페 지원");
    request.top_k = 2;
    request.similarity_threshold = 0.0;
    let before = engine.search(&request).expect("search");

    let restored = IdeaEngine::with_defaults(Arc::new(korean_embedder()));
    let loaded = restored.load_snapshot(&path).expect("load");
    assert_eq!(loaded, 3);
    assert_eq!(restored.item_count(), 3);
    assert_eq!(restored.interaction_count(), 2);

    let after = restored.search(&request).expect("search");
    assert_eq!(ids(&before.results), ids(&after.results));
    assert_eq!(restored.get_item("idea-a").expect("item").likes, 11, "the like survived the trip");
}

#[test]
fn snapshot_from_another_embedding_space_is_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("ideas.json");
    korean_engine().save_snapshot(&path).expect("save");

    let other = IdeaEngine::with_defaults(Arc::new(FixtureEmbedder::new("other")));
    let err = other.load_snapshot(&path).expect_err("embedder mismatch");
    assert!(matches!(err, Error::CorruptIndexState(_)), "got {err:?}");
}

#[test]
fn listing_sorts_and_paginates_live_items() {
    let engine = korean_engine();

    let mut request = ListRequest { page: 1, page_size: 2, sort_by: SortBy::Likes };
    let page1 = engine.list_items(&request).expect("page 1");
    assert_eq!(page1.total, 3);
    let page1_ids: Vec<&str> = page1.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(page1_ids, vec!["idea-a", "idea-b"]);

    request.page = 2;
    let page2 = engine.list_items(&request).expect("page 2");
    let page2_ids: Vec<&str> = page2.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(page2_ids, vec!["idea-c"]);

    request.page = 1;
    request.page_size = 3;
    request.sort_by = SortBy::Popular;
    let by_pop = engine.list_items(&request).expect("by popularity");
    let pop_ids: Vec<&str> = by_pop.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(pop_ids, vec!["idea-a", "idea-c", "idea-b"]);

    request.page = 0;
    assert!(matches!(engine.list_items(&request), Err(Error::InvalidInput(_))));
}

#[test]
fn statistics_aggregate_live_engagement() {
    let engine = korean_engine();
    let stats = engine.statistics();
    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.total_likes, 12);
    assert_eq!(stats.total_dislikes, 8);
    assert!((stats.avg_likes - 4.0).abs() < 1e-6);
    assert_eq!(stats.most_popular.as_deref(), Some("idea-a"));
    assert_eq!(stats.least_popular.as_deref(), Some("idea-b"));
    assert!((stats.max_popularity - 1.0).abs() < 1e-6);
    assert!((stats.min_popularity - 0.2).abs() < 1e-6);
}

#[test]
fn trending_ranks_by_recent_volume_with_popularity_fallback() {
    let engine = korean_engine();

    let quiet = engine.trending(7, 3);
    let quiet_ids: Vec<&str> = quiet.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(quiet_ids, vec!["idea-a", "idea-c", "idea-b"], "no interactions: popularity order");
    assert!(quiet.iter().all(|t| t.recent_interactions == 0));

    engine.record_interaction("u1", "idea-b", InteractionKind::View).expect("view");
    engine.record_interaction("u2", "idea-b", InteractionKind::View).expect("view");
    engine.record_interaction("u1", "idea-c", InteractionKind::View).expect("view");

    let hot = engine.trending(7, 2);
    let hot_ids: Vec<&str> = hot.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(hot_ids, vec!["idea-b", "idea-c"]);
    assert_eq!(hot[0].recent_interactions, 2);
}

#[test]
fn hash_embedder_end_to_end_self_similarity() {
    let engine = IdeaEngine::with_defaults(Arc::new(ideadb_embed::HashEmbedder::new(64)));
    let titles = [
        ("h1", "청년 카페 창업 공간 지원"),
        ("h2", "전통 시장 디지털 전환 교육"),
        ("h3", "농촌 마을 버스 노선 확충"),
    ];
    for (id, title) in titles {
        engine.add_item(input(id, title, 0, 0)).expect("add");
    }

    for (id, title) in titles {
        let mut request = SearchRequest::new(title);
        request.top_k = 1;
        let response = engine.search(&request).expect("search");
        assert_eq!(ids(&response.results), vec![id], "own text must rank itself first");
        assert!((response.results[0].similarity_score - 1.0).abs() < 1e-4);
    }
}

#[test]
fn recommendations_follow_the_inferred_preference() {
    let embedder = FixtureEmbedder::new("recs")
        .with("청년 창업 멘토링", [1.0, 0.0, 0.0, 0.0])
        .with("창업 공간 지원", [0.0, 1.0, 0.0, 0.0])
        .with("하천 환경 정화", [0.0, 0.0, 1.0, 0.0])
        .with("창업 세무 상담", [0.0, 0.0, 0.0, 1.0]);
    let engine = IdeaEngine::with_defaults(Arc::new(embedder));
    engine
        .add_item(with_attr(input("r1", "청년 창업 멘토링", 5, 0), "category", "창업"))
        .expect("add r1");
    engine
        .add_item(with_attr(input("r2", "창업 공간 지원", 0, 0), "category", "창업"))
        .expect("add r2");
    engine
        .add_item(with_attr(input("r3", "하천 환경 정화", 10, 0), "category", "환경"))
        .expect("add r3");
    engine
        .add_item(with_attr(input("r4", "창업 세무 상담", 1, 3), "category", "창업"))
        .expect("add r4");

    engine.record_interaction("u1", "r1", InteractionKind::Like).expect("like");
    let recs = engine.recommendations("u1", 2);
    let rec_ids: Vec<&str> = recs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(rec_ids, vec!["r2", "r4"], "same facet, minus the item already seen");

    let cold = engine.recommendations("stranger", 2);
    let cold_ids: Vec<&str> = cold.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(cold_ids, vec!["r1", "r3"], "no history: global popularity order");
}
