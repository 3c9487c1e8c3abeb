//! Query and catalog orchestration.
//!
//! [`IdeaEngine`] is the single handle applications hold: it owns the
//! embedder, the aligned item/vector state, the interaction log, and the
//! result cache, and exposes search, ingestion, engagement, analytics,
//! and snapshot persistence.

pub mod cache;
pub mod engine;
pub mod request;
pub mod scoring;

pub use cache::ResultCache;
pub use engine::{EngineOptions, IdeaEngine, IngestReport, DEFAULT_OVERSAMPLE};
pub use request::{
    ListRequest, ListResponse, Recommendation, SearchRequest, SearchResponse, SortBy, TrendingItem,
};
pub use scoring::{blend, personalization_score, popularity_score, ScoreWeights};
