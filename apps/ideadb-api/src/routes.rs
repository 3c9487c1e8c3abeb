use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::task;

use ideadb_core::error::Error;
use ideadb_core::types::{Item, ItemInput, Statistics};
use ideadb_engine::{
    ListRequest, ListResponse, Recommendation, SearchRequest, SearchResponse, TrendingItem,
};

use crate::state::{
    AddIdeaResponse, AppState, InteractRequest, RecommendQuery, SnapshotReport, TrendingQuery,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/search", post(search))
        .route("/v1/ideas", post(add_idea).get(list_ideas))
        .route("/v1/ideas/{id}", get(get_idea).put(revise_idea))
        .route("/v1/interactions", post(record_interaction))
        .route("/v1/statistics", get(statistics))
        .route("/v1/trending", get(trending))
        .route("/v1/recommendations/{user_id}", get(recommendations))
        .route("/v1/snapshot/save", post(save_snapshot))
        .route("/v1/snapshot/load", post(load_snapshot))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let engine = state.engine.clone();
    let response = task::spawn_blocking(move || engine.search(&payload)).await.map_err(join_error)??;
    Ok(Json(response))
}

async fn add_idea(
    State(state): State<AppState>,
    Json(payload): Json<ItemInput>,
) -> Result<Json<AddIdeaResponse>, ApiError> {
    let engine = state.engine.clone();
    let (id, similar) =
        task::spawn_blocking(move || engine.add_item(payload)).await.map_err(join_error)??;
    Ok(Json(AddIdeaResponse { id, similar }))
}

async fn revise_idea(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ItemInput>,
) -> Result<Json<AddIdeaResponse>, ApiError> {
    let engine = state.engine.clone();
    let (new_id, similar) = task::spawn_blocking(move || engine.revise_item(&id, payload))
        .await
        .map_err(join_error)??;
    Ok(Json(AddIdeaResponse { id: new_id, similar }))
}

async fn get_idea(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let engine = state.engine.clone();
    let item = task::spawn_blocking(move || engine.get_item(&id)).await.map_err(join_error)??;
    Ok(Json(item))
}

async fn list_ideas(
    State(state): State<AppState>,
    Query(request): Query<ListRequest>,
) -> Result<Json<ListResponse>, ApiError> {
    let engine = state.engine.clone();
    let page =
        task::spawn_blocking(move || engine.list_items(&request)).await.map_err(join_error)??;
    Ok(Json(page))
}

async fn record_interaction(
    State(state): State<AppState>,
    Json(payload): Json<InteractRequest>,
) -> Result<Json<Item>, ApiError> {
    let engine = state.engine.clone();
    let item = task::spawn_blocking(move || {
        engine.record_interaction(&payload.user_id, &payload.item_id, payload.kind)?;
        engine.get_item(&payload.item_id)
    })
    .await
    .map_err(join_error)??;
    Ok(Json(item))
}

async fn statistics(State(state): State<AppState>) -> Result<Json<Statistics>, ApiError> {
    let engine = state.engine.clone();
    let stats = task::spawn_blocking(move || engine.statistics()).await.map_err(join_error)?;
    Ok(Json(stats))
}

async fn trending(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<Vec<TrendingItem>>, ApiError> {
    let engine = state.engine.clone();
    let items = task::spawn_blocking(move || engine.trending(query.window_days, query.limit))
        .await
        .map_err(join_error)?;
    Ok(Json(items))
}

async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let engine = state.engine.clone();
    let recs = task::spawn_blocking(move || engine.recommendations(&user_id, query.limit))
        .await
        .map_err(join_error)?;
    Ok(Json(recs))
}

async fn save_snapshot(State(state): State<AppState>) -> Result<Json<SnapshotReport>, ApiError> {
    let engine = state.engine.clone();
    let path = state.snapshot_path.clone();
    let report = task::spawn_blocking(move || {
        let items = engine.save_snapshot(&path)?;
        Ok::<_, Error>(SnapshotReport { items, path: path.display().to_string() })
    })
    .await
    .map_err(join_error)??;
    Ok(Json(report))
}

async fn load_snapshot(State(state): State<AppState>) -> Result<Json<SnapshotReport>, ApiError> {
    let engine = state.engine.clone();
    let path = state.snapshot_path.clone();
    let report = task::spawn_blocking(move || {
        let items = engine.load_snapshot(&path)?;
        Ok::<_, Error>(SnapshotReport { items, path: path.display().to_string() })
    })
    .await
    .map_err(join_error)??;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: String,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_code: String,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status, error_code: error_code.into(), message: message.into() }
    }
}

fn join_error(err: task::JoinError) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string())
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::UpstreamTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
            Error::EmbeddingUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "embedding_unavailable"),
            Error::CorruptIndexState(_) => (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_index"),
            Error::Io(_) | Error::Serde(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        ApiError::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error_code: self.error_code, message: self.message };
        (self.status, Json(body)).into_response()
    }
}
