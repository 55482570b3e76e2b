//! HTTP boundary over [`MentorService`].

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mentor_core::{
    clean_records, parse_records, EvaluationResult, HealthStatus, MentorError, MentorService,
    RawRecord, RecordFormat, SimilarMatch, TrainSummary,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    service: Arc<MentorService>,
    store_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(service: MentorService, store_path: PathBuf) -> Self {
        Self {
            service: Arc::new(service),
            store_path: Arc::new(store_path),
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<MentorError> for ApiError {
    fn from(err: MentorError) -> Self {
        let status = match &err {
            MentorError::Validation(_) => StatusCode::BAD_REQUEST,
            MentorError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Embedding is CPU-bound; keep it off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> mentor_core::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: format!("worker failed: {e}"),
        })?
        .map_err(ApiError::from)
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    question: String,
    answer: String,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<SimilarMatch>,
}

#[derive(Debug, Serialize)]
struct TopicsResponse {
    topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TrainRequest {
    items: Vec<RawRecord>,
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.service.health())
}

async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluationResult>, ApiError> {
    let result = blocking(move || state.service.evaluate(&req.question, &req.answer)).await?;
    Ok(Json(result))
}

async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = blocking(move || state.service.search(&req.query, req.top_k)).await?;
    Ok(Json(SearchResponse { results }))
}

async fn topics(State(state): State<AppState>) -> Result<Json<TopicsResponse>, ApiError> {
    let topics = state.service.list_topics()?.into_iter().collect();
    Ok(Json(TopicsResponse { topics }))
}

async fn train(
    State(state): State<AppState>,
    Json(req): Json<TrainRequest>,
) -> Result<Json<TrainSummary>, ApiError> {
    let records = clean_records(req.items)?;
    let summary = blocking(move || state.service.train(records, &state.store_path)).await?;
    tracing::info!(items = summary.item_count, "trained from request body");
    Ok(Json(summary))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TrainSummary>, ApiError> {
    let multipart_error = |e: axum::extract::multipart::MultipartError| ApiError {
        status: e.status(),
        detail: e.body_text(),
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let format = RecordFormat::from_file_name(&file_name)?;
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let summary = blocking(move || {
            let records = parse_records(&bytes, format)?;
            state.service.train(records, &state.store_path)
        })
        .await?;
        tracing::info!(file = %file_name, items = summary.item_count, "trained from upload");
        return Ok(Json(summary));
    }

    Err(ApiError::bad_request("no file uploaded"))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/evaluate", post(evaluate))
        .route("/api/search", post(search))
        .route("/api/topics", get(topics))
        .route("/api/train", post(train))
        .route(
            "/api/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting mentor API on http://{addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
