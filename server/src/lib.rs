use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use ir_core::config::DEFAULT_CHAMPION_R;
use ir_core::corpus::CorpusDoc;
use ir_core::query::evaluate;
use ir_core::{DocId, Index};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct ChampionParams {
    #[serde(default = "default_r")]
    pub r: usize,
}
fn default_r() -> usize { DEFAULT_CHAMPION_R }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub url: String,
}

#[derive(Serialize)]
pub struct ChampionsResponse {
    pub term: String,
    pub stale: bool,
    pub champions: Vec<SearchHit>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl ToString) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.to_string() })))
}

/// Settings read from the environment at startup.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Required in `X-ADMIN-TOKEN` by the admin endpoints; they are disabled when unset.
    pub admin_token: Option<String>,
    /// Comma-separated allowed origins. Any origin when unset.
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

/// Readers (searches) share the lock; re-indexing and champion rebuilds
/// take it exclusively, so a query never sees a half-built index.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<RwLock<Index>>,
    pub admin_token: Option<String>,
}

pub fn build_app(index: Index, config: ServerConfig) -> Router {
    let app_state = AppState { index: Arc::new(RwLock::new(index)), admin_token: config.admin_token };

    let cors = match config.cors_allow_origin {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/champions/:term", get(champions_handler))
        .route("/index/batch", post(index_batch))
        .route("/index/champions", post(index_champions))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let index = state.index.read();
    let matches = evaluate(&index, &params.q).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let k = params.k.clamp(1, 1000);
    let results = matches
        .iter()
        .take(k)
        .filter_map(|&doc_id| index.vocabulary().get(doc_id).map(|url| SearchHit { doc_id, url: url.to_string() }))
        .collect();
    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits = matches.len(), "search");
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: matches.len(), results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let index = state.index.read();
    let url = index.vocabulary().get(doc_id).ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not found"))?;
    Ok(Json(serde_json::json!({
        "doc_id": doc_id,
        "url": url,
        "length": index.postings().get_document_length(doc_id).ok(),
    })))
}

pub async fn champions_handler(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<ChampionsResponse>, ApiError> {
    let index = state.index.read();
    let normalized = index.tokenizer().normalize_term(&term).unwrap_or_default();
    let list = index
        .postings()
        .champions(&normalized)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("no champion list for {term:?}")))?;
    let champions = list
        .iter()
        .filter_map(|&doc_id| index.vocabulary().get(doc_id).map(|url| SearchHit { doc_id, url: url.to_string() }))
        .collect();
    Ok(Json(ChampionsResponse { term: normalized, stale: index.postings().champions_stale(), champions }))
}

// --- Admin endpoints ---

/// Replace the indexed corpus with the posted documents.
async fn index_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(docs): Json<Vec<CorpusDoc>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let mut index = state.index.write();
    index.index_corpus(docs.iter().map(|d| (d.url.as_str(), d.text.as_str())));
    tracing::info!(docs = docs.len(), "corpus replaced");
    Ok(Json(serde_json::json!({
        "indexed": docs.len(),
        "num_docs": index.vocabulary().len(),
        "num_terms": index.postings().num_terms(),
        "champions_stale": index.postings().champions_stale(),
    })))
}

async fn index_champions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ChampionParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let mut index = state.index.write();
    index.update_champions(params.r);
    Ok(Json(serde_json::json!({ "r": params.r, "terms": index.postings().num_terms() })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(api_error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(api_error(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
