use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use filmsearch_core::record::parse_date;
use filmsearch_core::{GenerationStats, IndexStore, RawRecord, SearchHit, SearchRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: usize,
    /// Page size; the configured default when absent, capped at the configured maximum.
    pub rows: Option<usize>,
    pub duration_min: Option<i32>,
    pub duration_max: Option<i32>,
    pub revenue_min: Option<i64>,
    pub revenue_max: Option<i64>,
    pub vote_average_min: Option<f64>,
    pub release_date_start: Option<String>,
    pub release_date_end: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub page: usize,
    /// Page size actually applied.
    pub rows: usize,
    /// Capped at the server's result window.
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    pub suggestions: Vec<String>,
}

#[derive(Deserialize)]
pub struct AutocompleteParams {
    pub term: String,
    #[serde(default = "default_max")]
    pub max: usize,
}
fn default_max() -> usize { 10 }

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<IndexStore>,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

pub fn build_app(store: Arc<IndexStore>, admin_token: Option<String>) -> Router {
    let app_state = AppState { store, admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
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
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/autocomplete", get(autocomplete_handler))
        .route("/doc/:id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .route("/index/clear", post(clear_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn parse_date_param(name: &str, raw: Option<&str>) -> Result<Option<time::Date>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_date(s)
            .map(Some)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid {name}: {e}"))),
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let config = state.store.config();
    let rows = params.rows.unwrap_or(config.default_page_size).min(config.max_page_size);
    let req = SearchRequest {
        text: params.q.clone(),
        page: params.page,
        page_size: rows,
        runtime_min: params.duration_min,
        runtime_max: params.duration_max,
        revenue_min: params.revenue_min,
        revenue_max: params.revenue_max,
        vote_average_min: params.vote_average_min,
        release_date_start: parse_date_param("release_date_start", params.release_date_start.as_deref())?,
        release_date_end: parse_date_param("release_date_end", params.release_date_end.as_deref())?,
    };
    let results = state.store.search(&req);
    Ok(Json(SearchResponse {
        query: params.q.unwrap_or_default(),
        took_s: start.elapsed().as_secs_f64(),
        page: params.page,
        rows,
        total_hits: results.total_matches,
        results: results.documents,
        suggestions: results.suggestions,
    }))
}

pub async fn autocomplete_handler(State(state): State<AppState>, Query(params): Query<AutocompleteParams>) -> Json<Vec<String>> {
    Json(state.store.autocomplete(&params.term, params.max))
}

pub async fn doc_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let gen = state.store.current();
    match gen.lookup(&id) {
        Some(rec) => Ok(Json(serde_json::to_value(rec).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?)),
        None => Err((StatusCode::NOT_FOUND, "not found".into())),
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<GenerationStats> {
    Json(state.store.current().stats())
}

// --- Admin endpoints ---
async fn rebuild_handler(State(state): State<AppState>, headers: axum::http::HeaderMap, Json(records): Json<Vec<RawRecord>>) -> Result<Json<GenerationStats>, ApiError> {
    authorize(&state, &headers)?;
    let store = state.store.clone();
    let built = tokio::task::spawn_blocking(move || store.rebuild_raw(records))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    match built {
        Ok(gen) => Ok(Json(gen.stats())),
        Err(err) => Err((StatusCode::UNPROCESSABLE_ENTITY, err.to_string())),
    }
}

async fn clear_handler(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Result<Json<GenerationStats>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.store.clear().stats()))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
