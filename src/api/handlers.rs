//! API Handlers
//!
//! HTTP request handlers for each registry endpoint. Every record access
//! goes through the cache-aside orchestrator.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::validation::{parse_phone, validate_phone, ErrorCode};
use crate::aside::CacheAsideOrchestrator;
use crate::bus::BroadcastBus;
use crate::cache::MemoryCacheStore;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{HealthResponse, Page, PageQuery, Phone, StatsResponse};
use crate::store::InMemoryRecordStore;
use crate::tasks::{spawn_retry_task, RetryPolicy, RetryQueue};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside front of the record store
    pub registry: Arc<CacheAsideOrchestrator>,
    /// Upper bound for a whole request
    pub request_timeout: Duration,
}

impl AppState {
    /// Creates a new AppState around an orchestrator.
    pub fn new(registry: CacheAsideOrchestrator, request_timeout: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            request_timeout,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Wires the in-memory store, cache and bus, and spawns the invalidation
    /// retry task. Must be called inside a tokio runtime; the returned handle
    /// should be aborted on shutdown.
    pub fn from_config(config: &Config) -> (Self, JoinHandle<()>) {
        let orchestrator = CacheAsideOrchestrator::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(MemoryCacheStore::new(config.version_fencing)),
            Arc::new(BroadcastBus::new(config.invalidation_channel.clone())),
            config,
        );

        let (queue, receiver) = RetryQueue::channel(orchestrator.stats_recorder());
        let retry_handle = spawn_retry_task(
            orchestrator.invalidator(),
            receiver,
            RetryPolicy::from_config(config),
        );

        let state = Self::new(orchestrator.with_retry_queue(queue), config.request_timeout());
        (state, retry_handle)
    }
}

/// Handler for GET /telefonos
///
/// Lists phones page by page.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Phone>>> {
    let (page, size) = query.resolve();
    Ok(Json(state.registry.list(page, size).await?))
}

/// Handler for GET /telefonos/:id
pub async fn get_by_id_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Phone>> {
    state
        .registry
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(ErrorCode::PhoneNotFound))
}

/// Handler for GET /telefonos/imei/:imei
///
/// Served from the cache when possible.
pub async fn get_by_imei_handler(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<Json<Phone>> {
    state
        .registry
        .get_by_secondary_key(&imei)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(ErrorCode::PhoneNotFound))
}

/// Handler for POST /telefonos
///
/// Always creates a new record; an `id` in the body is ignored.
pub async fn create_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Phone>)> {
    let Json(body) = body.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    let mut phone = parse_phone(body)?;
    phone.id = None;

    validate_phone(&state.registry, &phone).await?;
    let saved = state.registry.save(phone).await?;

    info!(id = ?saved.id, imei = ?saved.imei, "phone created");
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Handler for PUT /telefonos/:id
///
/// Replaces an existing record.
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Phone>> {
    let Json(body) = body.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    if state.registry.find_by_id(&id).await?.is_none() {
        return Err(ApiError::NotFound(ErrorCode::PhoneNotFound));
    }

    let mut phone = parse_phone(body)?;
    phone.id = Some(id);

    validate_phone(&state.registry, &phone).await?;
    let saved = state.registry.save(phone).await?;

    info!(id = ?saved.id, imei = ?saved.imei, "phone updated");
    Ok(Json(saved))
}

/// Handler for DELETE /telefonos/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.registry.find_by_id(&id).await?.is_none() {
        return Err(ApiError::NotFound(ErrorCode::PhoneNotFound));
    }
    state.registry.delete(&id).await?;

    info!(id = %id, "phone deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /stats
///
/// Returns cache-aside counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.registry.stats();
    let cached_entries = state.registry.cached_entries().await;
    Json(StatsResponse::new(&stats, cached_entries))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
