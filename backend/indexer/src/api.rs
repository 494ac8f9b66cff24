//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::campaigns::{self, CampaignSummary};
use crate::db;
use crate::errors::IndexerError;
use crate::events::EventRecord;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

/// Build the REST router. Layers are added by the caller.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/campaigns", get(get_campaigns))
        .route("/campaigns/:id", get(get_campaign))
        .route("/campaigns/:id/events", get(get_campaign_events))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub campaign_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct CampaignsResponse {
    pub now: i64,
    pub count: usize,
    pub campaigns: Vec<CampaignSummary>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Optional `?at=<unix seconds>` override for phase evaluation.
#[derive(Debug, Default, Deserialize)]
pub struct AtQuery {
    pub at: Option<i64>,
}

impl AtQuery {
    fn now(&self) -> i64 {
        self.at.unwrap_or_else(|| chrono::Utc::now().timestamp())
    }
}

impl IntoResponse for IndexerError {
    fn into_response(self) -> Response {
        let status = match self {
            IndexerError::CampaignNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
///
/// Returns all indexed events across all campaigns.
pub async fn get_all_events(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<AllEventsResponse>, IndexerError> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(AllEventsResponse {
        count: events.len(),
        events,
    }))
}

/// `GET /campaigns`
///
/// Every campaign seen so far, with totals and its phase at `?at=` (default: now).
pub async fn get_campaigns(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<AtQuery>,
) -> Result<Json<CampaignsResponse>, IndexerError> {
    let now = query.now();
    let events = db::get_all_events(&state.pool).await?;
    let campaigns = campaigns::summarize(&events, now);
    Ok(Json(CampaignsResponse {
        now,
        count: campaigns.len(),
        campaigns,
    }))
}

/// `GET /campaigns/:id`
pub async fn get_campaign(
    State(state): State<Arc<ApiState>>,
    Path(campaign_id): Path<String>,
    Query(query): Query<AtQuery>,
) -> Result<Json<CampaignSummary>, IndexerError> {
    let events = db::get_events_for_campaign(&state.pool, &campaign_id).await?;
    campaigns::summarize_one(&events, &campaign_id, query.now())
        .map(Json)
        .ok_or(IndexerError::CampaignNotFound(campaign_id))
}

/// `GET /campaigns/:id/events`
///
/// Returns all indexed events for the given campaign identifier.
pub async fn get_campaign_events(
    State(state): State<Arc<ApiState>>,
    Path(campaign_id): Path<String>,
) -> Result<Json<EventsResponse>, IndexerError> {
    let events = db::get_events_for_campaign(&state.pool, &campaign_id).await?;
    Ok(Json(EventsResponse {
        campaign_id,
        count: events.len(),
        events,
    }))
}
