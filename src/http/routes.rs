//! HTTP route definitions

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::app::AppState;
use crate::store::client::{LeaderboardResponse, SubmittedScore};
use crate::store::{NewEntry, StoreError};
use crate::util::time::uptime_secs;
use crate::ws::ws_handler;

/// Body returned for any submission that lacks a field
const MISSING_VALUE: &str = "Missing or invalid value";

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route(
            "/api/leaderboard",
            get(leaderboard_handler).post(submit_score_handler),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_sessions: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_sessions: state.sessions.active_sessions(),
    })
}

// ============================================================================
// Leaderboard endpoints
// ============================================================================

async fn leaderboard_handler(State(state): State<AppState>) -> Json<LeaderboardResponse> {
    Json(LeaderboardResponse {
        leaderboard: state.leaderboard.list(),
    })
}

/// Every field is optional on the wire so a missing one maps to 400
#[derive(Debug, Deserialize)]
struct ScoreRequest {
    username: Option<String>,
    difficulty: Option<String>,
    wave: Option<u32>,
    enemies_defeated: Option<u32>,
    #[serde(rename = "turretType")]
    turret_type: Option<String>,
    date_time: Option<String>,
}

impl ScoreRequest {
    fn into_entry(self) -> Option<NewEntry> {
        Some(NewEntry {
            username: self.username?,
            difficulty: self.difficulty?,
            wave: self.wave?,
            enemies_defeated: self.enemies_defeated?,
            turret: self.turret_type?,
            date_time: self.date_time?,
        })
    }
}

async fn submit_score_handler(
    State(state): State<AppState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmittedScore>), AppError> {
    if state.submission_limiter.check().is_err() {
        warn!("Leaderboard submission rate limited");
        return Err(AppError::RateLimited);
    }

    let Json(request) = payload.map_err(|e| {
        warn!(error = %e, "Rejected leaderboard body");
        AppError::BadRequest(MISSING_VALUE.to_string())
    })?;
    let entry = request
        .into_entry()
        .ok_or_else(|| AppError::BadRequest(MISSING_VALUE.to_string()))?;

    let stored = state.leaderboard.insert(entry).await?;
    info!(
        id = stored.id,
        username = %stored.username,
        wave = stored.wave,
        enemies_defeated = stored.enemies_defeated,
        "Leaderboard entry added"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmittedScore {
            id: stored.id,
            username: stored.username,
            wave: stored.wave,
            enemies_defeated: stored.enemies_defeated,
            date_time: stored.date_time,
        }),
    ))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
