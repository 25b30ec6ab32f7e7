//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use kakurega_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    infrastructure::dto::http::{HealthDto, StatsDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// Server counters (debugging aid)
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    let stats = state.get_stats_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(StatsDto {
        connections: stats.connections,
        waiting: stats.waiting,
        rooms: stats.rooms,
        members: stats.members,
        sessions: stats.sessions,
        started_at: timestamp_to_jst_rfc3339(state.started_at.value()),
    })
}
