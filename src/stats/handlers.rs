use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    codec::{StoredRecord, StoredSnapshot},
    CompletedGame, RecordOutcome, Scope,
};
use crate::shared::{AppError, AppState};

/// Statistics routes, mounted at the application root
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_snapshot).delete(reset_statistics))
        .route("/stats/:scope", get(get_scope))
        .route("/stats/:scope/:player_index", get(get_player_record))
        .route("/games", post(record_game))
}

/// GET /stats
#[instrument(name = "get_snapshot", skip(state))]
pub async fn get_snapshot(State(state): State<AppState>) -> Json<StoredSnapshot> {
    let snapshot = state.stats_service.load_snapshot().await;
    Json(StoredSnapshot::from(&snapshot))
}

fn parse_scope(raw: &str) -> Result<Scope, AppError> {
    Ok(raw.parse::<Scope>()?)
}

/// GET /stats/:scope
#[instrument(name = "get_scope", skip(state))]
pub async fn get_scope(
    State(state): State<AppState>,
    Path(scope): Path<String>,
) -> Result<Json<Vec<StoredRecord>>, AppError> {
    let scope = parse_scope(&scope)?;
    let records = state.stats_service.scope_records(scope).await;
    Ok(Json(records.iter().map(StoredRecord::from).collect()))
}

/// GET /stats/:scope/:player_index
#[instrument(name = "get_player_record", skip(state))]
pub async fn get_player_record(
    State(state): State<AppState>,
    Path((scope, player_index)): Path<(String, usize)>,
) -> Result<Json<StoredRecord>, AppError> {
    let scope = parse_scope(&scope)?;
    let record = state
        .stats_service
        .player_record(scope, player_index)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No slot {player_index} in scope {scope}")))?;
    Ok(Json(StoredRecord::from(&record)))
}

/// POST /games
///
/// Always answers 200; the body says whether the game was recorded.
#[instrument(name = "record_game", skip(state, game))]
pub async fn record_game(
    State(state): State<AppState>,
    Json(game): Json<CompletedGame>,
) -> Json<RecordOutcome> {
    let outcome = state.stats_service.record_completed_game(&game).await;
    info!(?outcome, "Completed game processed");
    Json(outcome)
}

/// DELETE /stats
#[instrument(name = "reset_statistics", skip(state))]
pub async fn reset_statistics(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.stats_service.reset_statistics().await?;
    Ok(StatusCode::NO_CONTENT)
}
