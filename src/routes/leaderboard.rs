use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::value::RawValue;
use std::sync::Arc;

use crate::{
    error::AppError,
    extract::RawJson,
    models::LeaderboardEntry,
    payload::{self, LeaderboardPayload, WriteMode},
    AppState,
};

fn parse_entry_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::NotFound("leaderboard entry"))
}

/// List entries across all games, highest score first
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let entries = state.store.list_entries().await?;
    Ok(Json(entries))
}

pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    RawJson(body): RawJson,
) -> Result<(StatusCode, Json<LeaderboardEntry>), AppError> {
    let new_entry = payload::from_body::<LeaderboardPayload>(body)?.into_new_entry()?;

    let entry = state.store.create_entry(new_entry).await?;
    tracing::info!(
        "Recorded score {} for game {} (entry {})",
        entry,
        entry.game_id,
        entry.id
    );

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LeaderboardEntry>, AppError> {
    let id = parse_entry_id(&id)?;
    match state.store.get_entry(id).await? {
        Some(entry) => Ok(Json(entry)),
        None => {
            tracing::debug!("Leaderboard entry {} not found", id);
            Err(AppError::NotFound("leaderboard entry"))
        }
    }
}

pub async fn replace_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    RawJson(body): RawJson,
) -> Result<Json<LeaderboardEntry>, AppError> {
    write_entry(&state, &id, body, WriteMode::Full).await
}

pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    RawJson(body): RawJson,
) -> Result<Json<LeaderboardEntry>, AppError> {
    write_entry(&state, &id, body, WriteMode::Partial).await
}

async fn write_entry(
    state: &AppState,
    id: &str,
    body: Box<RawValue>,
    mode: WriteMode,
) -> Result<Json<LeaderboardEntry>, AppError> {
    let id = parse_entry_id(id)?;
    let changes = payload::from_body::<LeaderboardPayload>(body)?.validate(mode)?;

    let entry = state
        .store
        .update_entry(id, changes)
        .await?
        .ok_or(AppError::NotFound("leaderboard entry"))?;
    tracing::info!("Updated leaderboard entry {}: {}", entry.id, entry);

    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_entry_id(&id)?;
    if !state.store.delete_entry(id).await? {
        return Err(AppError::NotFound("leaderboard entry"));
    }

    tracing::info!("Deleted leaderboard entry {}", id);
    Ok(StatusCode::NO_CONTENT)
}
