use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::value::RawValue;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppError,
    extract::RawJson,
    models::Game,
    payload::{self, GamePayload, WriteMode},
    AppState,
};

/// Unparseable ids cannot name a stored game, so they are reported as not found
fn parse_game_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("game"))
}

/// List every game, newest first
pub async fn list_games(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Game>>, AppError> {
    let games = state.store.list_games().await?;
    Ok(Json(games))
}

pub async fn create_game(
    State(state): State<Arc<AppState>>,
    RawJson(body): RawJson,
) -> Result<(StatusCode, Json<Game>), AppError> {
    let new_game = payload::from_body::<GamePayload>(body)?.into_new_game()?;

    let game = state.store.create_game(new_game).await?;
    tracing::info!("Created game: {} ({})", game, game.id);

    Ok((StatusCode::CREATED, Json(game)))
}

pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Game>, AppError> {
    let id = parse_game_id(&id)?;
    match state.store.get_game(id).await? {
        Some(game) => Ok(Json(game)),
        None => {
            tracing::debug!("Game {} not found", id);
            Err(AppError::NotFound("game"))
        }
    }
}

/// PUT: `grid` and `solutionWords` must both be supplied
pub async fn replace_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    RawJson(body): RawJson,
) -> Result<Json<Game>, AppError> {
    write_game(&state, &id, body, WriteMode::Full).await
}

/// PATCH: only the supplied fields are validated and written
pub async fn update_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    RawJson(body): RawJson,
) -> Result<Json<Game>, AppError> {
    write_game(&state, &id, body, WriteMode::Partial).await
}

async fn write_game(
    state: &AppState,
    id: &str,
    body: Box<RawValue>,
    mode: WriteMode,
) -> Result<Json<Game>, AppError> {
    let id = parse_game_id(id)?;
    let changes = payload::from_body::<GamePayload>(body)?.validate(mode)?;

    let game = state
        .store
        .update_game(id, changes)
        .await?
        .ok_or(AppError::NotFound("game"))?;
    tracing::info!("Updated game: {} ({})", game, game.id);

    Ok(Json(game))
}

/// Delete a game along with all of its leaderboard entries
pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_game_id(&id)?;
    let entries_removed = state
        .store
        .delete_game(id)
        .await?
        .ok_or(AppError::NotFound("game"))?;

    tracing::info!(
        "Deleted game {} and {} leaderboard entries",
        id,
        entries_removed
    );
    Ok(StatusCode::NO_CONTENT)
}
