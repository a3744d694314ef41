//! Record storage: the `Store` trait and its PostgreSQL and in-memory backends.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Game, GameChanges, LeaderboardChanges, LeaderboardEntry, NewGame, NewLeaderboardEntry,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("game {0} does not exist")]
    MissingGame(Uuid),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence operations for games and their leaderboard entries.
///
/// Every method is a single atomic operation against the backing store.
#[async_trait]
pub trait Store: Send + Sync {
    /// All games, newest first
    async fn list_games(&self) -> StoreResult<Vec<Game>>;

    async fn create_game(&self, game: NewGame) -> StoreResult<Game>;

    async fn get_game(&self, id: Uuid) -> StoreResult<Option<Game>>;

    /// Returns `None` when no game has this id
    async fn update_game(&self, id: Uuid, changes: GameChanges) -> StoreResult<Option<Game>>;

    /// Deletes the game together with every entry that references it.
    /// Returns the number of entries removed, or `None` when no game has this id.
    async fn delete_game(&self, id: Uuid) -> StoreResult<Option<u64>>;

    /// All entries across all games, highest score first
    async fn list_entries(&self) -> StoreResult<Vec<LeaderboardEntry>>;

    /// Fails with [`StoreError::MissingGame`] if the referenced game does not exist
    async fn create_entry(&self, entry: NewLeaderboardEntry) -> StoreResult<LeaderboardEntry>;

    async fn get_entry(&self, id: i64) -> StoreResult<Option<LeaderboardEntry>>;

    async fn update_entry(
        &self,
        id: i64,
        changes: LeaderboardChanges,
    ) -> StoreResult<Option<LeaderboardEntry>>;

    /// Returns `false` when no entry has this id
    async fn delete_entry(&self, id: i64) -> StoreResult<bool>;
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
