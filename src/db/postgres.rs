use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Game, GameChanges, LeaderboardChanges, LeaderboardEntry, NewGame, NewLeaderboardEntry,
};

/// Game columns as selected. Documents are `JSON` columns read back as text,
/// which Postgres returns exactly as it was written.
macro_rules! game_columns {
    () => {
        "id, name, grid::TEXT AS grid, solution_words::TEXT AS solution_words, created_at"
    };
}

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Foreign key violations on `leaderboard.game_id` mean the game vanished
/// between validation and write.
fn map_entry_write_error(err: sqlx::Error, game_id: Uuid) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::MissingGame(game_id)
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for PgStore {
    // Game queries
    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        // `seq` orders games created within the same timestamp
        let games = sqlx::query_as::<_, Game>(concat!(
            "SELECT ",
            game_columns!(),
            " FROM games ORDER BY created_at DESC, seq DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(games)
    }

    async fn create_game(&self, game: NewGame) -> StoreResult<Game> {
        let game = sqlx::query_as::<_, Game>(concat!(
            r#"
            INSERT INTO games (id, name, grid, solution_words)
            VALUES ($1, $2, $3::JSON, $4::JSON)
            RETURNING "#,
            game_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(game.name.as_deref())
        .bind(game.grid.as_str())
        .bind(game.solution_words.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(game)
    }

    async fn get_game(&self, id: Uuid) -> StoreResult<Option<Game>> {
        let game = sqlx::query_as::<_, Game>(concat!(
            "SELECT ",
            game_columns!(),
            " FROM games WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(game)
    }

    async fn update_game(&self, id: Uuid, changes: GameChanges) -> StoreResult<Option<Game>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut game) = sqlx::query_as::<_, Game>(concat!(
            "SELECT ",
            game_columns!(),
            " FROM games WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        changes.apply(&mut game);

        let game = sqlx::query_as::<_, Game>(concat!(
            r#"
            UPDATE games
            SET name = $2,
                grid = $3::JSON,
                solution_words = $4::JSON
            WHERE id = $1
            RETURNING "#,
            game_columns!()
        ))
        .bind(id)
        .bind(game.name.as_deref())
        .bind(game.grid.as_str())
        .bind(game.solution_words.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(game))
    }

    async fn delete_game(&self, id: Uuid) -> StoreResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let entries_removed = sqlx::query("DELETE FROM leaderboard WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let games_removed = sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if games_removed == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(entries_removed))
    }

    // Leaderboard queries
    async fn list_entries(&self) -> StoreResult<Vec<LeaderboardEntry>> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT * FROM leaderboard ORDER BY score DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn create_entry(&self, entry: NewLeaderboardEntry) -> StoreResult<LeaderboardEntry> {
        let game_id = entry.game_id;

        // Existence check and insert in one statement
        let created = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            INSERT INTO leaderboard (player_name, score, game_id)
            SELECT $1::VARCHAR, $2::INTEGER, $3::UUID
            WHERE EXISTS (SELECT 1 FROM games WHERE id = $3)
            RETURNING *
            "#,
        )
        .bind(&entry.player_name)
        .bind(entry.score)
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_entry_write_error(e, game_id))?;

        created.ok_or(StoreError::MissingGame(game_id))
    }

    async fn get_entry(&self, id: i64) -> StoreResult<Option<LeaderboardEntry>> {
        let entry = sqlx::query_as::<_, LeaderboardEntry>("SELECT * FROM leaderboard WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    async fn update_entry(
        &self,
        id: i64,
        changes: LeaderboardChanges,
    ) -> StoreResult<Option<LeaderboardEntry>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut entry) = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT * FROM leaderboard WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        changes.apply(&mut entry);
        let game_id = entry.game_id;

        let entry = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            UPDATE leaderboard
            SET player_name = $2,
                score = $3,
                game_id = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&entry.player_name)
        .bind(entry.score)
        .bind(game_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_entry_write_error(e, game_id))?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn delete_entry(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM leaderboard WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
