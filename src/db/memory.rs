use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Game, GameChanges, LeaderboardChanges, LeaderboardEntry, NewGame, NewLeaderboardEntry,
};

/// Process-local store used when no database is configured, and by tests.
///
/// All tables sit behind one lock so that a cascading delete is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    /// Games keyed by id, each with its insertion sequence number
    games: HashMap<Uuid, (u64, Game)>,
    entries: BTreeMap<i64, LeaderboardEntry>,
    game_seq: u64,
    last_entry_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let tables = self.tables.read().await;
        let mut games: Vec<&(u64, Game)> = tables.games.values().collect();
        // Sequence breaks ties between identical timestamps
        games.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b_seq.cmp(a_seq))
        });
        Ok(games.into_iter().map(|(_, game)| game.clone()).collect())
    }

    async fn create_game(&self, game: NewGame) -> StoreResult<Game> {
        let mut tables = self.tables.write().await;
        let game = game.into_game(Uuid::new_v4(), Utc::now());
        tables.game_seq += 1;
        let seq = tables.game_seq;
        tables.games.insert(game.id, (seq, game.clone()));
        Ok(game)
    }

    async fn get_game(&self, id: Uuid) -> StoreResult<Option<Game>> {
        let tables = self.tables.read().await;
        Ok(tables.games.get(&id).map(|(_, game)| game.clone()))
    }

    async fn update_game(&self, id: Uuid, changes: GameChanges) -> StoreResult<Option<Game>> {
        let mut tables = self.tables.write().await;
        let Some((_, game)) = tables.games.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(game);
        Ok(Some(game.clone()))
    }

    async fn delete_game(&self, id: Uuid) -> StoreResult<Option<u64>> {
        let mut tables = self.tables.write().await;
        if tables.games.remove(&id).is_none() {
            return Ok(None);
        }
        let before = tables.entries.len();
        tables.entries.retain(|_, entry| entry.game_id != id);
        Ok(Some((before - tables.entries.len()) as u64))
    }

    async fn list_entries(&self) -> StoreResult<Vec<LeaderboardEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<LeaderboardEntry> = tables.entries.values().cloned().collect();
        // Stable sort keeps ascending id order among equal scores
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(entries)
    }

    async fn create_entry(&self, entry: NewLeaderboardEntry) -> StoreResult<LeaderboardEntry> {
        let mut tables = self.tables.write().await;
        if !tables.games.contains_key(&entry.game_id) {
            return Err(StoreError::MissingGame(entry.game_id));
        }
        tables.last_entry_id += 1;
        let entry = entry.into_entry(tables.last_entry_id, Utc::now());
        tables.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get_entry(&self, id: i64) -> StoreResult<Option<LeaderboardEntry>> {
        let tables = self.tables.read().await;
        Ok(tables.entries.get(&id).cloned())
    }

    async fn update_entry(
        &self,
        id: i64,
        changes: LeaderboardChanges,
    ) -> StoreResult<Option<LeaderboardEntry>> {
        let mut tables = self.tables.write().await;
        if !tables.entries.contains_key(&id) {
            return Ok(None);
        }
        if let Some(game_id) = changes.game_id {
            if !tables.games.contains_key(&game_id) {
                return Err(StoreError::MissingGame(game_id));
            }
        }
        let Some(entry) = tables.entries.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(entry);
        Ok(Some(entry.clone()))
    }

    async fn delete_entry(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.entries.remove(&id).is_some())
    }
}
