use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One player's recorded score against one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: i64,
    pub player_name: String,
    pub score: i32,
    /// Identifier of the owning game, sent on the wire as `game`
    #[serde(rename = "game")]
    pub game_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.player_name, self.score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaderboardEntry {
    pub player_name: String,
    pub score: i32,
    pub game_id: Uuid,
}

impl NewLeaderboardEntry {
    pub fn into_entry(self, id: i64, created_at: DateTime<Utc>) -> LeaderboardEntry {
        LeaderboardEntry {
            id,
            player_name: self.player_name,
            score: self.score,
            game_id: self.game_id,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardChanges {
    pub player_name: Option<String>,
    pub score: Option<i32>,
    pub game_id: Option<Uuid>,
}

impl LeaderboardChanges {
    pub fn apply(self, entry: &mut LeaderboardEntry) {
        if let Some(player_name) = self.player_name {
            entry.player_name = player_name;
        }
        if let Some(score) = self.score {
            entry.score = score;
        }
        if let Some(game_id) = self.game_id {
            entry.game_id = game_id;
        }
    }
}
