use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Document;

/// A stored puzzle: a grid and the words considered correct for it.
///
/// `grid` and `solution_words` are opaque JSON documents; their shape is
/// never inspected. They are read back from the database as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Uuid,
    pub name: Option<String>,
    #[sqlx(try_from = "String")]
    pub grid: Document,
    #[sqlx(try_from = "String")]
    pub solution_words: Document,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "Game {}", self.id),
        }
    }
}

/// Validated input for a new game
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub name: Option<String>,
    pub grid: Document,
    pub solution_words: Document,
}

impl NewGame {
    pub fn into_game(self, id: Uuid, created_at: DateTime<Utc>) -> Game {
        Game {
            id,
            name: self.name,
            grid: self.grid,
            solution_words: self.solution_words,
            created_at,
        }
    }
}

/// Validated field changes for an existing game.
/// `None` leaves the field untouched; `name: Some(None)` clears the name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameChanges {
    pub name: Option<Option<String>>,
    pub grid: Option<Document>,
    pub solution_words: Option<Document>,
}

impl GameChanges {
    pub fn apply(self, game: &mut Game) {
        if let Some(name) = self.name {
            game.name = name;
        }
        if let Some(grid) = self.grid {
            game.grid = grid;
        }
        if let Some(solution_words) = self.solution_words {
            game.solution_words = solution_words;
        }
    }
}
