pub mod document;
pub mod game;
pub mod leaderboard;

pub use document::Document;
pub use game::{Game, GameChanges, NewGame};
pub use leaderboard::{LeaderboardChanges, LeaderboardEntry, NewLeaderboardEntry};
