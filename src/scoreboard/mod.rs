//! Live match scoring
//!
//! [`Scoreboard`] tracks one game point by point, from choosing the pairing
//! to uploading the finished score sheet. [`ScoreCard`] is the same sheet as
//! received by the server, parsed back and checked before it is stored.

pub mod board;
pub mod card;

pub use board::{Phase, Scoreboard};
pub use card::{CardRow, ScoreCard};

use crate::types::Side;

/// Points needed to win a game
pub const GAME_POINT: u32 = 11;

/// Lead needed to win a game
pub const WINNING_LEAD: u32 = 2;

/// Highest total a submitted side may carry
pub const MAX_TOTAL: u32 = 999;

/// Serves recorded before the server changes on every point
pub const ALTERNATE_SERVE_AFTER: usize = 21;

/// Marker cell between a side's total and its rally results
pub const RALLY_MARKER: &str = "-";

/// The side that has won a game at this score, if any
pub fn game_winner(home: u32, away: u32) -> Option<Side> {
    if home >= GAME_POINT && home.saturating_sub(away) >= WINNING_LEAD {
        Some(Side::Home)
    } else if away >= GAME_POINT && away.saturating_sub(home) >= WINNING_LEAD {
        Some(Side::Away)
    } else {
        None
    }
}
