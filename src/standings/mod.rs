//! Standings calculation
//!
//! Singles standings tally wins and losses per player; doubles standings tally
//! series per team. Both are derived from the match sheet on every request.

pub mod doubles;
pub mod singles;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use doubles::{series_tally, DoublesRules, SeriesTally, TeamStanding};
pub use singles::PlayerStanding;

/// Win/lose counter pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLose {
    pub win: u32,
    pub lose: u32,
}

impl WinLose {
    /// Count one result
    pub fn record(&mut self, won: bool) {
        if won {
            self.win += 1;
        } else {
            self.lose += 1;
        }
    }

    pub fn played(&self) -> u32 {
        self.win + self.lose
    }
}

/// Dense 1-based ranks for already sorted rows; rows with equal keys share a rank
pub(crate) fn dense_ranks<T, K, F>(rows: &[T], key: F) -> Vec<u32>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut ranks = Vec::with_capacity(rows.len());
    let mut previous: Option<K> = None;
    let mut rank = 0;

    for row in rows {
        let current = key(row);
        if previous.as_ref() != Some(&current) {
            rank += 1;
        }
        ranks.push(rank);
        previous = Some(current);
    }

    ranks
}
