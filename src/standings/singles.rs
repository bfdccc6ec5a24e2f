//! Singles standings

use crate::standings::{dense_ranks, WinLose};
use crate::types::{MatchRecord, PlayerName};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::warn;

/// One row of the singles table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub name: PlayerName,
    pub win: u32,
    pub lose: u32,
    pub rank: u32,
    pub total_played: u32,
    pub match_left: u32,
}

/// Win/lose per player. A side that does not strictly out-score its
/// opponent is charged a loss, so a tied or unreadable match is a loss for both.
pub fn tally(matches: &[MatchRecord]) -> BTreeMap<PlayerName, WinLose> {
    let mut tally: BTreeMap<PlayerName, WinLose> = BTreeMap::new();

    for record in matches {
        if record.home.player == record.away.player {
            warn!("Ignoring match of '{}' against themselves", record.home.player);
            continue;
        }
        for (side, opponent) in record.sides() {
            tally
                .entry(side.player.clone())
                .or_default()
                .record(side.beats(opponent));
        }
    }

    tally
}

/// Ranked singles table
///
/// Ordered by wins (desc), then losses (asc), then name. Players level on
/// wins and losses share a rank.
pub fn standings(matches: &[MatchRecord]) -> Vec<PlayerStanding> {
    let tally = tally(matches);
    let participants = tally.len() as u32;

    let mut rows: Vec<PlayerStanding> = tally
        .into_iter()
        .map(|(name, record)| PlayerStanding {
            name,
            win: record.win,
            lose: record.lose,
            rank: 0,
            total_played: record.played(),
            match_left: participants.saturating_sub(record.played() + 1),
        })
        .collect();

    rows.sort_by(|a, b| {
        (Reverse(a.win), a.lose, &a.name).cmp(&(Reverse(b.win), b.lose, &b.name))
    });

    let ranks = dense_ranks(&rows, |row| (row.win, row.lose));
    for (row, rank) in rows.iter_mut().zip(ranks) {
        row.rank = rank;
    }

    rows
}
