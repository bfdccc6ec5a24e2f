//! Doubles standings
//!
//! A doubles pairing is played as a series of matches. Each team's record is
//! kept per opponent; a series is credited to whichever side won more of its
//! matches.

use crate::config::CompetitionSettings;
use crate::standings::{dense_ranks, WinLose};
use crate::types::{MatchRecord, PlayerName};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::warn;

/// team -> opponent -> match results of that team against that opponent
pub type SeriesTally = BTreeMap<PlayerName, BTreeMap<PlayerName, WinLose>>;

/// Rules that shape the doubles table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoublesRules {
    /// Series each team plays over the whole draw
    pub series_per_team: u32,
    /// Multiplier applied to negative point margins
    pub loss_margin_penalty: f64,
}

impl Default for DoublesRules {
    fn default() -> Self {
        Self {
            series_per_team: 7,
            loss_margin_penalty: 1.5,
        }
    }
}

impl From<&CompetitionSettings> for DoublesRules {
    fn from(settings: &CompetitionSettings) -> Self {
        Self {
            series_per_team: settings.series_per_team,
            loss_margin_penalty: settings.loss_margin_penalty,
        }
    }
}

/// One row of the doubles table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub name: PlayerName,
    pub series_win: u32,
    pub series_lose: u32,
    pub total_series_played: u32,
    pub total_match_played: u32,
    pub series_left: u32,
    pub points: f64,
    pub rank: u32,
}

/// Count individual match results per (team, opponent)
pub fn series_tally(matches: &[MatchRecord]) -> SeriesTally {
    let mut tally = SeriesTally::new();

    for record in matches {
        if record.home.player == record.away.player {
            warn!("Ignoring series match of '{}' against themselves", record.home.player);
            continue;
        }
        for (side, opponent) in record.sides() {
            tally
                .entry(side.player.clone())
                .or_default()
                .entry(opponent.player.clone())
                .or_default()
                .record(side.beats(opponent));
        }
    }

    tally
}

/// Weighted point differential per team; negative margins are multiplied by
/// the penalty. Matches with an unreadable score contribute nothing.
fn points(matches: &[MatchRecord], penalty: f64) -> BTreeMap<&str, f64> {
    let mut points: BTreeMap<&str, f64> = BTreeMap::new();

    for record in matches {
        for (side, opponent) in record.sides() {
            let (Some(own), Some(theirs)) = (side.score, opponent.score) else {
                continue;
            };
            let margin = f64::from(own) - f64::from(theirs);
            let weighted = if margin < 0.0 { margin * penalty } else { margin };
            *points.entry(side.player.as_str()).or_default() += weighted;
        }
    }

    points
}

/// Ranked doubles table
///
/// Ordered by series wins (desc), series losses (asc), matches played (desc),
/// then name. Teams level on the first three keys share a rank.
pub fn standings(matches: &[MatchRecord], rules: &DoublesRules) -> Vec<TeamStanding> {
    let tally = series_tally(matches);
    let points = points(matches, rules.loss_margin_penalty);

    let mut rows: Vec<TeamStanding> = tally
        .iter()
        .map(|(team, opponents)| {
            let mut series = WinLose::default();
            let mut total_match_played = 0;
            for record in opponents.values() {
                series.record(record.win > record.lose);
                total_match_played += record.played();
            }

            TeamStanding {
                name: team.clone(),
                series_win: series.win,
                series_lose: series.lose,
                total_series_played: series.played(),
                total_match_played,
                series_left: rules.series_per_team.saturating_sub(series.played()),
                points: points.get(team.as_str()).copied().unwrap_or_default(),
                rank: 0,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        (Reverse(a.series_win), a.series_lose, Reverse(a.total_match_played), &a.name).cmp(&(
            Reverse(b.series_win),
            b.series_lose,
            Reverse(b.total_match_played),
            &b.name,
        ))
    });

    let ranks = dense_ranks(&rows, |row| {
        (row.series_win, row.series_lose, row.total_match_played)
    });
    for (row, rank) in rows.iter_mut().zip(ranks) {
        row.rank = rank;
    }

    rows
}
