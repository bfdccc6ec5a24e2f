use crate::standings::{series_tally, SeriesTally};
use crate::types::{DrawKind, DrawSnapshot, MatchRecord, PairingKey, PlayerName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Pairings still to be played, plus the series tally for doubles draws
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingMatches {
    pub remaining_matches: Vec<PairingKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SeriesTally>,
}

/// Every unordered pair of distinct roster names
pub fn all_pairings(roster: &[PlayerName]) -> BTreeSet<PairingKey> {
    let names: BTreeSet<&str> = roster.iter().map(String::as_str).collect();
    let names: Vec<&str> = names.into_iter().collect();

    let mut pairings = BTreeSet::new();
    for (i, first) in names.iter().enumerate() {
        for second in &names[i + 1..] {
            pairings.insert(PairingKey::new(first, second));
        }
    }
    pairings
}

/// Roster pairings without a recorded match, sorted ascending
pub fn remaining_singles(roster: &[PlayerName], matches: &[MatchRecord]) -> Vec<PairingKey> {
    let played: BTreeSet<PairingKey> = matches.iter().map(MatchRecord::pairing).collect();

    all_pairings(roster)
        .into_iter()
        .filter(|pairing| !played.contains(pairing))
        .collect()
}

/// Roster pairings whose series is undecided: neither team has won
/// `best_of / 2 + 1` matches against the other yet
pub fn remaining_series(
    roster: &[PlayerName],
    tally: &SeriesTally,
    best_of: u32,
) -> Vec<PairingKey> {
    let wins_needed = best_of / 2 + 1;
    let wins = |team: &str, opponent: &str| {
        tally
            .get(team)
            .and_then(|opponents| opponents.get(opponent))
            .map_or(0, |record| record.win)
    };

    all_pairings(roster)
        .into_iter()
        .filter(|pairing| {
            let (a, b) = pairing.players();
            wins(a, b) < wins_needed && wins(b, a) < wins_needed
        })
        .collect()
}

/// Remaining pairings for a draw, dispatching on its kind
pub fn remaining(snapshot: &DrawSnapshot, best_of: u32) -> RemainingMatches {
    let result = match snapshot.draw.kind() {
        DrawKind::Singles => RemainingMatches {
            remaining_matches: remaining_singles(&snapshot.roster, &snapshot.matches),
            data: None,
        },
        DrawKind::Doubles => {
            let tally = series_tally(&snapshot.matches);
            RemainingMatches {
                remaining_matches: remaining_series(&snapshot.roster, &tally, best_of),
                data: Some(tally),
            }
        }
    };

    debug!(
        "Draw {} has {} remaining pairings out of {} roster names",
        snapshot.draw,
        result.remaining_matches.len(),
        snapshot.roster.len()
    );

    result
}
