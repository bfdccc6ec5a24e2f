//! Performance benchmarks for standings and remaining-pairing calculations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rally_ledger::ledger::MatchLedger;
use rally_ledger::config::{CompetitionSettings, SheetsBackend, SheetsSettings};
use rally_ledger::schedule::remaining;
use rally_ledger::sheets::InMemorySheets;
use rally_ledger::standings::{doubles, singles, DoublesRules};
use rally_ledger::types::{Draw, DrawSnapshot, MatchRecord, SideScore};
use std::sync::Arc;

fn roster(size: usize) -> Vec<String> {
    (0..size).map(|i| format!("player_{:02}", i)).collect()
}

/// Every pairing of the roster played `rounds` times with varying scores
fn played_matches(roster: &[String], rounds: usize) -> Vec<MatchRecord> {
    let mut matches = Vec::new();
    for round in 0..rounds {
        for (i, home) in roster.iter().enumerate() {
            for (j, away) in roster.iter().enumerate().skip(i + 1) {
                let home_score = 11;
                let away_score = ((i + j + round) % 10) as u32;
                let (home_score, away_score) = if (i + round) % 2 == 0 {
                    (home_score, away_score)
                } else {
                    (away_score, home_score)
                };
                matches.push(MatchRecord::new(
                    SideScore::new(home.clone(), Some(home_score)),
                    SideScore::new(away.clone(), Some(away_score)),
                ));
            }
        }
    }
    matches
}

fn bench_singles_standings(c: &mut Criterion) {
    let players = roster(32);
    let matches = played_matches(&players, 1);

    c.bench_function("singles_standings_32_players", |b| {
        b.iter(|| black_box(singles::standings(black_box(&matches))))
    });
}

fn bench_doubles_standings(c: &mut Criterion) {
    let teams = roster(16);
    let matches = played_matches(&teams, 3);
    let rules = DoublesRules::default();

    c.bench_function("doubles_standings_16_teams", |b| {
        b.iter(|| black_box(doubles::standings(black_box(&matches), &rules)))
    });
}

fn bench_remaining_pairings(c: &mut Criterion) {
    let players = roster(32);
    // Half of the draw has been played
    let matches: Vec<MatchRecord> = played_matches(&players, 1)
        .into_iter()
        .step_by(2)
        .collect();
    let snapshot = DrawSnapshot {
        draw: Draw::Single,
        roster: players,
        matches,
    };

    c.bench_function("remaining_pairings_32_players", |b| {
        b.iter(|| black_box(remaining(black_box(&snapshot), 3)))
    });
}

fn bench_ledger_standings(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let players = roster(24);
    let mut sheet_rows: Vec<Vec<String>> = vec![vec!["Player".to_string(), "Score".to_string()]];
    for record in played_matches(&players, 1) {
        sheet_rows.push(Vec::new());
        for side in [&record.home, &record.away] {
            sheet_rows.push(vec![
                side.player.clone(),
                side.score.unwrap_or_default().to_string(),
            ]);
        }
    }

    let sheets = InMemorySheets::new();
    let mut roster_rows = vec![vec!["Name".to_string()]];
    roster_rows.extend(players.iter().map(|name| vec![name.clone()]));
    sheets.set_rows("player", roster_rows).unwrap();
    sheets.set_rows("single", sheet_rows).unwrap();

    let ledger = MatchLedger::new(
        Arc::new(sheets),
        SheetsSettings {
            backend: SheetsBackend::Memory,
            ..SheetsSettings::default()
        },
        CompetitionSettings::default(),
    );

    c.bench_function("ledger_standings_24_players", |b| {
        b.iter(|| rt.block_on(async { black_box(ledger.standings(Draw::Single).await) }))
    });
}

criterion_group!(
    benches,
    bench_singles_standings,
    bench_doubles_standings,
    bench_remaining_pairings,
    bench_ledger_standings
);
criterion_main!(benches);
