//! Submitted score sheets

use crate::error::{Result, TrackerError};
use crate::scoreboard::{game_winner, MAX_TOTAL, RALLY_MARKER};
use crate::sheets::layout::parse_score;
use crate::types::{MatchRecord, PlayerName, SideScore};
use serde::{Deserialize, Serialize};

/// One side of a submitted score sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRow {
    pub player: PlayerName,
    pub total: u32,
    /// 1 for each rally this side won, 0 for each it lost; empty when the
    /// sheet only carries totals
    pub rallies: Vec<u8>,
}

impl CardRow {
    fn parse(row: &[String]) -> Result<Self> {
        let player = row
            .first()
            .map(|cell| cell.trim())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TrackerError::invalid_submission("row is missing a player name"))?;

        let total = parse_score(row.get(1)).ok_or_else(|| {
            TrackerError::invalid_submission(format!("'{player}' has no valid total"))
        })?;
        if total > MAX_TOTAL {
            return Err(TrackerError::invalid_submission(format!(
                "'{player}' total {total} is above {MAX_TOTAL}"
            ))
            .into());
        }

        let rally_cells = match row.get(2).map(|cell| cell.trim()) {
            Some(RALLY_MARKER) => &row[3..],
            Some(_) => {
                return Err(TrackerError::invalid_submission(format!(
                    "'{player}' row must separate the total from the rallies with '{RALLY_MARKER}'"
                ))
                .into())
            }
            None => &[][..],
        };

        let rallies = rally_cells
            .iter()
            .map(|cell| match cell.trim() {
                "1" => Ok(1),
                "0" => Ok(0),
                other => Err(TrackerError::invalid_submission(format!(
                    "'{player}' has rally value '{other}', expected 0 or 1"
                ))),
            })
            .collect::<std::result::Result<Vec<u8>, _>>()?;

        Ok(Self {
            player: player.to_string(),
            total,
            rallies,
        })
    }

    fn to_row(&self) -> Vec<String> {
        let mut row = vec![self.player.clone(), self.total.to_string()];
        if !self.rallies.is_empty() {
            row.push(RALLY_MARKER.to_string());
            row.extend(self.rallies.iter().map(u8::to_string));
        }
        row
    }
}

/// A two-row score sheet as submitted for one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub home: CardRow,
    pub away: CardRow,
}

impl ScoreCard {
    /// Parse exactly two rows of `[name, total, "-", rallies...]`
    pub fn from_rows(rows: &[Vec<String>]) -> Result<Self> {
        match rows {
            [home, away] => Ok(Self {
                home: CardRow::parse(home)?,
                away: CardRow::parse(away)?,
            }),
            _ => Err(TrackerError::invalid_submission(format!(
                "a match is two rows, got {}",
                rows.len()
            ))
            .into()),
        }
    }

    /// Check the sheet describes one finished game
    ///
    /// With `enforce_game_rules` off only the structural checks run.
    pub fn validate(&self, enforce_game_rules: bool) -> Result<()> {
        let reject = |reason: String| -> Result<()> {
            Err(TrackerError::invalid_submission(reason).into())
        };

        if self.home.player == self.away.player {
            return reject(format!("'{}' cannot play themselves", self.home.player));
        }

        let has_rallies = !self.home.rallies.is_empty() || !self.away.rallies.is_empty();
        if has_rallies {
            if self.home.rallies.len() != self.away.rallies.len() {
                return reject("both rows must list the same number of rallies".to_string());
            }
            if self
                .home
                .rallies
                .iter()
                .zip(&self.away.rallies)
                .any(|(home, away)| home + away != 1)
            {
                return reject("every rally must have exactly one winner".to_string());
            }
            for row in [&self.home, &self.away] {
                let won = row.rallies.iter().map(|r| u32::from(*r)).sum::<u32>();
                if won != row.total {
                    return reject(format!(
                        "'{}' total {} does not match {} rallies won",
                        row.player, row.total, won
                    ));
                }
            }
        }

        if !enforce_game_rules {
            return Ok(());
        }

        if game_winner(self.home.total, self.away.total).is_none() {
            return reject(format!(
                "{}-{} is not a finished game",
                self.home.total, self.away.total
            ));
        }

        // The game must end on its last rally
        if has_rallies {
            let (mut home, mut away) = (0, 0);
            let last = self.home.rallies.len() - 1;
            for (index, rally) in self.home.rallies.iter().enumerate() {
                if *rally == 1 {
                    home += 1;
                } else {
                    away += 1;
                }
                if index < last && game_winner(home, away).is_some() {
                    return reject(format!("rallies continue after the game ended at {home}-{away}"));
                }
            }
        }

        Ok(())
    }

    /// The match as it will be read back from the sheet
    pub fn to_record(&self) -> MatchRecord {
        MatchRecord::new(
            SideScore::new(self.home.player.clone(), Some(self.home.total)),
            SideScore::new(self.away.player.clone(), Some(self.away.total)),
        )
    }

    /// Rows in sheet layout
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        vec![self.home.to_row(), self.away.to_row()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoreboard::Scoreboard;
    use crate::types::Side;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    fn finished_board() -> Scoreboard {
        let mut board = Scoreboard::new();
        board.select("Ana vs Mia").unwrap();
        board.start().unwrap();
        for _ in 0..3 {
            board.point(Side::Away).unwrap();
        }
        for _ in 0..11 {
            board.point(Side::Home).unwrap();
        }
        board
    }

    #[test]
    fn test_scoreboard_sheet_is_a_valid_card() {
        let sheet = finished_board().score_sheet().unwrap();
        let card = ScoreCard::from_rows(&sheet).unwrap();

        assert_eq!(card.home.total, 11);
        assert_eq!(card.away.total, 3);
        assert_eq!(card.home.rallies.len(), 14);
        card.validate(true).unwrap();
        assert_eq!(card.to_rows(), sheet);
        assert_eq!(card.to_record().winner().unwrap().player, "Ana");
    }

    #[test]
    fn test_totals_only_card() {
        let card = ScoreCard::from_rows(&rows(&[&["Ana", "11"], &["Mia", "13"]])).unwrap();
        assert!(card.home.rallies.is_empty());
        card.validate(true).unwrap();
    }

    #[test]
    fn test_rejects_oversized_totals() {
        for total in ["4294967295", "1e20", "1000"] {
            let err = ScoreCard::from_rows(&rows(&[&["Ana", "11"], &["Mia", total]])).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<TrackerError>(),
                    Some(TrackerError::InvalidSubmission { .. })
                ),
                "{total}"
            );
        }

        let long_deuce = ScoreCard::from_rows(&rows(&[&["Ana", "999"], &["Mia", "997"]])).unwrap();
        long_deuce.validate(true).unwrap();
    }

    #[test]
    fn test_rejects_wrong_row_count() {
        assert!(ScoreCard::from_rows(&rows(&[&["Ana", "11"]])).is_err());
    }

    #[test]
    fn test_rejects_malformed_cells() {
        assert!(ScoreCard::from_rows(&rows(&[&["", "11"], &["Mia", "3"]])).is_err());
        assert!(ScoreCard::from_rows(&rows(&[&["Ana", "x"], &["Mia", "3"]])).is_err());
        assert!(ScoreCard::from_rows(&rows(&[&["Ana", "1", "+", "1"], &["Mia", "0", "-", "0"]])).is_err());
        assert!(ScoreCard::from_rows(&rows(&[&["Ana", "1", "-", "2"], &["Mia", "0", "-", "0"]])).is_err());
    }

    #[test]
    fn test_rejects_inconsistent_sheets() {
        let same_player = ScoreCard::from_rows(&rows(&[&["Ana", "11"], &["Ana", "3"]])).unwrap();
        assert!(same_player.validate(false).is_err());

        let wrong_total =
            ScoreCard::from_rows(&rows(&[&["Ana", "2", "-", "1", "0"], &["Mia", "1", "-", "0", "1"]]))
                .unwrap();
        assert!(wrong_total.validate(false).is_err());

        let not_mirrored =
            ScoreCard::from_rows(&rows(&[&["Ana", "1", "-", "1", "0"], &["Mia", "2", "-", "1", "1"]]))
                .unwrap();
        assert!(not_mirrored.validate(false).is_err());
    }

    #[test]
    fn test_game_rules_can_be_relaxed() {
        let unfinished = ScoreCard::from_rows(&rows(&[&["Ana", "7"], &["Mia", "5"]])).unwrap();
        assert!(unfinished.validate(true).is_err());
        unfinished.validate(false).unwrap();
    }

    #[test]
    fn test_rejects_rallies_after_game_end() {
        let mut home = vec!["Ana", "11", "-"];
        let mut away = vec!["Mia", "1", "-"];
        home.extend(std::iter::repeat("1").take(11));
        away.extend(std::iter::repeat("0").take(11));
        home.push("0");
        away.push("1");

        let card = ScoreCard::from_rows(&rows(&[home.as_slice(), away.as_slice()])).unwrap();
        assert!(card.validate(true).is_err());
    }
}
