//! Common types used throughout the match tracker

use crate::error::TrackerError;
use crate::utils::split_pairing_label;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Players (and doubles teams) are identified by the name in their sheet cell
pub type PlayerName = String;

/// Separator used between the two names of a pairing
pub const PAIRING_SEPARATOR: &str = " vs ";

/// Canonical identifier of an unordered match between two players
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairingKey(String);

impl PairingKey {
    /// Build the key for two players, independent of argument order
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{first}{PAIRING_SEPARATOR}{second}"))
    }

    /// Split the key back into its two (sorted) player names
    pub fn players(&self) -> (&str, &str) {
        self.0
            .split_once(PAIRING_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PairingKey {
    type Err = TrackerError;

    /// Parse a `"A vs B"` label as shown in the match dropdown
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = split_pairing_label(s).ok_or_else(|| TrackerError::Scoreboard {
            reason: format!("'{s}' is not a pairing of two players"),
        })?;
        Ok(Self::new(a, b))
    }
}

/// One side of a played match as read from a sheet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideScore {
    pub player: PlayerName,
    /// `None` when the score cell is missing or not a number
    pub score: Option<u32>,
}

impl SideScore {
    pub fn new(player: impl Into<PlayerName>, score: Option<u32>) -> Self {
        Self {
            player: player.into(),
            score,
        }
    }

    /// Whether this side strictly out-scored `other`
    pub fn beats(&self, other: &SideScore) -> bool {
        matches!((self.score, other.score), (Some(own), Some(theirs)) if own > theirs)
    }
}

/// A played match: two consecutive sheet rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home: SideScore,
    pub away: SideScore,
}

impl MatchRecord {
    pub fn new(home: SideScore, away: SideScore) -> Self {
        Self { home, away }
    }

    pub fn pairing(&self) -> PairingKey {
        PairingKey::new(&self.home.player, &self.away.player)
    }

    /// The winning side; ties and unreadable scores have no winner
    pub fn winner(&self) -> Option<&SideScore> {
        if self.home.beats(&self.away) {
            Some(&self.home)
        } else if self.away.beats(&self.home) {
            Some(&self.away)
        } else {
            None
        }
    }

    /// Both sides as `(side, opponent)` tuples
    pub fn sides(&self) -> [(&SideScore, &SideScore); 2] {
        [(&self.home, &self.away), (&self.away, &self.home)]
    }
}

/// Whether a draw is played one game per pairing or as a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawKind {
    Singles,
    Doubles,
}

/// Competition stage a request addresses
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Draw {
    #[default]
    Single,
    SingleQuarterfinal,
    SingleSemifinal,
    SingleFinal,
    Double,
    DoubleSemifinal,
    DoubleFinal,
}

impl Draw {
    pub const ALL: [Draw; 7] = [
        Draw::Single,
        Draw::SingleQuarterfinal,
        Draw::SingleSemifinal,
        Draw::SingleFinal,
        Draw::Double,
        Draw::DoubleSemifinal,
        Draw::DoubleFinal,
    ];

    pub fn kind(self) -> DrawKind {
        match self {
            Draw::Single | Draw::SingleQuarterfinal | Draw::SingleSemifinal | Draw::SingleFinal => {
                DrawKind::Singles
            }
            Draw::Double | Draw::DoubleSemifinal | Draw::DoubleFinal => DrawKind::Doubles,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Draw::Single => "single",
            Draw::SingleQuarterfinal => "single-quarterfinal",
            Draw::SingleSemifinal => "single-semifinal",
            Draw::SingleFinal => "single-final",
            Draw::Double => "double",
            Draw::DoubleSemifinal => "double-semifinal",
            Draw::DoubleFinal => "double-final",
        }
    }

    /// Default `(roster sheet, match sheet)` names
    pub fn default_sheets(self) -> (&'static str, &'static str) {
        match self {
            Draw::Single => ("player", "single"),
            Draw::SingleQuarterfinal => ("single_quarter_player", "single_quarter_match"),
            Draw::SingleSemifinal => ("single_semi_player", "single_semi_match"),
            Draw::SingleFinal => ("single_final_player", "single_final_match"),
            Draw::Double => ("double_player", "double_match"),
            Draw::DoubleSemifinal => ("double_semi_player", "double_semi_match"),
            Draw::DoubleFinal => ("double_final_player", "double_final_match"),
        }
    }
}

impl fmt::Display for Draw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Draw {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Draw::ALL
            .into_iter()
            .find(|draw| draw.as_str() == s)
            .ok_or_else(|| TrackerError::UnknownDraw { name: s.to_string() })
    }
}

/// Roster and played matches of one draw, read in a single batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawSnapshot {
    pub draw: Draw,
    pub roster: Vec<PlayerName>,
    pub matches: Vec<MatchRecord>,
}

/// Which side of the table a point or action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}
