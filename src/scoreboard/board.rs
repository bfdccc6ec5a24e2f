//! Scoreboard state machine

use crate::error::{Result, TrackerError};
use crate::scoreboard::{game_winner, ALTERNATE_SERVE_AFTER, RALLY_MARKER};
use crate::sheets::ValueGrid;
use crate::types::{PlayerName, Side};
use crate::utils::{current_timestamp, split_pairing_label};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Possible phases of a scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for a pairing to be chosen and the game to start
    Idle,
    /// Points are being recorded
    Active,
    /// A side has won; the score sheet can be uploaded
    Finished { winner: Side },
    /// Upload in flight
    Uploading,
    /// Upload done; only `reset` is left
    Uploaded,
}

/// One table, one game at a time
#[derive(Debug, Clone)]
pub struct Scoreboard {
    phase: Phase,
    home: Option<PlayerName>,
    away: Option<PlayerName>,
    /// Winner of each rally, in order
    rallies: Vec<Side>,
    /// Server for each recorded serve; the last entry serves next
    serves: Vec<Side>,
    /// Kept while uploading so a failed upload can return to `Finished`
    winner: Option<Side>,
    started_at: Option<DateTime<Utc>>,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    /// Create an idle scoreboard
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            home: None,
            away: None,
            rallies: Vec::new(),
            serves: vec![Side::Home],
            winner: None,
            started_at: None,
        }
    }

    fn error(reason: impl Into<String>) -> anyhow::Error {
        TrackerError::Scoreboard {
            reason: reason.into(),
        }
        .into()
    }

    fn require_phase(&self, expected: Phase, action: &str) -> Result<()> {
        if self.phase != expected {
            return Err(Self::error(format!(
                "cannot {} while {:?}",
                action, self.phase
            )));
        }
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Player on the given side, if a pairing is selected
    pub fn player(&self, side: Side) -> Option<&str> {
        match side {
            Side::Home => self.home.as_deref(),
            Side::Away => self.away.as_deref(),
        }
    }

    /// Points won by `side` so far
    pub fn score(&self, side: Side) -> u32 {
        self.rallies.iter().filter(|winner| **winner == side).count() as u32
    }

    /// Side serving the next point
    pub fn server(&self) -> Side {
        self.serves.last().copied().unwrap_or(Side::Home)
    }

    pub fn rallies(&self) -> &[Side] {
        &self.rallies
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Choose the pairing from an `"A vs B"` label; A plays on the home side
    pub fn select(&mut self, label: &str) -> Result<()> {
        self.require_phase(Phase::Idle, "select a pairing")?;
        let (home, away) = split_pairing_label(label)
            .ok_or_else(|| Self::error(format!("'{label}' is not a pairing of two players")))?;

        self.home = Some(home.to_string());
        self.away = Some(away.to_string());
        debug!("Selected pairing {} vs {}", home, away);
        Ok(())
    }

    /// Swap the two players between sides
    pub fn swap_sides(&mut self) -> Result<()> {
        self.require_phase(Phase::Idle, "swap sides")?;
        std::mem::swap(&mut self.home, &mut self.away);
        Ok(())
    }

    /// Choose who serves first
    pub fn choose_server(&mut self, side: Side) -> Result<()> {
        self.require_phase(Phase::Idle, "choose the server")?;
        self.serves = vec![side];
        Ok(())
    }

    /// Start the game
    pub fn start(&mut self) -> Result<()> {
        self.require_phase(Phase::Idle, "start")?;
        if self.home.is_none() || self.away.is_none() {
            return Err(Self::error("select a pairing before starting"));
        }

        let first_server = self.server();
        self.rallies.clear();
        self.serves = vec![first_server];
        self.winner = None;
        self.phase = Phase::Active;
        self.started_at = Some(current_timestamp());

        info!(
            "Game started: {} vs {}",
            self.home.as_deref().unwrap_or_default(),
            self.away.as_deref().unwrap_or_default()
        );
        Ok(())
    }

    /// Record a point for `side`; returns the phase after the point
    pub fn point(&mut self, side: Side) -> Result<Phase> {
        self.require_phase(Phase::Active, "record a point")?;

        self.rallies.push(side);
        let current = self.server();
        // Two serves each until the rotation limit, then one each
        let next = if self.serves.len() < ALTERNATE_SERVE_AFTER && self.serves.len() % 2 == 1 {
            current
        } else {
            current.other()
        };
        self.serves.push(next);

        if let Some(winner) = game_winner(self.score(Side::Home), self.score(Side::Away)) {
            self.winner = Some(winner);
            self.phase = Phase::Finished { winner };
            info!(
                "Game finished {}-{}, {:?} side won",
                self.score(Side::Home),
                self.score(Side::Away),
                winner
            );
        }

        Ok(self.phase)
    }

    /// Take back the most recent point won by `side`
    pub fn undo(&mut self, side: Side) -> Result<()> {
        self.require_phase(Phase::Active, "undo a point")?;

        let Some(index) = self.rallies.iter().rposition(|winner| *winner == side) else {
            return Err(Self::error(format!("{side:?} side has no points to undo")));
        };
        self.rallies.remove(index);
        if self.serves.len() > 1 {
            self.serves.pop();
        }
        Ok(())
    }

    /// The two upload rows: `[name, total, "-", 1/0 per rally...]`
    pub fn score_sheet(&self) -> Result<ValueGrid> {
        let (Some(home), Some(away)) = (&self.home, &self.away) else {
            return Err(Self::error("no pairing selected"));
        };

        let row = |name: &str, side: Side| {
            let mut row = vec![
                name.to_string(),
                self.score(side).to_string(),
                RALLY_MARKER.to_string(),
            ];
            row.extend(
                self.rallies
                    .iter()
                    .map(|winner| if *winner == side { "1" } else { "0" }.to_string()),
            );
            row
        };

        Ok(vec![row(home, Side::Home), row(away, Side::Away)])
    }

    /// Move to `Uploading` and hand out the rows to send
    pub fn begin_upload(&mut self) -> Result<ValueGrid> {
        if !matches!(self.phase, Phase::Finished { .. }) {
            return Err(Self::error(format!("cannot upload while {:?}", self.phase)));
        }
        let rows = self.score_sheet()?;
        self.phase = Phase::Uploading;
        Ok(rows)
    }

    pub fn upload_succeeded(&mut self) -> Result<()> {
        self.require_phase(Phase::Uploading, "complete an upload")?;
        self.phase = Phase::Uploaded;
        Ok(())
    }

    /// Return to `Finished` so the upload can be retried
    pub fn upload_failed(&mut self) -> Result<()> {
        self.require_phase(Phase::Uploading, "fail an upload")?;
        let winner = self
            .winner
            .ok_or_else(|| Self::error("upload in flight without a winner"))?;
        self.phase = Phase::Finished { winner };
        Ok(())
    }

    /// Clear everything and go back to `Idle`
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
