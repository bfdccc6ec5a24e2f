use crate::config::{CompetitionSettings, SheetsSettings};
use crate::error::{Result, TrackerError};
use crate::metrics::MetricsCollector;
use crate::schedule::{remaining, RemainingMatches};
use crate::scoreboard::ScoreCard;
use crate::sheets::layout::{
    first_row_of, parse_matches, parse_roster, submission_rows, winner_highlight_rules,
};
use crate::sheets::{SheetsClient, ValueGrid};
use crate::standings::{doubles, singles, DoublesRules, PlayerStanding, TeamStanding};
use crate::types::{Draw, DrawKind, DrawSnapshot};
use crate::utils::generate_submission_id;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Rows between the starts of two consecutive appended matches
const ROWS_PER_SUBMITTED_MATCH: u32 = 3;

/// Standings of either kind of draw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Standings {
    Singles(Vec<PlayerStanding>),
    Doubles(Vec<TeamStanding>),
}

impl Standings {
    pub fn len(&self) -> usize {
        match self {
            Standings::Singles(rows) => rows.len(),
            Standings::Doubles(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the caller gets back for a stored submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub updated_range: String,
    pub updated_rows: u32,
}

/// Reads and writes draws through a spreadsheet client
#[derive(Clone)]
pub struct MatchLedger {
    sheets: Arc<dyn SheetsClient>,
    sheet_settings: SheetsSettings,
    competition: CompetitionSettings,
    metrics_collector: Arc<MetricsCollector>,
}

impl MatchLedger {
    /// Create a new ledger with its own metrics collector
    pub fn new(
        sheets: Arc<dyn SheetsClient>,
        sheet_settings: SheetsSettings,
        competition: CompetitionSettings,
    ) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(sheets, sheet_settings, competition, metrics_collector)
    }

    /// Create a new ledger reporting to `metrics_collector`
    pub fn with_metrics(
        sheets: Arc<dyn SheetsClient>,
        sheet_settings: SheetsSettings,
        competition: CompetitionSettings,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            sheets,
            sheet_settings,
            competition,
            metrics_collector,
        }
    }

    /// Name of the spreadsheet backend in use
    pub fn backend_name(&self) -> &'static str {
        self.sheets.backend_name()
    }

    /// Read the first cell of the default roster sheet
    ///
    /// A cheap connectivity check; the cell content is not interpreted.
    pub async fn ping(&self) -> Result<()> {
        let roster_range = self.sheet_settings.draw_sheets(Draw::default()).roster_range;
        let sheet = roster_range
            .rsplit_once('!')
            .map_or(roster_range.as_str(), |(sheet, _)| sheet);
        self.sheets.batch_get(&[format!("{sheet}!A1")]).await?;
        Ok(())
    }

    /// Roster and played matches of `draw`, read in one batch
    pub async fn snapshot(&self, draw: Draw) -> Result<DrawSnapshot> {
        let ranges = self.sheet_settings.draw_sheets(draw);
        let mut grids = self
            .sheets
            .batch_get(&[ranges.roster_range.clone(), ranges.match_range.clone()])
            .await?
            .into_iter();

        let roster_grid = grids.next().unwrap_or_default();
        let match_grid = grids.next().unwrap_or_default();

        let snapshot = DrawSnapshot {
            draw,
            roster: parse_roster(&roster_grid),
            matches: parse_matches(&match_grid),
        };

        debug!(
            "Read draw {}: {} roster names, {} matches",
            draw,
            snapshot.roster.len(),
            snapshot.matches.len()
        );
        Ok(snapshot)
    }

    /// Pairings of `draw` still to be played
    pub async fn remaining_matches(&self, draw: Draw) -> Result<RemainingMatches> {
        let snapshot = self.snapshot(draw).await?;
        Ok(remaining(&snapshot, self.competition.series_best_of))
    }

    /// Current standings of `draw`
    pub async fn standings(&self, draw: Draw) -> Result<Standings> {
        let snapshot = self.snapshot(draw).await?;
        let timer = self.metrics_collector.start_timer();

        let standings = match draw.kind() {
            DrawKind::Singles => Standings::Singles(singles::standings(&snapshot.matches)),
            DrawKind::Doubles => Standings::Doubles(doubles::standings(
                &snapshot.matches,
                &DoublesRules::from(&self.competition),
            )),
        };

        self.metrics_collector
            .record_standings(draw.kind(), timer.stop());
        Ok(standings)
    }

    /// Validate and append submitted score sheets to `draw`
    ///
    /// `rows` holds one or more matches, two rows each. Winner highlighting is
    /// best effort: once the rows are stored the submission has succeeded.
    pub async fn record_match(&self, draw: Draw, rows: ValueGrid) -> Result<SubmissionReceipt> {
        let cards = match self.parse_submission(&rows) {
            Ok(cards) => cards,
            Err(e) => {
                self.metrics_collector.record_submission_rejected("invalid");
                return Err(e);
            }
        };

        let sheet = self.sheet_settings.draw_sheets(draw).submission_sheet;
        let normalized: ValueGrid = cards.iter().flat_map(ScoreCard::to_rows).collect();
        let outcome = self.sheets.append(&sheet, submission_rows(normalized)).await?;

        let submission_id = generate_submission_id();
        self.metrics_collector.record_match_submitted(draw);
        info!(
            "Recorded {} match(es) for draw {} in {} (submission {})",
            cards.len(),
            draw,
            outcome.updated_range,
            submission_id
        );

        if let Err(e) = self
            .highlight_winners(&sheet, &outcome.updated_range, cards.len())
            .await
        {
            warn!(
                "Failed to highlight winners for submission {}: {}",
                submission_id, e
            );
        }

        Ok(SubmissionReceipt {
            submission_id,
            updated_range: outcome.updated_range,
            updated_rows: outcome.updated_rows,
        })
    }

    fn parse_submission(&self, rows: &[Vec<String>]) -> Result<Vec<ScoreCard>> {
        if rows.is_empty() || rows.len() % 2 != 0 {
            return Err(TrackerError::invalid_submission(format!(
                "expected two rows per match, got {} rows",
                rows.len()
            ))
            .into());
        }

        rows.chunks(2)
            .map(|pair| {
                let card = ScoreCard::from_rows(pair)?;
                card.validate(self.competition.enforce_game_rules)?;
                Ok(card)
            })
            .collect()
    }

    async fn highlight_winners(
        &self,
        sheet: &str,
        updated_range: &str,
        matches: usize,
    ) -> Result<()> {
        let first_row = first_row_of(updated_range).ok_or_else(|| TrackerError::InternalError {
            message: format!("cannot read a row number from '{updated_range}'"),
        })?;
        let sheet_id = self
            .sheets
            .sheet_id(sheet)
            .await?
            .ok_or_else(|| TrackerError::SheetNotFound {
                title: sheet.to_string(),
            })?;

        let rules = (0..matches as u32)
            .flat_map(|index| {
                winner_highlight_rules(sheet_id, first_row + index * ROWS_PER_SUBMITTED_MATCH)
            })
            .collect();

        self.sheets.add_conditional_formats(rules).await
    }
}
