//! How matches are laid out in a sheet
//!
//! A draw's match sheet holds one row per side, `(name, score, ...)`, and a
//! blank row before every match:
//!
//! ```text
//!
//! Ana   11  -  1 0 1 ...
//! Mia    7  -  0 1 0 ...
//!
//! Ana    4  - ...
//! ```

use crate::sheets::client::{ConditionalFormatRule, ValueGrid, WINNER_GREEN};
use crate::types::{MatchRecord, PlayerName, SideScore};
use tracing::warn;

fn is_blank(row: &[String]) -> bool {
    row.first().map_or(true, |cell| cell.trim().is_empty())
}

/// Parse a score cell; anything that is not a non-negative whole number is `None`
pub fn parse_score(cell: Option<&String>) -> Option<u32> {
    let cell = cell?.trim();
    if let Ok(score) = cell.parse::<u32>() {
        return Some(score);
    }
    match cell.parse::<f64>() {
        Ok(score)
            if score.is_finite()
                && score >= 0.0
                && score <= f64::from(u32::MAX)
                && score.fract() == 0.0 =>
        {
            Some(score as u32)
        }
        _ => None,
    }
}

/// Player (or team) names from a roster range, one per non-blank row
pub fn parse_roster(grid: &[Vec<String>]) -> Vec<PlayerName> {
    grid.iter()
        .filter(|row| !is_blank(row))
        .map(|row| row[0].trim().to_string())
        .collect()
}

/// Played matches from a match range
///
/// Consecutive non-blank rows form a block; two-row blocks are matches,
/// anything else is skipped.
pub fn parse_matches(grid: &[Vec<String>]) -> Vec<MatchRecord> {
    let mut matches = Vec::new();
    let mut block: Vec<&Vec<String>> = Vec::new();

    let mut flush = |block: &mut Vec<&Vec<String>>, end_row: usize| {
        match block.as_slice() {
            [] => {}
            [home, away] => matches.push(MatchRecord::new(
                SideScore::new(home[0].trim(), parse_score(home.get(1))),
                SideScore::new(away[0].trim(), parse_score(away.get(1))),
            )),
            rows => warn!(
                "Skipping {}-row block ending at grid row {}: a match is exactly two rows",
                rows.len(),
                end_row
            ),
        }
        block.clear();
    };

    for (index, row) in grid.iter().enumerate() {
        if is_blank(row) {
            flush(&mut block, index);
        } else {
            block.push(row);
        }
    }
    flush(&mut block, grid.len());

    matches
}

/// Rows to append for a submission: a blank separator before every match
pub fn submission_rows(rows: ValueGrid) -> ValueGrid {
    let mut out = Vec::with_capacity(rows.len() + rows.len() / 2 + 1);
    for (index, row) in rows.into_iter().enumerate() {
        if index % 2 == 0 {
            out.push(Vec::new());
        }
        out.push(row);
    }
    out
}

/// First row number of an A1 range such as `single!A10:Z12`
pub fn first_row_of(updated_range: &str) -> Option<u32> {
    let cells = updated_range
        .rsplit_once('!')
        .map_or(updated_range, |(_, cells)| cells);
    let start = cells.split(':').next()?;
    let digits: String = start.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Rules coloring the winning row of a freshly appended match
///
/// `first_row` is the 1-based row of the blank separator; the two sides sit
/// on the rows after it. Each side's name and score turn green while its
/// score is greater than the other's.
pub fn winner_highlight_rules(sheet_id: i64, first_row: u32) -> Vec<ConditionalFormatRule> {
    let home_row = first_row + 1;
    let away_row = first_row + 2;

    let rule = |row: u32, formula: String| ConditionalFormatRule {
        sheet_id,
        start_row_index: row - 1,
        end_row_index: row,
        start_column_index: 0,
        end_column_index: 2,
        formula,
        background: WINNER_GREEN,
    };

    vec![
        rule(home_row, format!("=B{home_row}>B{away_row}")),
        rule(away_row, format!("=B{away_row}>B{home_row}")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> ValueGrid {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_parse_matches_reads_blank_separated_pairs() {
        let sheet = grid(&[
            &[],
            &["Ana", "11", "-", "1"],
            &["Mia", "7", "-", "0"],
            &[],
            &["Leo", "9"],
            &["Ana", "11"],
        ]);

        let matches = parse_matches(&sheet);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].home, SideScore::new("Ana", Some(11)));
        assert_eq!(matches[0].away, SideScore::new("Mia", Some(7)));
        assert_eq!(matches[1].winner().unwrap().player, "Ana");
    }

    #[test]
    fn test_parse_matches_skips_malformed_blocks() {
        let sheet = grid(&[
            &["Ana", "11"],
            &["Mia", "7"],
            &["Leo", "3"],
            &[""],
            &["Zoe", "11"],
            &[],
            &["Ana", "5"],
            &["Leo", "11"],
        ]);

        let matches = parse_matches(&sheet);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pairing().as_str(), "Ana vs Leo");
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score(Some(&"11".to_string())), Some(11));
        assert_eq!(parse_score(Some(&" 9 ".to_string())), Some(9));
        assert_eq!(parse_score(Some(&"11.0".to_string())), Some(11));
        assert_eq!(parse_score(Some(&"-".to_string())), None);
        assert_eq!(parse_score(Some(&"-3".to_string())), None);
        assert_eq!(parse_score(None), None);
    }

    #[test]
    fn test_parse_score_rejects_out_of_range() {
        assert_eq!(parse_score(Some(&"1e20".to_string())), None);
        assert_eq!(parse_score(Some(&"4294967296".to_string())), None);
        assert_eq!(parse_score(Some(&"4294967295".to_string())), Some(u32::MAX));
    }

    #[test]
    fn test_parse_roster_trims_and_skips_blanks() {
        let roster = parse_roster(&grid(&[&["Ana "], &[], &[" "], &["Mia"]]));
        assert_eq!(roster, vec!["Ana".to_string(), "Mia".to_string()]);
    }

    #[test]
    fn test_submission_rows_insert_separators() {
        let rows = grid(&[&["Ana", "11"], &["Mia", "7"]]);
        let out = submission_rows(rows);
        assert_eq!(out.len(), 3);
        assert!(out[0].is_empty());
        assert_eq!(out[1][0], "Ana");

        // What we write is what we read back
        let matches = parse_matches(&out);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_first_row_of() {
        assert_eq!(first_row_of("single!A10:Z12"), Some(10));
        assert_eq!(first_row_of("'double match'!A7:C9"), Some(7));
        assert_eq!(first_row_of("A3"), Some(3));
        assert_eq!(first_row_of("single!A:Z"), None);
    }

    #[test]
    fn test_winner_highlight_rules() {
        let rules = winner_highlight_rules(42, 10);
        assert_eq!(rules.len(), 2);

        assert_eq!(rules[0].start_row_index, 10);
        assert_eq!(rules[0].end_row_index, 11);
        assert_eq!(rules[0].formula, "=B11>B12");

        assert_eq!(rules[1].start_row_index, 11);
        assert_eq!(rules[1].formula, "=B12>B11");
        assert!(rules.iter().all(|rule| rule.sheet_id == 42 && rule.end_column_index == 2));
    }
}
