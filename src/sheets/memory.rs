//! In-memory spreadsheet
//!
//! Keeps sheets as plain grids in process memory. Used for local development
//! (`sheets.backend = "memory"`) and throughout the tests.

use crate::error::{Result, TrackerError};
use crate::sheets::client::{AppendOutcome, ConditionalFormatRule, SheetsClient, ValueGrid};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct SheetData {
    id: i64,
    rows: ValueGrid,
}

/// A parsed A1 range: sheet title plus optional cell bounds (zero-based, inclusive)
#[derive(Debug, Clone, PartialEq, Eq)]
struct A1Range {
    sheet: String,
    first_column: usize,
    last_column: Option<usize>,
    first_row: usize,
    last_row: Option<usize>,
}

fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        c.is_ascii_uppercase()
            .then(|| acc * 26 + (c as usize - 'A' as usize + 1))
    })
    .map(|n| n - 1)
}

fn split_cell(cell: &str) -> (Option<usize>, Option<usize>) {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];
    let column = column_index(&letters.to_ascii_uppercase());
    let row = digits.parse::<usize>().ok().and_then(|r| r.checked_sub(1));
    (column, row)
}

impl A1Range {
    fn parse(range: &str) -> Self {
        let (sheet, cells) = match range.rsplit_once('!') {
            Some((sheet, cells)) => (sheet.trim_matches('\''), Some(cells)),
            None => (range, None),
        };

        let mut parsed = Self {
            sheet: sheet.to_string(),
            first_column: 0,
            last_column: None,
            first_row: 0,
            last_row: None,
        };

        if let Some(cells) = cells {
            let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
            let (first_column, first_row) = split_cell(start);
            let (last_column, last_row) = split_cell(end);
            parsed.first_column = first_column.unwrap_or(0);
            parsed.first_row = first_row.unwrap_or(0);
            parsed.last_column = last_column;
            parsed.last_row = last_row;
        }

        parsed
    }
}

fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn lock_error(what: &str) -> TrackerError {
    TrackerError::InternalError {
        message: format!("Failed to acquire sheets {} lock", what),
    }
}

/// Process-local spreadsheet implementation
#[derive(Debug, Default)]
pub struct InMemorySheets {
    sheets: RwLock<BTreeMap<String, SheetData>>,
    formats: RwLock<Vec<ConditionalFormatRule>>,
}

impl InMemorySheets {
    /// Create an empty spreadsheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of `title`, creating the sheet if needed
    pub fn set_rows(&self, title: &str, rows: ValueGrid) -> Result<()> {
        let mut sheets = self.sheets.write().map_err(|_| lock_error("write"))?;
        let next_id = sheets.len() as i64 + 1;
        sheets
            .entry(title.to_string())
            .or_insert_with(|| SheetData {
                id: next_id,
                rows: Vec::new(),
            })
            .rows = rows;
        Ok(())
    }

    /// Builder-style variant of [`set_rows`](Self::set_rows) taking string slices
    pub fn with_sheet(self, title: &str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        // A fresh store cannot be poisoned
        let _ = self.set_rows(title, rows);
        self
    }

    /// Full contents of `title`
    pub fn rows(&self, title: &str) -> Result<ValueGrid> {
        let sheets = self.sheets.read().map_err(|_| lock_error("read"))?;
        Ok(sheets
            .get(title)
            .map(|sheet| sheet.rows.clone())
            .unwrap_or_default())
    }

    /// Conditional formats added so far
    pub fn conditional_formats(&self) -> Vec<ConditionalFormatRule> {
        self.formats
            .read()
            .map(|formats| formats.clone())
            .unwrap_or_default()
    }

    fn read_range(sheets: &BTreeMap<String, SheetData>, range: &str) -> ValueGrid {
        let a1 = A1Range::parse(range);
        let Some(sheet) = sheets.get(&a1.sheet) else {
            return Vec::new();
        };

        let last_row = a1
            .last_row
            .map_or(sheet.rows.len(), |row| (row + 1).min(sheet.rows.len()));
        if a1.first_row >= last_row {
            return Vec::new();
        }

        let mut grid: ValueGrid = sheet.rows[a1.first_row..last_row]
            .iter()
            .map(|row| {
                let end = a1.last_column.map_or(row.len(), |col| (col + 1).min(row.len()));
                let mut cells: Vec<String> = if a1.first_column < end {
                    row[a1.first_column..end].to_vec()
                } else {
                    Vec::new()
                };
                while cells.last().is_some_and(|cell| cell.is_empty()) {
                    cells.pop();
                }
                cells
            })
            .collect();

        // The API leaves out trailing empty rows
        while grid.last().is_some_and(|row| row.is_empty()) {
            grid.pop();
        }
        grid
    }
}

#[async_trait]
impl SheetsClient for InMemorySheets {
    async fn batch_get(&self, ranges: &[String]) -> Result<Vec<ValueGrid>> {
        let sheets = self.sheets.read().map_err(|_| lock_error("read"))?;
        Ok(ranges
            .iter()
            .map(|range| Self::read_range(&sheets, range))
            .collect())
    }

    async fn append(&self, sheet: &str, rows: ValueGrid) -> Result<AppendOutcome> {
        let mut sheets = self.sheets.write().map_err(|_| lock_error("write"))?;
        let title = A1Range::parse(sheet).sheet;
        let next_id = sheets.len() as i64 + 1;
        let data = sheets.entry(title.clone()).or_insert_with(|| SheetData {
            id: next_id,
            rows: Vec::new(),
        });

        while data.rows.last().is_some_and(|row| row.iter().all(|c| c.is_empty())) {
            data.rows.pop();
        }

        let first_row = data.rows.len() + 1;
        let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let updated_rows = rows.len() as u32;
        data.rows.extend(rows);
        let last_row = data.rows.len();

        debug!("Appended {} rows to in-memory sheet '{}'", updated_rows, title);

        Ok(AppendOutcome {
            updated_range: format!(
                "{}!A{}:{}{}",
                title,
                first_row,
                column_letters(width - 1),
                last_row
            ),
            updated_rows,
        })
    }

    async fn sheet_id(&self, title: &str) -> Result<Option<i64>> {
        let sheets = self.sheets.read().map_err(|_| lock_error("read"))?;
        Ok(sheets.get(title).map(|sheet| sheet.id))
    }

    async fn add_conditional_formats(&self, rules: Vec<ConditionalFormatRule>) -> Result<()> {
        let mut formats = self.formats.write().map_err(|_| lock_error("write"))?;
        formats.extend(rules);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
