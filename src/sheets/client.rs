//! Spreadsheet client interface
//!
//! The tracker owns no storage of its own: every read and write goes through
//! a [`SheetsClient`], which speaks in plain grids of cell strings.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Rows of cell values, as returned for a single range
pub type ValueGrid = Vec<Vec<String>>;

/// Result of appending rows to a sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    /// A1 range the rows landed in, e.g. `single!A10:Z12`
    pub updated_range: String,
    /// Number of rows written
    pub updated_rows: u32,
}

/// Background color for conditional formats, channels in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// Light green used to mark the winner's row
pub const WINNER_GREEN: Color = Color {
    red: 0.686,
    green: 0.882,
    blue: 0.686,
};

/// A custom-formula conditional format over a rectangular grid range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalFormatRule {
    pub sheet_id: i64,
    /// Zero-based, inclusive
    pub start_row_index: u32,
    /// Zero-based, exclusive
    pub end_row_index: u32,
    pub start_column_index: u32,
    pub end_column_index: u32,
    /// Formula starting with `=`
    pub formula: String,
    pub background: Color,
}

/// Trait for spreadsheet access
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetsClient: Send + Sync {
    /// Read several ranges in one request; one grid per range, in order
    async fn batch_get(&self, ranges: &[String]) -> Result<Vec<ValueGrid>>;

    /// Append rows after the data already in `sheet`
    async fn append(&self, sheet: &str, rows: ValueGrid) -> Result<AppendOutcome>;

    /// Numeric id of the sheet titled `title`, if it exists
    async fn sheet_id(&self, title: &str) -> Result<Option<i64>>;

    /// Add conditional format rules to the spreadsheet
    async fn add_conditional_formats(&self, rules: Vec<ConditionalFormatRule>) -> Result<()>;

    /// Backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}
