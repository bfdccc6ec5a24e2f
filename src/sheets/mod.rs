//! Spreadsheet access
//!
//! This module provides the spreadsheet client interface, the Google Sheets
//! and in-memory implementations, and the row layout of the match sheets.

pub mod client;
pub mod google;
pub mod layout;
pub mod memory;

// Re-export commonly used types
pub use client::{AppendOutcome, ConditionalFormatRule, SheetsClient, ValueGrid};
pub use google::GoogleSheetsClient;
pub use memory::InMemorySheets;
