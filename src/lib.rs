//! Rally Ledger - table tennis match tracker backed by a spreadsheet
//!
//! This crate serves the remaining pairings and standings of each draw,
//! records finished matches with winner highlighting, and provides the
//! point-by-point scoreboard used to produce them.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod ledger;
pub mod metrics;
pub mod schedule;
pub mod scoreboard;
pub mod service;
pub mod sheets;
pub mod standings;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, TrackerError};
pub use types::*;

// Re-export key components
pub use ledger::{MatchLedger, Standings, SubmissionReceipt};
pub use scoreboard::{Phase, ScoreCard, Scoreboard};
pub use sheets::{InMemorySheets, SheetsClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
