//! Request orchestration over the match sheets
//!
//! The [`MatchLedger`] reads a draw's roster and played matches, derives the
//! remaining pairings and standings from them, and appends new results.

pub mod match_ledger;

pub use match_ledger::{MatchLedger, Standings, SubmissionReceipt};
